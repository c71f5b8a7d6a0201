//! Error types shared across the engine.
//!
//! The engine recovers nothing locally: an ingest or retrieve call either
//! fully succeeds or fails with the originating error. Retry and backoff
//! policy belongs to the caller or to the collaborator that owns the
//! underlying I/O.

use thiserror::Error;

/// Errors surfaced by the engine and its capability seams.
///
/// The variants map to the three failure categories:
///
/// 1. Configuration/validation problems, caught before any I/O.
/// 2. Embedding provider failures, propagated verbatim.
/// 3. Vector store failures, propagated verbatim.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Chunking options failed validation (e.g. a zero chunk size).
    #[error("invalid chunking options: {0}")]
    InvalidChunking(String),

    /// The embedding capability failed for a chunk or query.
    #[error("embedding provider '{provider}' failed: {message}")]
    Embedding { provider: String, message: String },

    /// The storage capability failed during upsert or query.
    #[error("vector store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Build an embedding error tagged with the originating provider name.
    pub fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Embedding {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Build a storage error from any displayable cause.
    pub fn store(message: impl Into<String>) -> Self {
        EngineError::Store(message.into())
    }
}
