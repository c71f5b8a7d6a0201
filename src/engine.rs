//! The engine facade.

use crate::config::{EngineConfig, ResolvedConfig};
use crate::error::EngineError;
use crate::types::{IngestInput, IngestResult, RetrieveInput, RetrieveResult};
use crate::{ingest, retrieve};

/// Binds one resolved configuration for its lifetime and exposes ingest
/// and retrieve as the only two operations.
///
/// The engine holds no mutable state: the resolved configuration is
/// read-only, so one instance (typically behind an `Arc`) serves any
/// number of concurrent calls. Two concurrent ingests of the same source
/// race only at the store's upsert-by-id semantics; document ids are
/// minted per call, never derived from the source label.
pub struct ContextEngine {
    config: ResolvedConfig,
}

impl ContextEngine {
    /// Resolve the configuration once and bind it.
    pub fn new(config: EngineConfig) -> Self {
        ContextEngine {
            config: config.resolve(),
        }
    }

    /// Chunk, embed, and persist one document.
    ///
    /// Fails whole: on any embedding or storage error nothing is
    /// persisted and the originating error is returned.
    pub async fn ingest(&self, input: IngestInput) -> Result<IngestResult, EngineError> {
        ingest::ingest(&self.config, input).await
    }

    /// Embed a query and return the store's ranked chunks.
    pub async fn retrieve(&self, input: RetrieveInput) -> Result<RetrieveResult, EngineError> {
        retrieve::retrieve(&self.config, input).await
    }
}
