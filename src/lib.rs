//! # Contextsmith: a pluggable retrieval pipeline engine
//!
//! Turns raw text into embedded, searchable chunks and later returns the
//! most relevant chunks for a query. The engine owns orchestration only;
//! embedding computation and vector persistence are delegated to
//! capabilities bound at configuration time.
//!
//! ```text
//! IngestInput ──► chunking (sliding window) ──► Chunk materialization
//!                                                      │
//!                                 embedding fan-out ◄──┘
//!                           (parallel, fail-fast join)
//!                                                      │
//!                 VectorStore::upsert ◄── StoredChunk batch
//!
//! RetrieveInput ──► query embedding ──► VectorStore::query ──► ranked
//!                                        (store owns ranking)   chunks
//! ```
//!
//! ## Quick start
//!
//! The crate ships a deterministic mock provider and an in-memory store,
//! so the whole pipeline runs without external services:
//!
//! ```
//! use std::sync::Arc;
//!
//! use contextsmith::{
//!     ContextEngine, EngineConfig, IngestInput, MemoryVectorStore,
//!     MockEmbeddingProvider, RetrieveInput,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), contextsmith::EngineError> {
//! let engine = ContextEngine::new(EngineConfig::new(
//!     Arc::new(MockEmbeddingProvider::new()),
//!     Arc::new(MemoryVectorStore::new()),
//! ));
//!
//! let report = engine
//!     .ingest(IngestInput::new("notes", "tokio drives the async runtime"))
//!     .await?;
//! assert_eq!(report.chunk_count, 1);
//!
//! let found = engine.retrieve(RetrieveInput::new("async runtime")).await?;
//! assert!(!found.chunks.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Capability seams
//!
//! Production deployments implement [`embedding::EmbeddingProvider`] for
//! their model API and [`store::VectorStore`] for their database (a
//! pgvector-backed adapter is the expected shape: ascending distance
//! scores, upsert-by-id overwrite semantics). The engine performs no
//! retries and no partial commits; an ingest or retrieve call either fully
//! succeeds or fails with the originating error.

pub mod chunking;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod store;
pub mod types;

mod ingest;
mod retrieve;

pub use chunking::{
    ChunkText, Chunker, ChunkingOptions, ChunkingOverrides, DEFAULT_CHUNK_OVERLAP,
    DEFAULT_CHUNK_SIZE, default_chunker,
};
pub use config::{EngineConfig, IdGenerator, ResolvedConfig};
pub use embedding::{EmbeddingInput, EmbeddingProvider, MockEmbeddingProvider};
pub use engine::ContextEngine;
pub use error::EngineError;
pub use store::{MemoryVectorStore, VectorQuery, VectorStore};
pub use types::{
    Chunk, IngestInput, IngestResult, IngestTimings, Metadata, RetrieveInput, RetrieveResult,
    RetrieveTimings, RetrievedChunk, Scope, StoredChunk,
};
