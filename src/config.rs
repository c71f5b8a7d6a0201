//! Engine configuration and resolution.
//!
//! [`EngineConfig`] is what callers build: the two required capabilities
//! plus optional strategy overrides. Resolution merges the chunking
//! defaults, binds the fallback strategies, and produces an immutable
//! [`ResolvedConfig`] the engine shares across every call for its whole
//! lifetime. Resolution performs no I/O and cannot fail; the required
//! capabilities are constructor arguments, so a missing one is a compile
//! error rather than a runtime one.

use std::sync::Arc;

use uuid::Uuid;

use crate::chunking::{ChunkText, Chunker, ChunkingOptions, ChunkingOverrides, default_chunker};
use crate::embedding::EmbeddingProvider;
use crate::store::VectorStore;

/// Mints unique string ids for documents and chunks.
///
/// Injected as a value rather than reached for globally so tests can bind
/// a deterministic generator.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// User-facing engine configuration.
#[derive(Clone)]
pub struct EngineConfig {
    embedding: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    defaults: ChunkingOverrides,
    chunker: Option<Chunker>,
    id_generator: Option<IdGenerator>,
}

impl EngineConfig {
    /// Configuration with the two required capabilities and all defaults.
    pub fn new(embedding: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        EngineConfig {
            embedding,
            store,
            defaults: ChunkingOverrides::default(),
            chunker: None,
            id_generator: None,
        }
    }

    /// Override the engine-level chunking defaults (merged field-by-field
    /// over the system defaults of 200/40).
    #[must_use]
    pub fn with_chunking_defaults(mut self, defaults: ChunkingOverrides) -> Self {
        self.defaults = defaults;
        self
    }

    /// Replace the sliding-window chunker with a custom strategy.
    #[must_use]
    pub fn with_chunker<F>(mut self, chunker: F) -> Self
    where
        F: Fn(&str, ChunkingOptions) -> Vec<ChunkText> + Send + Sync + 'static,
    {
        self.chunker = Some(Arc::new(chunker));
        self
    }

    /// Replace the UUIDv4 id generator.
    #[must_use]
    pub fn with_id_generator<F>(mut self, id_generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.id_generator = Some(Arc::new(id_generator));
        self
    }

    /// Bind defaults and fallback strategies into the engine's immutable
    /// process-lifetime state.
    pub(crate) fn resolve(self) -> ResolvedConfig {
        ResolvedConfig {
            embedding: self.embedding,
            store: self.store,
            defaults: ChunkingOptions::default().merged(Some(&self.defaults)),
            chunker: self.chunker.unwrap_or_else(|| Arc::new(default_chunker)),
            id_generator: self
                .id_generator
                .unwrap_or_else(|| Arc::new(|| Uuid::new_v4().to_string())),
        }
    }
}

/// Immutable resolved configuration, shared by reference across all calls
/// on one engine instance.
#[derive(Clone)]
pub struct ResolvedConfig {
    pub(crate) embedding: Arc<dyn EmbeddingProvider>,
    pub(crate) store: Arc<dyn VectorStore>,
    pub(crate) defaults: ChunkingOptions,
    pub(crate) chunker: Chunker,
    pub(crate) id_generator: IdGenerator,
}
