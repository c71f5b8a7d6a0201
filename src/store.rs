//! The storage capability seam and the in-process reference store.
//!
//! Stores own persistence, similarity computation, ranking, and limiting.
//! The engine only requires the two-method [`VectorStore`] contract; SQL
//! adapters (pgvector and friends) live outside this crate.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::types::{RetrievedChunk, Scope, StoredChunk};

/// Parameters for a nearest-neighbor query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VectorQuery {
    /// Query embedding.
    pub embedding: Vec<f32>,
    /// Maximum number of chunks to return.
    pub top_k: usize,
    /// Optional scope filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

/// Persists embedded chunks and answers nearest-neighbor queries.
///
/// `upsert` semantics are by chunk id: re-ingesting under the same ids
/// overwrites. Query results come back most-similar-first, scored with a
/// distance (lower is closer, matching the pgvector convention).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persist one document's ordered, embedded chunks. An empty batch is
    /// a valid no-op.
    async fn upsert(&self, chunks: Vec<StoredChunk>) -> Result<(), EngineError>;

    /// Return up to `top_k` chunks ranked by ascending distance.
    async fn query(&self, query: VectorQuery) -> Result<Vec<RetrievedChunk>, EngineError>;
}

/// Brute-force in-memory [`VectorStore`].
///
/// Keeps every chunk in a single map guarded by a `parking_lot` mutex (the
/// lock is never held across an await). Similarity is cosine distance over
/// the stored embeddings. Intended for tests, examples, and small
/// in-process corpora, not as a production adapter.
#[derive(Default)]
pub struct MemoryVectorStore {
    chunks: Mutex<Vec<StoredChunk>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks currently held.
    pub fn len(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.lock().is_empty()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, incoming: Vec<StoredChunk>) -> Result<(), EngineError> {
        if incoming.is_empty() {
            return Ok(());
        }

        let mut chunks = self.chunks.lock();
        for chunk in incoming {
            match chunks.iter_mut().find(|held| held.chunk.id == chunk.chunk.id) {
                Some(slot) => *slot = chunk,
                None => chunks.push(chunk),
            }
        }
        Ok(())
    }

    async fn query(&self, query: VectorQuery) -> Result<Vec<RetrievedChunk>, EngineError> {
        let chunks = self.chunks.lock();

        let mut scored: Vec<RetrievedChunk> = chunks
            .iter()
            .filter(|held| scope_matches(query.scope.as_ref(), held))
            .filter_map(|held| {
                let embedding = held.chunk.embedding.as_ref()?;
                let score = cosine_distance(&query.embedding, embedding);
                Some(RetrievedChunk {
                    chunk: held.chunk.clone(),
                    score,
                    document_content: Some(held.document_content.clone()),
                    document_url: held.document_url.clone(),
                })
            })
            .collect();

        scored.sort_by(|a, b| a.score.total_cmp(&b.score));
        scored.truncate(query.top_k);

        debug!(results = scored.len(), top_k = query.top_k, "memory store query");
        Ok(scored)
    }
}

fn scope_matches(scope: Option<&Scope>, held: &StoredChunk) -> bool {
    let Some(scope) = scope else {
        return true;
    };

    if let Some(source_id) = &scope.source_id
        && held.chunk.source_id != *source_id
    {
        return false;
    }
    if let Some(org_id) = &scope.org_id
        && held.chunk.metadata.get("org_id").and_then(|v| v.as_str()) != Some(org_id.as_str())
    {
        return false;
    }
    if let Some(project_id) = &scope.project_id
        && held.chunk.metadata.get("project_id").and_then(|v| v.as_str())
            != Some(project_id.as_str())
    {
        return false;
    }
    true
}

/// Cosine distance: `1 - cos(a, b)`, in `[0, 2]`. Mismatched or zero-norm
/// vectors rank last.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return f32::MAX;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return f32::MAX;
    }

    1.0 - dot / (norm_a * norm_b)
}
