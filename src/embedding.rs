//! The embedding capability seam.
//!
//! The engine never computes vectors itself; it calls whatever
//! [`EmbeddingProvider`] was bound at configuration time. Providers own
//! their transport, timeout, and retry behavior.

use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;

use crate::error::EngineError;
use crate::types::Metadata;

/// Everything a provider gets to see for one embed call.
///
/// For query embedding the pipeline passes the sentinel `"query"` as both
/// `source_id` and `document_id`, with position 0.
#[derive(Clone, Copy, Debug)]
pub struct EmbeddingInput<'a> {
    /// Text to embed.
    pub text: &'a str,
    /// Document-level metadata; empty for queries.
    pub metadata: &'a Metadata,
    /// Chunk index within the document; 0 for queries.
    pub position: usize,
    pub source_id: &'a str,
    pub document_id: &'a str,
}

/// Maps text to a numeric vector.
///
/// Implementations must be cheap to call concurrently: the ingest pipeline
/// issues one `embed` per chunk in parallel and joins them fail-fast.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifying string reported in ingest/retrieve results,
    /// e.g. `"openai:text-embedding-3-small"`.
    fn name(&self) -> &str;

    /// Output dimensionality, when the provider knows it up front.
    fn dimensions(&self) -> Option<usize> {
        None
    }

    /// Embed one text. A failure aborts the whole pipeline call.
    async fn embed(&self, input: EmbeddingInput<'_>) -> Result<Vec<f32>, EngineError>;
}

/// Deterministic in-process provider for tests, examples, and offline use.
///
/// Produces an L2-normalized bag-of-words vector: each token is hashed into
/// one of `dimension` buckets. Identical text always yields an identical
/// vector, so assertions against it are stable.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    name: String,
    dimension: usize,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        MockEmbeddingProvider {
            name: "mock:bag-of-words".to_string(),
            dimension: 64,
        }
    }

    #[must_use]
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension.max(1);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimension)
    }

    async fn embed(&self, input: EmbeddingInput<'_>) -> Result<Vec<f32>, EngineError> {
        Ok(hashed_embedding(input.text, self.dimension))
    }
}

/// Token-bucket embedding: hash each lowercased alphanumeric token into a
/// bucket, then L2-normalize.
fn hashed_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];

    for token in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
    {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let bucket = (hasher.finish() as usize) % dimension;
        vector[bucket] += 1.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }

    vector
}
