//! Core data model for the retrieval pipeline.
//!
//! Everything persisted or returned by the engine is defined here:
//! [`Chunk`] and its store-facing ([`StoredChunk`]) and query-facing
//! ([`RetrievedChunk`]) shapes, the request/response value objects for the
//! two pipeline operations, and the per-phase timing reports.
//!
//! A *document* is the logical unit minted per ingest call: all chunks
//! produced by one call share one `document_id` and one metadata map.

use serde::{Deserialize, Serialize};

use crate::chunking::ChunkingOverrides;

/// Arbitrary caller-supplied metadata attached to a document.
///
/// Values are expected to be JSON scalars or arrays of scalars; the engine
/// treats the map as opaque and forwards it to the embedding provider and
/// the store unchanged.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A persisted, embeddable unit of a document's text.
///
/// Produced by the ingest pipeline; `index` is the chunk's 0-based position
/// within its document and `token_count` is the whitespace-token count of
/// `content`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    /// Globally unique chunk identifier.
    pub id: String,
    /// Identifier shared by all chunks of one ingested document.
    pub document_id: String,
    /// Caller-supplied logical source label.
    pub source_id: String,
    /// 0-based ordinal position within the document.
    pub index: usize,
    /// The chunk's text.
    pub content: String,
    /// Whitespace-token count of `content`.
    pub token_count: usize,
    /// Document-level metadata (identical for all chunks of one document).
    pub metadata: Metadata,
    /// Embedding vector, present once the embedding phase has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// A chunk as handed to the storage capability.
///
/// Carries the full document body alongside the chunk so stores can keep a
/// document row next to the chunk rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    /// Full source text of the document this chunk belongs to.
    pub document_content: String,
    /// Source URL of the document, when the caller supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}

/// A chunk returned from a vector query, annotated with its distance score.
///
/// Lower scores denote closer matches (pgvector-style distance); stores
/// return results in ascending score order and the retrieve pipeline keeps
/// that order verbatim.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrievedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    /// Distance score; lower is more similar.
    pub score: f32,
    /// Document body, stripped unless the caller asked for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}

/// Narrows a retrieve query to a subset of stored chunks.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scope {
    /// Match only chunks with this source label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Match only documents whose metadata carries this `org_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    /// Match only documents whose metadata carries this `project_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl Scope {
    /// Scope limited to a single source label.
    pub fn source(source_id: impl Into<String>) -> Self {
        Scope {
            source_id: Some(source_id.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_org(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    #[must_use]
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}

/// One document to ingest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestInput {
    /// Logical source label shared by every chunk of this document.
    pub source_id: String,
    /// Raw document text.
    pub content: String,
    /// Optional source URL recorded with the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    /// Document-level metadata; defaults to an empty map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Per-call chunking override, merged over the engine defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunking: Option<ChunkingOverrides>,
}

impl IngestInput {
    pub fn new(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        IngestInput {
            source_id: source_id.into(),
            content: content.into(),
            content_url: None,
            metadata: None,
            chunking: None,
        }
    }

    #[must_use]
    pub fn with_content_url(mut self, url: impl Into<String>) -> Self {
        self.content_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn with_chunking(mut self, overrides: ChunkingOverrides) -> Self {
        self.chunking = Some(overrides);
        self
    }
}

/// Report returned by a successful ingest call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestResult {
    /// The document id minted for this call.
    pub document_id: String,
    /// Number of chunks produced and persisted.
    pub chunk_count: usize,
    /// Name declared by the embedding capability.
    pub embedding_model: String,
    /// Wall-clock phase durations.
    pub durations: IngestTimings,
}

/// Wall-clock durations for the ingest phases, in milliseconds.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct IngestTimings {
    pub total_ms: u64,
    pub chunking_ms: u64,
    pub embedding_ms: u64,
    pub storage_ms: u64,
}

/// One retrieval query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrieveInput {
    /// Query text to embed and match against stored chunks.
    pub query: String,
    /// Maximum number of chunks to return; defaults to 8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    /// Optional filter narrowing the search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// When false (the default), document body fields are stripped from
    /// returned chunks.
    #[serde(default)]
    pub include_document: bool,
}

impl RetrieveInput {
    pub fn new(query: impl Into<String>) -> Self {
        RetrieveInput {
            query: query.into(),
            top_k: None,
            scope: None,
            include_document: false,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Keep the document body fields on returned chunks.
    #[must_use]
    pub fn with_document(mut self, include: bool) -> Self {
        self.include_document = include;
        self
    }
}

/// Ranked chunks returned by a successful retrieve call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetrieveResult {
    /// Chunks in the store's ranking order, most similar first.
    pub chunks: Vec<RetrievedChunk>,
    /// Name declared by the embedding capability.
    pub embedding_model: String,
    /// Wall-clock phase durations.
    pub durations: RetrieveTimings,
}

/// Wall-clock durations for the retrieve phases, in milliseconds.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RetrieveTimings {
    pub total_ms: u64,
    pub embedding_ms: u64,
    pub retrieval_ms: u64,
}
