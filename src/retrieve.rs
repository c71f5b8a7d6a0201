//! The retrieve pipeline: embed the query, delegate the search, shape the
//! result.
//!
//! Ranking and limiting belong to the store; this pipeline never re-sorts
//! or re-filters beyond stripping document bodies when the caller did not
//! ask for them.

use std::time::Instant;

use tracing::{debug, instrument};

use crate::config::ResolvedConfig;
use crate::embedding::EmbeddingInput;
use crate::error::EngineError;
use crate::ingest::elapsed_ms;
use crate::store::VectorQuery;
use crate::types::{Metadata, RetrieveInput, RetrieveResult, RetrieveTimings};

/// Default result limit when the caller does not pass one.
pub(crate) const DEFAULT_TOP_K: usize = 8;

/// Sentinel source/document id used when embedding query text, which has
/// no chunk position of its own.
const QUERY_SENTINEL: &str = "query";

#[instrument(skip_all, fields(top_k = input.top_k.unwrap_or(DEFAULT_TOP_K)))]
pub(crate) async fn retrieve(
    config: &ResolvedConfig,
    input: RetrieveInput,
) -> Result<RetrieveResult, EngineError> {
    let total_start = Instant::now();

    let embedding_start = Instant::now();
    let metadata = Metadata::new();
    let query_embedding = config
        .embedding
        .embed(EmbeddingInput {
            text: &input.query,
            metadata: &metadata,
            position: 0,
            source_id: QUERY_SENTINEL,
            document_id: QUERY_SENTINEL,
        })
        .await?;
    let embedding_ms = elapsed_ms(embedding_start);

    let retrieval_start = Instant::now();
    let mut chunks = config
        .store
        .query(VectorQuery {
            embedding: query_embedding,
            top_k: input.top_k.unwrap_or(DEFAULT_TOP_K),
            scope: input.scope,
        })
        .await?;

    if !input.include_document {
        for chunk in &mut chunks {
            chunk.document_content = None;
            chunk.document_url = None;
        }
    }
    let retrieval_ms = elapsed_ms(retrieval_start);

    debug!(results = chunks.len(), embedding_ms, retrieval_ms, "query retrieved");

    Ok(RetrieveResult {
        chunks,
        embedding_model: config.embedding.name().to_string(),
        durations: RetrieveTimings {
            total_ms: elapsed_ms(total_start),
            embedding_ms,
            retrieval_ms,
        },
    })
}
