//! The ingest pipeline: chunk, embed, persist.
//!
//! Each phase is timed independently. Embedding calls for one document are
//! issued as a parallel fan-out and joined fail-fast: if any chunk's
//! embedding fails, the call errors and the store is never invoked, so a
//! document can never be persisted half-embedded.

use std::time::Instant;

use futures_util::future::try_join_all;
use tracing::{debug, instrument};

use crate::config::ResolvedConfig;
use crate::embedding::EmbeddingInput;
use crate::error::EngineError;
use crate::types::{Chunk, IngestInput, IngestResult, IngestTimings, StoredChunk};

#[instrument(skip_all, fields(source_id = %input.source_id))]
pub(crate) async fn ingest(
    config: &ResolvedConfig,
    input: IngestInput,
) -> Result<IngestResult, EngineError> {
    let total_start = Instant::now();

    let IngestInput {
        source_id,
        content,
        content_url,
        metadata,
        chunking,
    } = input;

    // Chunking phase: resolve effective options, mint the document id,
    // materialize chunks.
    let chunking_start = Instant::now();
    let options = config.defaults.merged(chunking.as_ref());
    if options.chunk_size == 0 {
        return Err(EngineError::InvalidChunking(
            "chunk_size must be greater than zero".to_string(),
        ));
    }

    let metadata = metadata.unwrap_or_default();
    let document_id = (config.id_generator)();

    let mut chunks: Vec<Chunk> = (config.chunker)(&content, options)
        .into_iter()
        .map(|text| Chunk {
            id: (config.id_generator)(),
            document_id: document_id.clone(),
            source_id: source_id.clone(),
            index: text.index,
            content: text.content,
            token_count: text.token_count,
            metadata: metadata.clone(),
            embedding: None,
        })
        .collect();
    let chunking_ms = elapsed_ms(chunking_start);

    // Embedding phase: one call per chunk, all in flight at once.
    let embedding_start = Instant::now();
    let embeddings = try_join_all(chunks.iter().map(|chunk| {
        config.embedding.embed(EmbeddingInput {
            text: &chunk.content,
            metadata: &chunk.metadata,
            position: chunk.index,
            source_id: &chunk.source_id,
            document_id: &chunk.document_id,
        })
    }))
    .await?;
    for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
        chunk.embedding = Some(embedding);
    }
    let embedding_ms = elapsed_ms(embedding_start);

    // Storage phase: a single upsert with the full ordered set. Zero
    // chunks is still one (no-op) upsert.
    let storage_start = Instant::now();
    let stored: Vec<StoredChunk> = chunks
        .into_iter()
        .map(|chunk| StoredChunk {
            chunk,
            document_content: content.clone(),
            document_url: content_url.clone(),
        })
        .collect();
    let chunk_count = stored.len();
    config.store.upsert(stored).await?;
    let storage_ms = elapsed_ms(storage_start);

    debug!(
        %document_id,
        chunk_count,
        chunking_ms,
        embedding_ms,
        storage_ms,
        "document ingested"
    );

    Ok(IngestResult {
        document_id,
        chunk_count,
        embedding_model: config.embedding.name().to_string(),
        durations: IngestTimings {
            total_ms: elapsed_ms(total_start),
            chunking_ms,
            embedding_ms,
            storage_ms,
        },
    })
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
