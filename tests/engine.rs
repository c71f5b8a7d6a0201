//! End-to-end engine tests with deterministic mock collaborators.
//!
//! Everything here runs in-process: the mock embedding provider is
//! deterministic and the stores are either the in-memory reference store
//! or recording stubs that capture what the pipelines hand them.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use contextsmith::{
    Chunk, ChunkingOverrides, ContextEngine, EmbeddingInput, EmbeddingProvider, EngineConfig,
    EngineError, IngestInput, MemoryVectorStore, Metadata, MockEmbeddingProvider, RetrieveInput,
    RetrievedChunk, Scope, StoredChunk, VectorQuery, VectorStore,
};

/// Store stub that records every upsert batch and query, answering queries
/// with a canned result list.
#[derive(Default)]
struct RecordingStore {
    upserts: Mutex<Vec<Vec<StoredChunk>>>,
    queries: Mutex<Vec<VectorQuery>>,
    canned: Mutex<Vec<RetrievedChunk>>,
}

impl RecordingStore {
    fn with_canned(canned: Vec<RetrievedChunk>) -> Self {
        RecordingStore {
            canned: Mutex::new(canned),
            ..Default::default()
        }
    }

    fn upsert_calls(&self) -> usize {
        self.upserts.lock().len()
    }

    fn last_upsert(&self) -> Vec<StoredChunk> {
        self.upserts.lock().last().cloned().unwrap_or_default()
    }

    fn last_query(&self) -> Option<VectorQuery> {
        self.queries.lock().last().cloned()
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    async fn upsert(&self, chunks: Vec<StoredChunk>) -> Result<(), EngineError> {
        self.upserts.lock().push(chunks);
        Ok(())
    }

    async fn query(&self, query: VectorQuery) -> Result<Vec<RetrievedChunk>, EngineError> {
        self.queries.lock().push(query);
        Ok(self.canned.lock().clone())
    }
}

/// Provider that fails for one chunk position and succeeds elsewhere.
struct FailingProvider {
    fail_at_position: usize,
}

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing-mock"
    }

    async fn embed(&self, input: EmbeddingInput<'_>) -> Result<Vec<f32>, EngineError> {
        if input.position == self.fail_at_position {
            Err(EngineError::embedding("failing-mock", "provider exploded"))
        } else {
            Ok(vec![1.0, 0.0])
        }
    }
}

fn sequential_ids() -> impl Fn() -> String + Send + Sync + 'static {
    let counter = AtomicUsize::new(0);
    move || format!("id-{}", counter.fetch_add(1, Ordering::Relaxed))
}

fn canned_chunk(id: &str, score: f32) -> RetrievedChunk {
    RetrievedChunk {
        chunk: Chunk {
            id: id.to_string(),
            document_id: "doc".to_string(),
            source_id: "src".to_string(),
            index: 0,
            content: format!("content {id}"),
            token_count: 2,
            metadata: Metadata::new(),
            embedding: None,
        },
        score,
        document_content: Some("full document body".to_string()),
        document_url: Some("https://example.com/doc".to_string()),
    }
}

#[tokio::test]
async fn ingest_materializes_chunks_with_shared_document_id() {
    let store = Arc::new(RecordingStore::default());
    let engine = ContextEngine::new(
        EngineConfig::new(Arc::new(MockEmbeddingProvider::new()), store.clone())
            .with_id_generator(sequential_ids()),
    );

    let result = engine
        .ingest(
            IngestInput::new("doc1", "a b c d e f g h")
                .with_chunking(ChunkingOverrides::new().chunk_size(4).chunk_overlap(1)),
        )
        .await
        .unwrap();

    // Document id is minted first, before any chunk id.
    assert_eq!(result.document_id, "id-0");
    assert_eq!(result.chunk_count, 3);
    assert_eq!(result.embedding_model, "mock:bag-of-words");

    let batch = store.last_upsert();
    let contents: Vec<&str> = batch.iter().map(|s| s.chunk.content.as_str()).collect();
    assert_eq!(contents, vec!["a b c d", "d e f g", "g h"]);
    let indices: Vec<usize> = batch.iter().map(|s| s.chunk.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    // All chunks share the minted document id; chunk ids are pairwise unique.
    for stored in &batch {
        assert_eq!(stored.chunk.document_id, "id-0");
        assert_eq!(stored.chunk.source_id, "doc1");
        assert!(stored.chunk.embedding.is_some());
        assert_eq!(stored.document_content, "a b c d e f g h");
    }
    let mut ids: Vec<&str> = batch.iter().map(|s| s.chunk.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn embedding_failure_aborts_before_any_persistence() {
    let store = Arc::new(RecordingStore::default());
    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(FailingProvider { fail_at_position: 1 }),
        store.clone(),
    ));

    let err = engine
        .ingest(
            IngestInput::new("doc1", "a b c d e f g h")
                .with_chunking(ChunkingOverrides::new().chunk_size(4).chunk_overlap(1)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Embedding { .. }));
    assert!(err.to_string().contains("provider exploded"));
    assert_eq!(store.upsert_calls(), 0, "upsert must never run after an embed failure");
}

#[tokio::test]
async fn empty_content_is_a_valid_no_op_upsert() {
    let store = Arc::new(RecordingStore::default());
    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        store.clone(),
    ));

    let result = engine.ingest(IngestInput::new("doc1", "   ")).await.unwrap();

    assert_eq!(result.chunk_count, 0);
    // The store is still invoked exactly once, with an empty batch.
    assert_eq!(store.upsert_calls(), 1);
    assert!(store.last_upsert().is_empty());
}

#[tokio::test]
async fn zero_chunk_size_is_rejected_before_chunking() {
    let store = Arc::new(RecordingStore::default());
    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        store.clone(),
    ));

    let err = engine
        .ingest(
            IngestInput::new("doc1", "some text")
                .with_chunking(ChunkingOverrides::new().chunk_size(0)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidChunking(_)));
    assert_eq!(store.upsert_calls(), 0);
}

#[tokio::test]
async fn metadata_is_shared_across_all_chunks_of_a_document() {
    let store = Arc::new(RecordingStore::default());
    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        store.clone(),
    ));

    let mut metadata = Metadata::new();
    metadata.insert("org_id".to_string(), serde_json::json!("acme"));
    metadata.insert("tags".to_string(), serde_json::json!(["alpha", "beta"]));

    engine
        .ingest(
            IngestInput::new("doc1", "a b c d e f")
                .with_metadata(metadata.clone())
                .with_chunking(ChunkingOverrides::new().chunk_size(3).chunk_overlap(0)),
        )
        .await
        .unwrap();

    let batch = store.last_upsert();
    assert_eq!(batch.len(), 2);
    for stored in &batch {
        assert_eq!(stored.chunk.metadata, metadata);
    }
}

#[tokio::test]
async fn retrieve_passes_top_k_and_scope_through_verbatim() {
    let store = Arc::new(RecordingStore::default());
    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        store.clone(),
    ));

    engine
        .retrieve(
            RetrieveInput::new("x")
                .with_top_k(5)
                .with_scope(Scope::source("doc1").with_org("acme")),
        )
        .await
        .unwrap();

    let query = store.last_query().expect("store query was issued");
    assert_eq!(query.top_k, 5);
    let scope = query.scope.expect("scope forwarded");
    assert_eq!(scope.source_id.as_deref(), Some("doc1"));
    assert_eq!(scope.org_id.as_deref(), Some("acme"));
}

#[tokio::test]
async fn retrieve_defaults_top_k_to_eight() {
    let store = Arc::new(RecordingStore::default());
    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        store.clone(),
    ));

    engine.retrieve(RetrieveInput::new("x")).await.unwrap();
    assert_eq!(store.last_query().unwrap().top_k, 8);
}

#[tokio::test]
async fn retrieve_preserves_store_order_and_strips_document_fields() {
    let canned = vec![
        canned_chunk("first", 0.1),
        canned_chunk("second", 0.4),
        canned_chunk("third", 0.9),
    ];
    let store = Arc::new(RecordingStore::with_canned(canned));
    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        store.clone(),
    ));

    let result = engine
        .retrieve(RetrieveInput::new("x").with_top_k(3))
        .await
        .unwrap();

    // The store's ranking comes back verbatim: no re-sorting.
    let ids: Vec<&str> = result.chunks.iter().map(|c| c.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);

    // include_document defaults to false: document bodies are stripped
    // even though the store populated them.
    for chunk in &result.chunks {
        assert!(chunk.document_content.is_none());
        assert!(chunk.document_url.is_none());
    }
}

#[tokio::test]
async fn retrieve_keeps_document_fields_when_requested() {
    let store = Arc::new(RecordingStore::with_canned(vec![canned_chunk("only", 0.2)]));
    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        store.clone(),
    ));

    let result = engine
        .retrieve(RetrieveInput::new("x").with_document(true))
        .await
        .unwrap();

    assert_eq!(
        result.chunks[0].document_content.as_deref(),
        Some("full document body")
    );
    assert_eq!(
        result.chunks[0].document_url.as_deref(),
        Some("https://example.com/doc")
    );
}

#[tokio::test]
async fn end_to_end_round_trip_ranks_the_relevant_document_first() {
    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        Arc::new(MemoryVectorStore::new()),
    ));

    engine
        .ingest(IngestInput::new(
            "runtime-notes",
            "tokio schedules asynchronous tasks across worker threads",
        ))
        .await
        .unwrap();
    engine
        .ingest(IngestInput::new(
            "cooking-notes",
            "simmer the broth gently and season with thyme",
        ))
        .await
        .unwrap();

    let result = engine
        .retrieve(RetrieveInput::new("tokio asynchronous tasks").with_top_k(2))
        .await
        .unwrap();

    assert_eq!(result.chunks.len(), 2);
    assert_eq!(result.chunks[0].chunk.source_id, "runtime-notes");
    assert!(result.chunks[0].score < result.chunks[1].score);
}

#[tokio::test]
async fn scoped_retrieve_only_sees_matching_sources() {
    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        Arc::new(MemoryVectorStore::new()),
    ));

    engine
        .ingest(IngestInput::new("alpha", "shared vocabulary in both documents"))
        .await
        .unwrap();
    engine
        .ingest(IngestInput::new("beta", "shared vocabulary in both documents"))
        .await
        .unwrap();

    let result = engine
        .retrieve(
            RetrieveInput::new("shared vocabulary")
                .with_top_k(10)
                .with_scope(Scope::source("alpha")),
        )
        .await
        .unwrap();

    assert_eq!(result.chunks.len(), 1);
    assert_eq!(result.chunks[0].chunk.source_id, "alpha");
}

#[tokio::test]
async fn concurrent_calls_share_one_engine_instance() {
    let engine = Arc::new(ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        Arc::new(MemoryVectorStore::new()),
    )));

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .ingest(IngestInput::new(
                    format!("source-{i}"),
                    format!("document number {i} about topic {}", i % 3),
                ))
                .await
        }));
    }

    let mut document_ids = Vec::new();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        document_ids.push(result.document_id);
    }
    document_ids.sort_unstable();
    document_ids.dedup();
    assert_eq!(document_ids.len(), 8, "every ingest call mints its own document id");
}

#[tokio::test]
async fn timings_are_reported_for_every_phase() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let engine = ContextEngine::new(EngineConfig::new(
        Arc::new(MockEmbeddingProvider::new()),
        Arc::new(MemoryVectorStore::new()),
    ));

    let ingest = engine
        .ingest(IngestInput::new("doc", "measure the phases"))
        .await
        .unwrap();
    assert!(ingest.durations.total_ms >= ingest.durations.chunking_ms);

    let retrieve = engine
        .retrieve(RetrieveInput::new("phases"))
        .await
        .unwrap();
    assert!(retrieve.durations.total_ms >= retrieve.durations.retrieval_ms);
    assert_eq!(retrieve.embedding_model, "mock:bag-of-words");
}
