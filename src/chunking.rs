//! Sliding-window chunking of document text.
//!
//! The default chunker splits content into whitespace-delimited tokens (a
//! word-count approximation, not model tokens) and slides a window of
//! `chunk_size` tokens with stride `chunk_size - chunk_overlap` across the
//! sequence. The stride is clamped to at least 1 so a misconfigured overlap
//! can never loop forever.
//!
//! Chunking is pure and synchronous; callers wanting a different policy
//! inject their own [`Chunker`] through the engine config.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Default window width, in whitespace tokens.
pub const DEFAULT_CHUNK_SIZE: usize = 200;
/// Default number of tokens shared between consecutive windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 40;

/// Window policy for the chunker.
///
/// Well-formed options satisfy `chunk_overlap < chunk_size`; the chunker
/// tolerates anything else by clamping its stride, and the ingest pipeline
/// rejects a zero `chunk_size` before chunking runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingOptions {
    /// Maximum tokens per chunk.
    pub chunk_size: usize,
    /// Tokens shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        ChunkingOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingOptions {
    /// Apply a partial override field-by-field.
    #[must_use]
    pub fn merged(self, overrides: Option<&ChunkingOverrides>) -> ChunkingOptions {
        let Some(overrides) = overrides else {
            return self;
        };
        ChunkingOptions {
            chunk_size: overrides.chunk_size.unwrap_or(self.chunk_size),
            chunk_overlap: overrides.chunk_overlap.unwrap_or(self.chunk_overlap),
        }
    }
}

/// Partial [`ChunkingOptions`], used for engine-level and per-call
/// overrides.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ChunkingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<usize>,
}

impl ChunkingOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    #[must_use]
    pub fn chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = Some(chunk_overlap);
        self
    }
}

/// Raw output of a chunker: position, text, and token count.
///
/// Enriched into a full [`crate::types::Chunk`] by the ingest pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkText {
    /// 0-based, strictly increasing position within the document.
    pub index: usize,
    /// Window tokens rejoined with single spaces.
    pub content: String,
    /// Token count of the window.
    pub token_count: usize,
}

/// Chunking strategy injected at config-resolution time.
pub type Chunker = Arc<dyn Fn(&str, ChunkingOptions) -> Vec<ChunkText> + Send + Sync>;

/// Split `content` into overlapping windows of whitespace tokens.
///
/// Empty or whitespace-only content yields an empty vector; this function
/// cannot fail for any finite input.
pub fn default_chunker(content: &str, options: ChunkingOptions) -> Vec<ChunkText> {
    let words: Vec<&str> = content.split_whitespace().collect();
    let mut chunks = Vec::new();

    if words.is_empty() {
        return chunks;
    }

    let stride = options.chunk_size.saturating_sub(options.chunk_overlap).max(1);
    let mut cursor = 0;
    let mut index = 0;

    while cursor < words.len() {
        let end = (cursor + options.chunk_size.max(1)).min(words.len());
        let window = &words[cursor..end];
        let content = window.join(" ");

        // Cannot happen with non-empty whitespace-split tokens, but an
        // injected tokenizer change must not produce empty chunks.
        if content.is_empty() {
            break;
        }

        chunks.push(ChunkText {
            index,
            content,
            token_count: window.len(),
        });

        cursor += stride;
        index += 1;
    }

    chunks
}
