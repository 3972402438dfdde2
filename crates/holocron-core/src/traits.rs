//! Seam traits between the engine and its pluggable collaborators.
//!
//! Each seam is one trait object: concrete implementations are chosen by a
//! factory reading config, and callers can mock any of them in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    BatchEntry, ChunkLink, ChunkMeta, CodeChunk, IndexEvent, ScoredChunk, StoredIndexEvent,
};

/// Embedding provider seam.
///
/// `dimensions() == 0` signals a no-op provider; the engine then runs in
/// lexical-only mode and never issues vector queries.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text into a fixed-width dense vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding width, or 0 for a no-op provider.
    fn dimensions(&self) -> usize;

    /// Whether the provider's backend is reachable.
    async fn is_available(&self) -> bool;
}

/// Storage seam: the hybrid relational + full-text + vector store.
///
/// One implementation instance exclusively owns its database handle; all
/// other components go through this contract.
#[async_trait]
pub trait HybridStore: Send + Sync {
    /// Transactional upsert of a batch of chunks with optional vectors.
    ///
    /// All rows land atomically or not at all. Fails with
    /// [`crate::HolocronError::DimensionMismatch`] if any vector's width
    /// differs from the locked store dimension, rolling the batch back.
    async fn add_batch(&self, entries: &[BatchEntry]) -> Result<()>;

    /// Weighted BM25 search. An unparseable or empty normalized query
    /// yields an empty result, never an error.
    async fn search_bm25(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Nearest-neighbor search; empty when the store holds no vectors.
    /// Scores are `1 / (1 + distance)`.
    async fn search_vector(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Point lookup by chunk id.
    async fn get_chunk_by_id(&self, id: &str) -> Result<Option<ChunkMeta>>;

    /// Transactional upsert of similarity edges, keyed on `(src, dst)`.
    async fn add_links(&self, links: &[ChunkLink]) -> Result<()>;

    /// Outgoing links of a chunk, descending by similarity.
    async fn get_links(&self, src_id: &str, limit: usize) -> Result<Vec<ChunkLink>>;

    /// Append one audit event.
    async fn log_index_event(&self, event: &IndexEvent) -> Result<()>;

    /// Most recent audit events, newest first.
    async fn recent_events(&self, limit: usize) -> Result<Vec<StoredIndexEvent>>;

    /// Delete every row (all three indexed tables) for a file path.
    /// Returns the number of chunks removed.
    async fn remove_by_file_path(&self, path: &str) -> Result<usize>;

    /// Truncate chunk, full-text, and link tables; drop the vector table
    /// and unlock the dimension.
    async fn clear_all(&self) -> Result<()>;

    /// Iterate every chunk id with its stored vector, in rowid order.
    /// Used by the link-building pass; empty when the store has no vectors.
    async fn all_vectors(&self) -> Result<Vec<(String, Vec<f32>)>>;

    /// Cached chunk count.
    fn size(&self) -> usize;

    /// Whether any vectors are stored.
    fn has_vectors(&self) -> bool;

    /// Locked vector width, 0 while unlocked.
    fn dimensions(&self) -> usize;
}

/// Chunking strategy seam.
///
/// Chunking never fails on content: a pathological file yields a single
/// chunk spanning the whole file.
pub trait ChunkStrategy: Send + Sync {
    fn chunk(&self, path: &str, contents: &str, language: &str) -> Vec<CodeChunk>;
}

/// One chat-style message for the inference seam.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Non-streaming completion result.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub model: String,
}

/// One streamed completion delta.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub content: String,
    pub done: bool,
}

/// Chat inference seam, consumed by layers above retrieval (the engine
/// itself only retrieves).
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion>;

    /// Streamed variant; deltas arrive on the returned channel, terminated
    /// by a chunk with `done == true`.
    async fn stream(
        &self,
        messages: &[ChatMessage],
    ) -> Result<tokio::sync::mpsc::Receiver<StreamChunk>>;
}
