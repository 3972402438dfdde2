//! Core domain types for the holocron engine.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Classification of a file as payload (code, docs) vs. tooling (config, scripts).
///
/// Retrieval weights procedural memory lower than semantic memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    Semantic,
    Procedural,
}

impl MemoryType {
    /// Parse from the stored column value; anything unrecognized reads as semantic.
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "procedural" => Self::Procedural,
            _ => Self::Semantic,
        }
    }

    /// Score multiplier applied at retrieval time.
    pub fn weight(self) -> f32 {
        match self {
            Self::Semantic => 1.0,
            Self::Procedural => 0.8,
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Semantic => "semantic",
            Self::Procedural => "procedural",
        };
        write!(f, "{}", s)
    }
}

impl Default for MemoryType {
    fn default() -> Self {
        Self::Semantic
    }
}

/// A contiguous span of one source file, produced by the chunker.
///
/// Line numbers are 0-based and half-open: the chunk covers
/// `[start_line, end_line)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChunk {
    /// Deterministic id: `"{path}:{start}:{end}"`, with a `:{subindex}`
    /// suffix for oversize sub-chunks.
    pub id: String,

    /// Verbatim chunk text.
    pub content: String,

    /// Absolute path of the source file.
    pub file_path: String,

    /// First line of the chunk (0-based).
    pub start_line: u32,

    /// One past the last line of the chunk.
    pub end_line: u32,

    /// Lowercase language name, e.g. "typescript".
    pub language: String,

    /// Declared symbol the chunk starts at, if the chunker found one.
    pub symbol_name: Option<String>,
}

/// A persisted chunk row, as returned by store lookups and searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub id: String,
    pub content: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub language: String,
    pub symbol_name: Option<String>,

    /// Ingestion timestamp (epoch ms), set by the store at insert time.
    pub ingested_at: u64,

    pub memory_type: MemoryType,
}

/// One entry of a store batch: a chunk plus its (possibly empty) embedding.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub chunk: CodeChunk,

    /// Dense embedding. Empty means "no vector for this chunk".
    pub vector: Vec<f32>,

    pub memory_type: MemoryType,
}

impl BatchEntry {
    pub fn new(chunk: CodeChunk, vector: Vec<f32>, memory_type: MemoryType) -> Self {
        Self {
            chunk,
            vector,
            memory_type,
        }
    }
}

/// A directed similarity edge in the chunk-link graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkLink {
    pub src_id: String,
    pub dst_id: String,

    /// Similarity in `[0, 1]`.
    pub similarity: f32,
}

/// What kind of indexing run produced an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEventKind {
    Full,
    Incremental,
    Files,
}

impl std::fmt::Display for IndexEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
            Self::Files => "files",
        };
        write!(f, "{}", s)
    }
}

/// Append-only audit record of one indexing run.
#[derive(Debug, Clone)]
pub struct IndexEvent {
    pub kind: IndexEventKind,
    pub files_changed: u32,
    pub chunks_added: u32,
    pub chunks_removed: u32,
    pub commit_sha: Option<String>,
}

/// The git tracker's verdict on whether the index is current, partially
/// stale, or must be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshnessDecision {
    /// Index matches the working tree; nothing to do.
    None,

    /// Re-index everything.
    Full { current_commit: Option<String> },

    /// Re-index only the listed paths.
    Incremental {
        current_commit: String,
        added: Vec<String>,
        modified: Vec<String>,
        deleted: Vec<String>,
    },
}

/// Outcome of an indexing run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexResult {
    pub files_walked: usize,
    pub chunks_added: usize,
}

/// A chunk with the score its retrieval leg assigned, before fusion.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: ChunkMeta,
    pub score: f32,
}

/// An audit row read back from the event log.
#[derive(Debug, Clone)]
pub struct StoredIndexEvent {
    pub event_type: String,
    pub files_changed: u32,
    pub chunks_added: u32,
    pub chunks_removed: u32,
    pub commit_sha: Option<String>,
    pub created_at: u64,
}

/// A ranked retrieval hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: ChunkMeta,

    /// Final fused score (RRF × decay × type weight, plus graph discounts).
    pub score: f32,

    /// Which retrieval path produced the hit. Always "hybrid" for the
    /// fused engine.
    pub source: String,
}

/// Options accepted by the retriever.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Maximum number of results (default 10).
    pub max_results: Option<usize>,

    /// Drop results scoring below this value.
    pub min_score: Option<f32>,

    /// Keep only results whose chunk language is in this set.
    pub languages: Option<Vec<String>>,

    /// Repository root to freshness-check before querying.
    pub directory: Option<std::path::PathBuf>,
}

impl SearchOptions {
    pub fn max_results_or_default(&self) -> usize {
        self.max_results.unwrap_or(10)
    }
}

/// Options accepted by the context formatter.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub max_chars_per_chunk: usize,
    pub relevance_threshold: f32,
    pub max_results_per_file: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_chars_per_chunk: 2000,
            relevance_threshold: 0.05,
            max_results_per_file: 2,
        }
    }
}

/// Cheap store counters exposed through the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoreStats {
    pub chunks: usize,
    pub has_vectors: bool,
    pub dimensions: usize,
}
