//! The indexing pipeline.
//!
//! remove stale rows → read+chunk under bounded concurrency → embed
//! sequentially → classify → one atomic batch commit → audit event.
//! Callers serialize runs; only one pipeline per engine is in flight.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use holocron_core::classify::classify_path;
use holocron_core::tokenize::embedding_input;
use holocron_core::{
    BatchEntry, ChunkStrategy, CodeChunk, Embedder, HolocronError, HybridStore, IndexEvent,
    IndexEventKind, IndexResult, Result,
};

use crate::walker;

/// Cap on concurrently open files during the read/chunk phase.
const READ_CONCURRENCY: usize = 16;

/// Orchestrates walking, chunking, embedding, and the batch commit.
pub struct Indexer<S> {
    store: Arc<S>,
    chunker: Arc<dyn ChunkStrategy>,
    embedder: Arc<dyn Embedder>,
}

impl<S: HybridStore + 'static> Indexer<S> {
    pub fn new(
        store: Arc<S>,
        chunker: Arc<dyn ChunkStrategy>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            store,
            chunker,
            embedder,
        }
    }

    /// Walk `root` to exhaustion and run the full pipeline.
    pub async fn index_directory(
        &self,
        root: &Path,
        commit_sha: Option<String>,
    ) -> Result<IndexResult> {
        let paths = walker::collect_paths(root);
        info!(root = %root.display(), files = paths.len(), "indexing directory");
        self.run_pipeline(&paths, IndexEventKind::Full, commit_sha)
            .await
    }

    /// Re-index an explicit set of files.
    pub async fn index_files(
        &self,
        paths: &[PathBuf],
        kind: IndexEventKind,
        commit_sha: Option<String>,
    ) -> Result<IndexResult> {
        self.run_pipeline(paths, kind, commit_sha).await
    }

    /// Drop every chunk belonging to the given files.
    pub async fn remove_files(&self, paths: &[PathBuf]) -> Result<usize> {
        let mut removed = 0;
        for path in paths {
            removed += self
                .store
                .remove_by_file_path(&path.to_string_lossy())
                .await?;
        }
        Ok(removed)
    }

    /// Wipe the index entirely.
    pub async fn clear_index(&self) -> Result<()> {
        self.store.clear_all().await
    }

    async fn run_pipeline(
        &self,
        paths: &[PathBuf],
        kind: IndexEventKind,
        commit_sha: Option<String>,
    ) -> Result<IndexResult> {
        // Old rows for these files go first, so a re-index never leaves
        // stale chunks behind. Idempotent for paths never seen before.
        let mut chunks_removed = 0u32;
        for path in paths {
            chunks_removed += self
                .store
                .remove_by_file_path(&path.to_string_lossy())
                .await? as u32;
        }

        // Phase A: bounded-concurrency read + chunk
        let chunks = self.read_and_chunk(paths).await?;
        debug!(chunks = chunks.len(), "chunked input files");

        // Phase B: sequential embed. A dimension-0 embedder attaches empty
        // vectors; transport errors abort the run.
        let dims = self.embedder.dimensions();
        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = if dims == 0 {
                Vec::new()
            } else {
                self.embedder.embed(&embedding_input(&chunk)).await?
            };
            let memory_type = classify_path(&chunk.file_path);
            entries.push(BatchEntry::new(chunk, vector, memory_type));
        }

        // Phase C: one atomic batch
        let chunks_added = entries.len();
        self.store.add_batch(&entries).await?;

        // Phase D: audit
        self.store
            .log_index_event(&IndexEvent {
                kind,
                files_changed: paths.len() as u32,
                chunks_added: chunks_added as u32,
                chunks_removed,
                commit_sha,
            })
            .await?;

        info!(
            files = paths.len(),
            chunks_added, chunks_removed, "indexing run committed"
        );

        Ok(IndexResult {
            files_walked: paths.len(),
            chunks_added,
        })
    }

    async fn read_and_chunk(&self, paths: &[PathBuf]) -> Result<Vec<CodeChunk>> {
        let semaphore = Arc::new(Semaphore::new(READ_CONCURRENCY));
        let mut join_set: JoinSet<Vec<CodeChunk>> = JoinSet::new();

        for path in paths {
            let path = path.clone();
            let semaphore = semaphore.clone();
            let chunker = self.chunker.clone();

            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Vec::new();
                };
                let Some(file) = walker::read_file(&path).await else {
                    return Vec::new();
                };
                chunker.chunk(
                    &file.path.to_string_lossy(),
                    &file.contents,
                    &file.language,
                )
            });
        }

        let mut chunks = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(file_chunks) => chunks.extend(file_chunks),
                Err(e) => {
                    warn!(error = %e, "read/chunk task failed");
                    return Err(HolocronError::index(format!(
                        "read/chunk task panicked: {}",
                        e
                    )));
                }
            }
        }
        Ok(chunks)
    }
}
