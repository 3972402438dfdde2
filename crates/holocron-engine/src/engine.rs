//! The engine facade: one store, one embedder, one chunker, wired behind
//! the public surface that outer layers (CLI, tool servers, hooks) consume.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use holocron_core::{
    ChunkLink, ChunkStrategy, Embedder, FormatOptions, FreshnessDecision, HolocronConfig,
    HybridStore, IndexEventKind, IndexResult, Result, SearchOptions, SearchResult, StoreStats,
};
use holocron_index::{GitTracker, Indexer, NON_GIT_SENTINEL};
use holocron_query::{format_context, Retriever};
use holocron_store::SqliteStore;

use crate::factory;

/// Neighbors considered per chunk by the link-building pass (plus the
/// chunk itself, which the ANN query always returns first).
const LINK_NEIGHBORS: usize = 4;

/// Minimum similarity for a persisted link. Looser than the retriever's
/// traversal threshold so the graph keeps candidates the hop can filter.
const LINK_MIN_SIMILARITY: f32 = 0.85;

/// Local codebase-intelligence engine.
///
/// One instance per database file. Indexing runs are serialized; the store
/// opens lazily on first use and the open is memoized.
pub struct Engine {
    config: HolocronConfig,
    embedder: Arc<dyn Embedder>,
    chunker: Arc<dyn ChunkStrategy>,
    git: GitTracker,
    store: OnceCell<Arc<SqliteStore>>,
    index_lock: Mutex<()>,
}

impl Engine {
    /// Build an engine from configuration, selecting the embedder and
    /// chunker through the factories.
    pub fn new(config: HolocronConfig) -> Result<Self> {
        let embedder = factory::build_embedder(&config.embedding)?;
        let chunker = factory::build_chunker(config.chunking.strategy);
        Ok(Self::with_components(config, embedder, chunker))
    }

    /// Build an engine around explicit components (tests, embedder mocks).
    pub fn with_components(
        config: HolocronConfig,
        embedder: Arc<dyn Embedder>,
        chunker: Arc<dyn ChunkStrategy>,
    ) -> Self {
        let persist_dir = config
            .store
            .persist_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        Self {
            config,
            embedder,
            chunker,
            git: GitTracker::new(persist_dir),
            store: OnceCell::new(),
            index_lock: Mutex::new(()),
        }
    }

    /// Open the store once; subsequent calls share the same handle.
    ///
    /// A destructive schema migration during open invalidates the sidecar
    /// commit so the next freshness check forces a full re-index.
    async fn store(&self) -> Result<Arc<SqliteStore>> {
        self.store
            .get_or_try_init(|| async {
                let store = SqliteStore::open(&self.config.store.persist_path)?;
                if store.migrated() {
                    self.git.clear_last_indexed_commit().await?;
                }
                Ok(Arc::new(store))
            })
            .await
            .cloned()
    }

    fn indexer(&self, store: Arc<SqliteStore>) -> Indexer<SqliteStore> {
        Indexer::new(store, self.chunker.clone(), self.embedder.clone())
    }

    /// Index every text file under `root`.
    pub async fn index_directory(&self, root: &Path) -> Result<IndexResult> {
        let _guard = self.index_lock.lock().await;
        self.index_directory_locked(root).await
    }

    async fn index_directory_locked(&self, root: &Path) -> Result<IndexResult> {
        let store = self.store().await?;
        let commit = self.git.current_commit(root).await;

        let result = self
            .indexer(store)
            .index_directory(root, commit.clone())
            .await?;

        self.git
            .save_last_indexed_commit(commit.as_deref().unwrap_or(NON_GIT_SENTINEL))
            .await?;
        Ok(result)
    }

    /// Re-index an explicit file set (external API path; no commit state
    /// is touched).
    pub async fn index_files(&self, paths: &[PathBuf]) -> Result<IndexResult> {
        let _guard = self.index_lock.lock().await;
        let store = self.store().await?;
        self.indexer(store)
            .index_files(paths, IndexEventKind::Files, None)
            .await
    }

    /// Drop all chunks for the given files.
    pub async fn remove_files(&self, paths: &[PathBuf]) -> Result<usize> {
        let _guard = self.index_lock.lock().await;
        let store = self.store().await?;
        self.indexer(store).remove_files(paths).await
    }

    /// Wipe the index and forget the last indexed commit.
    pub async fn clear_index(&self) -> Result<()> {
        let _guard = self.index_lock.lock().await;
        let store = self.store().await?;
        store.clear_all().await?;
        self.git.clear_last_indexed_commit().await
    }

    /// The git tracker's verdict for `repo_path`.
    pub async fn check_freshness(&self, repo_path: &Path) -> FreshnessDecision {
        self.git.check_freshness(repo_path).await
    }

    /// Hybrid search. When the options name a directory, the index is
    /// freshness-gated against it first: a stale index is repaired (fully
    /// or incrementally) before the query runs.
    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchResult>> {
        let store = self.store().await?;

        if let Some(directory) = options.directory.clone() {
            self.refresh_if_stale(&directory).await?;
        }

        Retriever::new(store, self.embedder.clone())
            .search(query, &options)
            .await
    }

    async fn refresh_if_stale(&self, directory: &Path) -> Result<()> {
        match self.git.check_freshness(directory).await {
            FreshnessDecision::None => Ok(()),
            FreshnessDecision::Full { .. } => {
                info!(directory = %directory.display(), "index stale, full re-index");
                let _guard = self.index_lock.lock().await;
                self.index_directory_locked(directory).await.map(|_| ())
            }
            FreshnessDecision::Incremental {
                current_commit,
                added,
                modified,
                deleted,
            } => {
                debug!(
                    added = added.len(),
                    modified = modified.len(),
                    deleted = deleted.len(),
                    "index stale, incremental re-index"
                );
                let _guard = self.index_lock.lock().await;
                let store = self.store().await?;
                let indexer = self.indexer(store);

                let deleted_paths: Vec<PathBuf> =
                    deleted.iter().map(|p| directory.join(p)).collect();
                indexer.remove_files(&deleted_paths).await?;

                let changed: Vec<PathBuf> = added
                    .iter()
                    .chain(modified.iter())
                    .map(|p| directory.join(p))
                    .collect();
                if !changed.is_empty() {
                    indexer
                        .index_files(
                            &changed,
                            IndexEventKind::Incremental,
                            Some(current_commit.clone()),
                        )
                        .await?;
                }

                self.git.save_last_indexed_commit(&current_commit).await
            }
        }
    }

    /// Shape ranked results into the `<codebase_context>` block.
    pub fn format_context(
        &self,
        results: &[SearchResult],
        query: &str,
        options: Option<FormatOptions>,
    ) -> String {
        format_context(results, query, &options.unwrap_or_default())
    }

    /// Populate the chunk-link graph from vector neighborhoods.
    ///
    /// For every stored vector, its nearest neighbors above the similarity
    /// floor become directed edges. Returns the number of links written.
    pub async fn build_links(&self) -> Result<usize> {
        let store = self.store().await?;
        if !store.has_vectors() {
            return Ok(0);
        }

        let vectors = store.all_vectors().await?;
        let mut links = Vec::new();

        for (id, vector) in &vectors {
            let neighbors = store.search_vector(vector, LINK_NEIGHBORS + 1).await?;
            for neighbor in neighbors {
                if neighbor.chunk.id == *id || neighbor.score < LINK_MIN_SIMILARITY {
                    continue;
                }
                links.push(ChunkLink {
                    src_id: id.clone(),
                    dst_id: neighbor.chunk.id,
                    similarity: neighbor.score.min(1.0),
                });
            }
        }

        store.add_links(&links).await?;
        info!(links = links.len(), "link graph rebuilt");
        Ok(links.len())
    }

    /// Cheap store counters.
    pub async fn stats(&self) -> Result<StoreStats> {
        let store = self.store().await?;
        Ok(StoreStats {
            chunks: store.size(),
            has_vectors: store.has_vectors(),
            dimensions: store.dimensions(),
        })
    }

    /// Release the database handle. The engine re-opens lazily if used
    /// again.
    pub async fn dispose(&mut self) {
        let _guard = self.index_lock.lock().await;
        self.store = OnceCell::new();
    }
}
