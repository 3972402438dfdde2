//! The hybrid retriever.
//!
//! BM25 and ANN legs run concurrently, fuse by reciprocal rank, then the
//! fused scores are shaped by recency decay and memory-type weighting.
//! Top results seed a shallow hop through the chunk-link graph.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use holocron_core::{
    epoch_millis, ChunkMeta, Embedder, HybridStore, Result, SearchOptions, SearchResult,
};

use crate::fusion::reciprocal_rank_fusion;

/// Decay never drops a chunk below half weight; after ~13.5 months the
/// damper bottoms out.
const DECAY_FLOOR: f32 = 0.5;
const DECAY_BASE: f32 = 0.95;
const MONTH_MS: f64 = 30.0 * 24.0 * 3600.0 * 1000.0;

/// Graph-hop expansion is deliberately shallow: one hop, few seeds, strong
/// links only, and a discount that keeps expansions below their parents.
const GRAPH_SEEDS: usize = 5;
const GRAPH_LINKS_PER_SEED: usize = 3;
const GRAPH_MIN_SIMILARITY: f32 = 0.9;
const GRAPH_DISCOUNT: f32 = 0.5;

/// Hybrid search engine over one store and one embedder.
pub struct Retriever<S> {
    store: Arc<S>,
    embedder: Arc<dyn Embedder>,
}

impl<S: HybridStore> Retriever<S> {
    pub fn new(store: Arc<S>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Run a hybrid search and return up to `max_results` fused hits.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let started = Instant::now();
        let k = options.max_results_or_default();
        let now = epoch_millis();
        let fetch = k * 2;

        // Both legs touch disjoint indexes and may run concurrently.
        let (bm25_hits, vector_hits) = tokio::join!(
            self.store.search_bm25(query, fetch),
            self.vector_leg(query, fetch)
        );
        let bm25_hits = bm25_hits?;

        debug!(
            bm25 = bm25_hits.len(),
            vector = vector_hits.len(),
            "retrieval legs returned"
        );

        // Fuse; keep the first-seen chunk per id for metadata.
        let rrf_scores = reciprocal_rank_fusion(&[&bm25_hits, &vector_hits]);
        let mut chunks: HashMap<String, ChunkMeta> = HashMap::new();
        for hit in bm25_hits.into_iter().chain(vector_hits) {
            chunks.entry(hit.chunk.id.clone()).or_insert(hit.chunk);
        }

        // Decay and type weighting on top of the fused score.
        let mut scored: Vec<(String, f32)> = rrf_scores
            .into_iter()
            .filter_map(|(id, rrf)| {
                let chunk = chunks.get(&id)?;
                if let Some(languages) = &options.languages {
                    if !languages.iter().any(|l| l == &chunk.language) {
                        return None;
                    }
                }
                let score = rrf * decay(now, chunk.ingested_at) * chunk.memory_type.weight();
                Some((id, score))
            })
            .collect();
        sort_by_score(&mut scored);
        scored.truncate(k);

        // Graph-hop expansion off the top primaries.
        if self.store.has_vectors() && !scored.is_empty() {
            let expansions = self.expand_links(&scored, &mut chunks, now).await?;
            scored.extend(expansions);
            sort_by_score(&mut scored);
            scored.truncate(k);
        }

        let mut results: Vec<SearchResult> = scored
            .into_iter()
            .filter_map(|(id, score)| {
                let chunk = chunks.remove(&id)?;
                Some(SearchResult {
                    chunk,
                    score,
                    source: "hybrid".to_string(),
                })
            })
            .collect();

        if let Some(min_score) = options.min_score {
            results.retain(|r| r.score >= min_score);
        }

        info!(
            query,
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search complete"
        );
        Ok(results)
    }

    /// Vector leg: embed the query, then ANN-search. A failed query embed
    /// degrades to lexical-only instead of failing the search.
    async fn vector_leg(&self, query: &str, fetch: usize) -> Vec<holocron_core::ScoredChunk> {
        if self.embedder.dimensions() == 0 {
            return Vec::new();
        }

        let query_vec = match self.embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "query embedding failed, falling back to lexical-only");
                return Vec::new();
            }
        };

        match self.store.search_vector(&query_vec, fetch).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "vector search failed");
                Vec::new()
            }
        }
    }

    /// One hop through the link graph from the strongest primaries.
    ///
    /// "Already present" means present among the primaries (or an earlier
    /// expansion), not merely seen in the raw candidate pool: a chunk that
    /// was fetched by a leg but truncated or filtered out of the top-K is
    /// still a valid expansion target.
    async fn expand_links(
        &self,
        primary: &[(String, f32)],
        chunks: &mut HashMap<String, ChunkMeta>,
        now: u64,
    ) -> Result<Vec<(String, f32)>> {
        let present: HashSet<&str> = primary.iter().map(|(id, _)| id.as_str()).collect();
        let mut expansions: Vec<(String, f32)> = Vec::new();

        for (seed_id, seed_score) in primary.iter().take(GRAPH_SEEDS) {
            let links = self.store.get_links(seed_id, GRAPH_LINKS_PER_SEED).await?;

            for link in links {
                if link.similarity < GRAPH_MIN_SIMILARITY
                    || present.contains(link.dst_id.as_str())
                    || expansions.iter().any(|(id, _)| id == &link.dst_id)
                {
                    continue;
                }

                let dst = match chunks.get(&link.dst_id).cloned() {
                    Some(cached) => cached,
                    None => {
                        let Some(fetched) = self.store.get_chunk_by_id(&link.dst_id).await? else {
                            continue;
                        };
                        chunks.insert(fetched.id.clone(), fetched.clone());
                        fetched
                    }
                };

                let score = seed_score
                    * GRAPH_DISCOUNT
                    * link.similarity
                    * decay(now, dst.ingested_at)
                    * dst.memory_type.weight();

                expansions.push((link.dst_id, score));
            }
        }

        Ok(expansions)
    }
}

/// Soft recency damper: ~5% per month, floored at one half.
fn decay(now: u64, ingested_at: u64) -> f32 {
    let age_months = now.saturating_sub(ingested_at) as f64 / MONTH_MS;
    DECAY_BASE.powf(age_months as f32).max(DECAY_FLOOR)
}

/// Descending score with id tiebreak so equal scores order stably.
fn sort_by_score(scored: &mut [(String, f32)]) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use holocron_core::{BatchEntry, ChunkLink, CodeChunk, MemoryType};
    use holocron_embed::{MockEmbedder, NoopEmbedder};
    use holocron_store::SqliteStore;

    fn entry(id: &str, content: &str, file: &str, vector: Vec<f32>) -> BatchEntry {
        entry_typed(id, content, file, vector, MemoryType::Semantic)
    }

    fn entry_typed(
        id: &str,
        content: &str,
        file: &str,
        vector: Vec<f32>,
        memory_type: MemoryType,
    ) -> BatchEntry {
        BatchEntry::new(
            CodeChunk {
                id: id.to_string(),
                content: content.to_string(),
                file_path: file.to_string(),
                start_line: 0,
                end_line: 1,
                language: "typescript".to_string(),
                symbol_name: None,
            },
            vector,
            memory_type,
        )
    }

    #[test]
    fn test_decay_behavior() {
        let now = 1_700_000_000_000u64;
        // fresh: no decay
        assert!((decay(now, now) - 1.0).abs() < 1e-6);
        // one month: one factor
        let month = MONTH_MS as u64;
        assert!((decay(now, now - month) - 0.95).abs() < 1e-3);
        // two years: floored
        assert_eq!(decay(now, now - 24 * month), 0.5);
        // clock skew does not panic or boost
        assert!((decay(now, now + month) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_lexical_only_search() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        store
            .add_batch(&[entry(
                "/r/auth.ts:0:1",
                "function authenticateUser(token) { return validate(token); }",
                "/r/auth.ts",
                vec![],
            )])
            .await
            .unwrap();

        let retriever = Retriever::new(store, Arc::new(NoopEmbedder::new()));
        let results = retriever
            .search("authenticateUser", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, "/r/auth.ts:0:1");
        assert_eq!(results[0].source, "hybrid");
    }

    #[tokio::test]
    async fn test_both_legs_empty_returns_empty() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let retriever = Retriever::new(store, Arc::new(NoopEmbedder::new()));
        let results = retriever
            .search("anything", &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_overlap_outranks_single_leg_hits() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let embedder = Arc::new(MockEmbedder::with_dimensions(3));

        // `shared` is the exact query vector so it always leads the vector
        // leg; `only_vec` sits close behind it and matches no query term;
        // `only_bm25` matches the terms but points the other way.
        let query_vec = embedder.embed("login flow").await.unwrap();
        let mut near_vec = query_vec.clone();
        near_vec[0] += 0.05;
        let off_vec: Vec<f32> = query_vec.iter().map(|v| -v).collect();

        store
            .add_batch(&[
                entry("/r/shared.ts:0:1", "login flow handler", "/r/shared.ts", query_vec),
                entry("/r/only_bm25.ts:0:1", "login flow fallback", "/r/only_bm25.ts", off_vec),
                entry("/r/only_vec.ts:0:1", "unrelated words entirely", "/r/only_vec.ts", near_vec),
            ])
            .await
            .unwrap();

        let retriever = Retriever::new(store, embedder);
        let results = retriever
            .search("login flow", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.id, "/r/shared.ts:0:1");
        let shared = results[0].score;
        for r in &results[1..] {
            assert!(shared > r.score);
        }
    }

    #[tokio::test]
    async fn test_graph_hop_pulls_linked_chunk() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let embedder = Arc::new(MockEmbedder::with_dimensions(3));

        // `b` has no vector and matches no query term: the link hop is its
        // only way into the result set
        let vec_a = embedder.embed("token validation").await.unwrap();
        store
            .add_batch(&[
                entry("/r/a.ts:0:1", "token validation entry", "/r/a.ts", vec_a),
                entry("/r/b.ts:0:1", "completely different text", "/r/b.ts", vec![]),
            ])
            .await
            .unwrap();

        store
            .add_links(&[ChunkLink {
                src_id: "/r/a.ts:0:1".into(),
                dst_id: "/r/b.ts:0:1".into(),
                similarity: 0.95,
            }])
            .await
            .unwrap();

        let retriever = Retriever::new(store, embedder);
        let results = retriever
            .search("token validation", &SearchOptions::default())
            .await
            .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert!(ids.contains(&"/r/a.ts:0:1"));
        assert!(ids.contains(&"/r/b.ts:0:1"));

        // the expansion stays behind its parent
        let a = results.iter().find(|r| r.chunk.id == "/r/a.ts:0:1").unwrap();
        let b = results.iter().find(|r| r.chunk.id == "/r/b.ts:0:1").unwrap();
        assert!(a.score > b.score);
    }

    #[tokio::test]
    async fn test_expansion_reaches_candidates_outside_primary() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let embedder = Arc::new(MockEmbedder::with_dimensions(3));

        // `hidden` shows up in both raw legs but the language filter keeps
        // it out of the primaries; the link from `seed` must still be able
        // to pull it back in
        let query_vec = embedder.embed("beacon signal").await.unwrap();
        store
            .add_batch(&[
                entry(
                    "/r/seed.ts:0:1",
                    "beacon signal source",
                    "/r/seed.ts",
                    query_vec.clone(),
                ),
                BatchEntry::new(
                    CodeChunk {
                        id: "/r/hidden.py:0:1".to_string(),
                        content: "beacon signal sink".to_string(),
                        file_path: "/r/hidden.py".to_string(),
                        start_line: 0,
                        end_line: 1,
                        language: "python".to_string(),
                        symbol_name: None,
                    },
                    query_vec,
                    MemoryType::Semantic,
                ),
            ])
            .await
            .unwrap();

        store
            .add_links(&[ChunkLink {
                src_id: "/r/seed.ts:0:1".into(),
                dst_id: "/r/hidden.py:0:1".into(),
                similarity: 0.95,
            }])
            .await
            .unwrap();

        let retriever = Retriever::new(store, embedder);
        let results = retriever
            .search(
                "beacon signal",
                &SearchOptions {
                    languages: Some(vec!["typescript".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert!(ids.contains(&"/r/seed.ts:0:1"));
        assert!(ids.contains(&"/r/hidden.py:0:1"));

        let seed = results.iter().find(|r| r.chunk.id == "/r/seed.ts:0:1").unwrap();
        let hidden = results.iter().find(|r| r.chunk.id == "/r/hidden.py:0:1").unwrap();
        assert!(seed.score > hidden.score);
    }

    #[tokio::test]
    async fn test_weak_links_are_ignored() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let embedder = Arc::new(MockEmbedder::with_dimensions(3));

        let vec_a = embedder.embed("parser internals").await.unwrap();
        store
            .add_batch(&[
                entry("/r/a.ts:0:1", "parser internals", "/r/a.ts", vec_a),
                entry("/r/b.ts:0:1", "other thing", "/r/b.ts", vec![]),
            ])
            .await
            .unwrap();
        store
            .add_links(&[ChunkLink {
                src_id: "/r/a.ts:0:1".into(),
                dst_id: "/r/b.ts:0:1".into(),
                similarity: 0.5,
            }])
            .await
            .unwrap();

        let retriever = Retriever::new(store, embedder);
        let results = retriever
            .search("parser internals", &SearchOptions::default())
            .await
            .unwrap();

        // a 0.5-similarity link is below the traversal threshold
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, "/r/a.ts:0:1");
    }

    #[tokio::test]
    async fn test_procedural_chunks_weigh_less() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        store
            .add_batch(&[
                entry_typed(
                    "/r/service.ts:0:1",
                    "alphaterm",
                    "/r/service.ts",
                    vec![],
                    MemoryType::Semantic,
                ),
                entry_typed(
                    "/r/pkg.json:0:1",
                    "betaterm",
                    "/r/pkg.json",
                    vec![],
                    MemoryType::Procedural,
                ),
            ])
            .await
            .unwrap();

        let retriever = Retriever::new(store, Arc::new(NoopEmbedder::new()));

        // each query matches exactly one chunk at rank 1, freshly
        // ingested, so the scores differ only by the type weight
        let semantic = retriever
            .search("alphaterm", &SearchOptions::default())
            .await
            .unwrap();
        let procedural = retriever
            .search("betaterm", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(semantic.len(), 1);
        assert_eq!(procedural.len(), 1);
        let ratio = semantic[0].score / procedural[0].score;
        assert!((ratio - 1.25).abs() < 1e-3, "ratio was {}", ratio);
    }

    #[tokio::test]
    async fn test_language_filter_and_min_score() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        store
            .add_batch(&[entry(
                "/r/a.ts:0:1",
                "retry helper logic",
                "/r/a.ts",
                vec![],
            )])
            .await
            .unwrap();

        let retriever = Retriever::new(store, Arc::new(NoopEmbedder::new()));

        let mismatch = retriever
            .search(
                "retry helper",
                &SearchOptions {
                    languages: Some(vec!["python".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(mismatch.is_empty());

        let strict = retriever
            .search(
                "retry helper",
                &SearchOptions {
                    min_score: Some(10.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(strict.is_empty());
    }
}
