//! Reciprocal Rank Fusion (RRF) for combining search legs.

use std::collections::HashMap;

use holocron_core::ScoredChunk;

/// RRF constant. Higher values flatten the contribution of rank position.
pub const RRF_K: f32 = 60.0;

/// Fuse ranked lists into per-id RRF scores.
///
/// Each list contributes `1 / (RRF_K + rank + 1)` per id; ids appearing in
/// several lists accumulate. Only order matters, which makes the fusion
/// robust to score-scale mismatch between BM25 and vector distances — and
/// bitwise deterministic for fixed input orderings.
pub fn reciprocal_rank_fusion(lists: &[&[ScoredChunk]]) -> HashMap<String, f32> {
    let mut scores: HashMap<String, f32> = HashMap::new();

    for list in lists {
        for (rank, hit) in list.iter().enumerate() {
            *scores.entry(hit.chunk.id.clone()).or_default() += 1.0 / (RRF_K + rank as f32 + 1.0);
        }
    }

    scores
}
