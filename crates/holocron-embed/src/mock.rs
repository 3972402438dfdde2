//! Deterministic mock embedder for tests.

use async_trait::async_trait;

use holocron_core::{Embedder, Result};

/// Hash-based embedder that needs no model files. The same text always maps
/// to the same unit vector, so similarity comparisons are stable across
/// runs.
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    /// Create a mock embedder with the default width.
    pub fn new() -> Self {
        Self { dimensions: 8 }
    }

    /// Create a mock embedder with a custom width.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let hash = text
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));

        let mut vector = vec![0.0f32; self.dimensions];
        for (i, v) in vector.iter_mut().enumerate() {
            *v = ((hash.wrapping_mul(i as u64 + 1) % 1000) as f32) / 1000.0 - 0.5;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn is_available(&self) -> bool {
        true
    }
}
