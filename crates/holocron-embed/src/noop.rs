//! No-op embedder: lexical-only mode.

use async_trait::async_trait;

use holocron_core::{Embedder, Result};

/// Embedder with dimension 0. The engine treats it as "no vectors": chunks
/// are stored without embeddings and searches skip the ANN leg entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmbedder;

impl NoopEmbedder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Embedder for NoopEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(Vec::new())
    }

    fn dimensions(&self) -> usize {
        0
    }

    async fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_is_dimension_zero() {
        let embedder = NoopEmbedder::new();
        assert_eq!(embedder.dimensions(), 0);
        assert!(embedder.embed("anything").await.unwrap().is_empty());
        assert!(embedder.is_available().await);
    }
}
