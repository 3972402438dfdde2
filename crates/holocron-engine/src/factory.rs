//! Component selection from configuration.

use std::sync::Arc;

use holocron_chunk::{BlockChunker, WindowChunker};
use holocron_core::{
    ChunkStrategy, ChunkerKind, Embedder, EmbedderKind, EmbeddingConfig, HolocronError, Result,
};
use holocron_embed::{NoopEmbedder, OllamaEmbedder, OnnxEmbedder};

/// Build the configured embedding provider.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbedderKind::Noop => Ok(Arc::new(NoopEmbedder::new())),
        EmbedderKind::Ollama => Ok(Arc::new(OllamaEmbedder::new(
            &config.base_url,
            &config.model,
            config.dimensions,
        ))),
        EmbedderKind::Transformers => {
            let model_path = config.model_path.as_ref().ok_or_else(|| {
                HolocronError::config("transformers embedder requires embedding.model_path")
            })?;
            let tokenizer_path = config.tokenizer_path.as_ref().ok_or_else(|| {
                HolocronError::config("transformers embedder requires embedding.tokenizer_path")
            })?;
            Ok(Arc::new(OnnxEmbedder::new(
                model_path,
                tokenizer_path,
                config.dimensions,
            )?))
        }
    }
}

/// Build the configured chunking strategy.
pub fn build_chunker(kind: ChunkerKind) -> Arc<dyn ChunkStrategy> {
    match kind {
        ChunkerKind::Ast => Arc::new(BlockChunker::new()),
        ChunkerKind::Text => Arc::new(WindowChunker::new()),
    }
}
