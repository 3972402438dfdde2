//! holocron-embed - Embedding providers
//!
//! Implementations of the [`Embedder`] seam:
//!
//! - [`NoopEmbedder`]: dimension 0, puts the engine in lexical-only mode
//! - [`OllamaEmbedder`]: HTTP transport against an Ollama server
//! - [`OnnxEmbedder`]: local sentence-transformer via ONNX Runtime
//! - [`MockEmbedder`]: deterministic hash vectors for tests

mod mock;
mod noop;
mod ollama;
mod onnx;

pub use mock::MockEmbedder;
pub use noop::NoopEmbedder;
pub use ollama::OllamaEmbedder;
pub use onnx::OnnxEmbedder;

// Re-export the seam for convenience
pub use holocron_core::Embedder;
