//! holocron-chunk - Language-aware code chunking
//!
//! Two strategies behind the [`ChunkStrategy`] seam:
//!
//! - [`BlockChunker`]: splits at function/class/method declaration lines
//!   found by per-language patterns, with oversize blocks re-split into
//!   overlapping pieces. Falls back to the window chunker for languages
//!   without a pattern table.
//!
//! - [`WindowChunker`]: fixed 200-line windows with 20-line overlap.

mod block;
mod language;
mod patterns;
mod window;

pub use block::BlockChunker;
pub use language::{language_from_extension, language_from_path};
pub use window::WindowChunker;

// Re-export the seam for convenience
pub use holocron_core::{ChunkStrategy, CodeChunk};
