//! holocron-query - Retrieval and context formatting
//!
//! [`Retriever`] fuses concurrent BM25 and vector legs with reciprocal
//! rank fusion, applies recency decay and memory-type weighting, and
//! expands through the chunk-link graph. [`format_context`] shapes ranked
//! results into the stable `<codebase_context>` block.

mod engine;
mod format;
mod fusion;

pub use engine::Retriever;
pub use format::format_context;
pub use fusion::{reciprocal_rank_fusion, RRF_K};
