//! holocron-engine - Public engine facade
//!
//! Wires the store, chunker, embedder, git tracker, indexer, and retriever
//! into the surface outer layers consume: index, search, format, freshness.

mod engine;
mod factory;

pub use engine::Engine;
pub use factory::{build_chunker, build_embedder};

// Re-export the vocabulary callers need alongside the engine
pub use holocron_core::{
    FormatOptions, FreshnessDecision, HolocronConfig, HolocronError, IndexResult, Result,
    SearchOptions, SearchResult, StoreStats,
};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the stderr tracing subscriber at the given verbosity.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(level: &str) {
    let level = match level {
        "error" => Level::ERROR,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
