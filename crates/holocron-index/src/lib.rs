//! holocron-index - Ingestion side of the engine
//!
//! - [`walker`]: depth-first discovery of indexable text files
//! - [`GitTracker`]: freshness decisions keyed on the last indexed commit
//! - [`Indexer`]: the phased pipeline from file paths to committed batch

pub mod git;
pub mod walker;

mod indexer;

pub use git::{GitTracker, NON_GIT_SENTINEL};
pub use indexer::Indexer;
pub use walker::WalkedFile;
