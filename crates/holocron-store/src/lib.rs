//! holocron-store - Hybrid SQLite storage
//!
//! One database file holds chunk metadata, a weighted FTS5 index, a
//! sqlite-vec virtual table, the similarity-link graph, and the indexing
//! audit log. Schema versions gate destructive migrations.

mod schema;
mod sqlite;

pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteStore;

// Re-export the storage seam for convenience
pub use holocron_core::HybridStore;
