//! Database schema definitions.

/// Bump to force a destructive re-create of the indexed tables on open.
/// The audit log and `_meta` survive migration; chunk data does not — the
/// source of truth is the working tree, and the next freshness check
/// triggers a full re-index.
pub const SCHEMA_VERSION: u32 = 2;

/// Meta table DDL, created before anything else so the version gate can run.
pub const META_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS _meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Schema-versioned tables: dropped and recreated on migration.
pub const INDEXED_SCHEMA: &str = r#"
-- Chunk rows; rowid aligns the FTS and vector tables
CREATE TABLE IF NOT EXISTS chunk_meta (
    id TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    file_path TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    language TEXT NOT NULL,
    symbol_name TEXT,
    ingested_at INTEGER NOT NULL,
    memory_type TEXT NOT NULL DEFAULT 'semantic'
);

CREATE INDEX IF NOT EXISTS idx_chunk_meta_file_path ON chunk_meta(file_path);

-- Weighted full-text index, rowid-aligned with chunk_meta
CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
    content,
    symbol_name,
    file_tokens,
    code_tokens,
    tokenize = 'porter unicode61'
);
"#;

/// Version-independent tables: the link graph and the audit log survive
/// migrations.
pub const DURABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chunk_links (
    src_id TEXT NOT NULL,
    dst_id TEXT NOT NULL,
    similarity REAL NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (src_id, dst_id)
);

CREATE INDEX IF NOT EXISTS idx_chunk_links_src ON chunk_links(src_id);

CREATE TABLE IF NOT EXISTS index_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL,
    files_changed INTEGER NOT NULL,
    chunks_added INTEGER NOT NULL,
    chunks_removed INTEGER NOT NULL,
    commit_sha TEXT,
    created_at INTEGER NOT NULL
);
"#;

/// Migration drop list; the vector table goes with the chunks it indexes.
pub const DROP_INDEXED_TABLES: &str = r#"
DROP TABLE IF EXISTS chunk_meta;
DROP TABLE IF EXISTS chunks_fts;
DROP TABLE IF EXISTS vecs;
"#;

/// The vector table is created lazily, on the first non-empty vector
/// insert, because its column width is fixed at creation time.
pub fn vec_table_sql(dimensions: usize) -> String {
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS vecs USING vec0(embedding float[{}])",
        dimensions
    )
}
