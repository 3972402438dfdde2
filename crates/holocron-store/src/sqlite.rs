//! SQLite-backed hybrid store: relational metadata, FTS5 lexical index, and
//! a sqlite-vec virtual table, all in one file.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use holocron_core::tokenize::{extract_code_tokens, normalize_query, split_identifier};
use holocron_core::{
    epoch_millis, BatchEntry, ChunkLink, ChunkMeta, HolocronError, HybridStore, IndexEvent,
    MemoryType, Result, ScoredChunk, StoredIndexEvent,
};

use crate::schema::{
    vec_table_sql, DROP_INDEXED_TABLES, DURABLE_SCHEMA, INDEXED_SCHEMA, META_SCHEMA,
    SCHEMA_VERSION,
};

/// Register the sqlite-vec extension for every future connection.
///
/// Idempotent; must run before any `Connection::open`.
fn register_sqlite_vec() {
    static INIT: Once = Once::new();
    INIT.call_once(|| unsafe {
        use rusqlite::ffi::sqlite3_auto_extension;
        use sqlite_vec::sqlite3_vec_init;
        #[allow(clippy::missing_transmute_annotations)]
        sqlite3_auto_extension(Some(std::mem::transmute(sqlite3_vec_init as *const ())));
    });
}

/// Hybrid store over a single SQLite file.
///
/// Owns the connection exclusively; all access goes through the
/// [`HybridStore`] contract. Writes are serialized by the mutex, reads are
/// short statements under the same lock.
pub struct SqliteStore {
    conn: Mutex<Connection>,

    /// Locked vector width; 0 until the first non-empty vector insert.
    dims: AtomicUsize,

    /// Cached chunk count.
    count: AtomicUsize,

    /// Whether opening this store performed a destructive migration.
    migrated: bool,
}

impl SqliteStore {
    /// Open or create a store at the given path, running the schema
    /// version gate.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        register_sqlite_vec();

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| HolocronError::store(format!("Failed to open database: {}", e)))?;
        Self::init(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_memory() -> Result<Self> {
        register_sqlite_vec();
        let conn = Connection::open_in_memory()
            .map_err(|e| HolocronError::store(format!("Failed to open in-memory database: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;
            PRAGMA busy_timeout = 30000;
            PRAGMA temp_store = MEMORY;
            "#,
        )
        .map_err(|e| HolocronError::store(format!("Failed to configure connection: {}", e)))?;

        conn.execute_batch(META_SCHEMA)
            .map_err(|e| HolocronError::store(format!("Failed to create meta table: {}", e)))?;

        let stored_version = read_meta(&conn, "schema_version")?
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);

        let mut migrated = false;
        if stored_version != 0 && stored_version < SCHEMA_VERSION {
            warn!(
                stored_version,
                current = SCHEMA_VERSION,
                "index schema is outdated; dropping indexed tables, a full re-index is required"
            );
            conn.execute_batch(DROP_INDEXED_TABLES)
                .map_err(|e| HolocronError::store(format!("Migration drop failed: {}", e)))?;
            conn.execute("DELETE FROM _meta WHERE key = 'dimensions'", [])
                .map_err(|e| HolocronError::store(e.to_string()))?;
            migrated = true;
        }

        conn.execute_batch(INDEXED_SCHEMA)
            .map_err(|e| HolocronError::store(format!("Failed to create schema: {}", e)))?;
        conn.execute_batch(DURABLE_SCHEMA)
            .map_err(|e| HolocronError::store(format!("Failed to create schema: {}", e)))?;

        write_meta(&conn, "schema_version", &SCHEMA_VERSION.to_string())?;

        // Restore the vector table for an existing store
        let dims = read_meta(&conn, "dimensions")?
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        if dims > 0 {
            conn.execute_batch(&vec_table_sql(dims))
                .map_err(|e| HolocronError::store(format!("Failed to restore vector table: {}", e)))?;
        }

        let count: usize = conn
            .query_row("SELECT COUNT(*) FROM chunk_meta", [], |row| row.get(0))
            .map_err(|e| HolocronError::store(e.to_string()))?;

        debug!(chunks = count, dims, migrated, "store ready");

        Ok(Self {
            conn: Mutex::new(conn),
            dims: AtomicUsize::new(dims),
            count: AtomicUsize::new(count),
            migrated,
        })
    }

    /// Whether opening performed a destructive schema migration. The caller
    /// is expected to force a full re-index when this is set.
    pub fn migrated(&self) -> bool {
        self.migrated
    }

    fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| HolocronError::store(e.to_string()))?;
        f(&conn)
    }

    fn refresh_count(&self, conn: &Connection) -> Result<()> {
        let count: usize = conn
            .query_row("SELECT COUNT(*) FROM chunk_meta", [], |row| row.get(0))
            .map_err(|e| HolocronError::store(e.to_string()))?;
        self.count.store(count, Ordering::SeqCst);
        Ok(())
    }

    /// Delete one chunk's rows from all three indexed tables.
    fn delete_rowid(conn: &Connection, rowid: i64, have_vecs: bool) -> Result<()> {
        conn.execute("DELETE FROM chunks_fts WHERE rowid = ?1", params![rowid])
            .map_err(|e| HolocronError::store(e.to_string()))?;
        if have_vecs {
            conn.execute("DELETE FROM vecs WHERE rowid = ?1", params![rowid])
                .map_err(|e| HolocronError::store(e.to_string()))?;
        }
        conn.execute("DELETE FROM chunk_meta WHERE rowid = ?1", params![rowid])
            .map_err(|e| HolocronError::store(e.to_string()))?;
        Ok(())
    }

    fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChunkMeta> {
        let memory_type: String = row.get(8)?;
        Ok(ChunkMeta {
            id: row.get(0)?,
            content: row.get(1)?,
            file_path: row.get(2)?,
            start_line: row.get(3)?,
            end_line: row.get(4)?,
            language: row.get(5)?,
            symbol_name: row.get(6)?,
            ingested_at: row.get::<_, i64>(7)? as u64,
            memory_type: MemoryType::from_str_or_default(&memory_type),
        })
    }

    fn vec_to_bytes(v: &[f32]) -> Vec<u8> {
        v.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_vec(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }
}

const CHUNK_COLUMNS: &str =
    "m.id, m.content, m.file_path, m.start_line, m.end_line, m.language, m.symbol_name, m.ingested_at, m.memory_type";

#[async_trait]
impl HybridStore for SqliteStore {
    async fn add_batch(&self, entries: &[BatchEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| HolocronError::store(e.to_string()))?;

            let mut locked_dims = self.dims.load(Ordering::SeqCst);
            let now = epoch_millis();

            for entry in entries {
                let chunk = &entry.chunk;

                // Replace any row already holding this chunk id
                let existing: Option<i64> = tx
                    .query_row(
                        "SELECT rowid FROM chunk_meta WHERE id = ?1",
                        params![chunk.id],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(|e| HolocronError::store(e.to_string()))?;
                if let Some(rowid) = existing {
                    Self::delete_rowid(&tx, rowid, locked_dims > 0)?;
                }

                tx.execute(
                    r#"
                    INSERT INTO chunk_meta
                        (id, content, file_path, start_line, end_line, language, symbol_name, ingested_at, memory_type)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        chunk.id,
                        chunk.content,
                        chunk.file_path,
                        chunk.start_line,
                        chunk.end_line,
                        chunk.language,
                        chunk.symbol_name,
                        now as i64,
                        entry.memory_type.to_string(),
                    ],
                )
                .map_err(|e| HolocronError::store(format!("Failed to insert chunk: {}", e)))?;
                let rowid = tx.last_insert_rowid();

                let basename = Path::new(&chunk.file_path)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let file_tokens = split_identifier(&basename);
                let code_tokens = extract_code_tokens(&chunk.content);

                tx.execute(
                    r#"
                    INSERT INTO chunks_fts (rowid, content, symbol_name, file_tokens, code_tokens)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        rowid,
                        chunk.content,
                        chunk.symbol_name.as_deref().unwrap_or(""),
                        file_tokens,
                        code_tokens,
                    ],
                )
                .map_err(|e| HolocronError::store(format!("Failed to insert FTS row: {}", e)))?;

                if !entry.vector.is_empty() {
                    if locked_dims == 0 {
                        // First vector ever: fix D and create the table
                        locked_dims = entry.vector.len();
                        tx.execute_batch(&vec_table_sql(locked_dims))
                            .map_err(|e| {
                                HolocronError::store(format!("Failed to create vector table: {}", e))
                            })?;
                        write_meta(&tx, "dimensions", &locked_dims.to_string())?;
                    } else if entry.vector.len() != locked_dims {
                        // Dropping the transaction rolls the whole batch back
                        return Err(HolocronError::DimensionMismatch {
                            expected: locked_dims,
                            got: entry.vector.len(),
                        });
                    }

                    tx.execute(
                        "INSERT INTO vecs (rowid, embedding) VALUES (?1, ?2)",
                        params![rowid, Self::vec_to_bytes(&entry.vector)],
                    )
                    .map_err(|e| HolocronError::store(format!("Failed to insert vector: {}", e)))?;
                }
            }

            tx.commit()
                .map_err(|e| HolocronError::store(e.to_string()))?;

            self.dims.store(locked_dims, Ordering::SeqCst);
            self.refresh_count(conn)?;
            debug!(entries = entries.len(), "batch committed");
            Ok(())
        })
    }

    async fn search_bm25(&self, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        self.with_conn(|conn| {
            let sql = format!(
                r#"
                SELECT {CHUNK_COLUMNS}, bm25(chunks_fts, 10.0, 1.0, 5.0, 3.0) AS dist
                FROM chunks_fts
                JOIN chunk_meta m ON m.rowid = chunks_fts.rowid
                WHERE chunks_fts MATCH ?1
                ORDER BY dist
                LIMIT ?2
                "#
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| HolocronError::store(e.to_string()))?;

            let rows = stmt.query_map(params![normalized, top_k], |row| {
                let chunk = Self::row_to_chunk(row)?;
                let dist: f64 = row.get(9)?;
                Ok(ScoredChunk {
                    chunk,
                    score: -dist as f32,
                })
            });

            let collected: std::result::Result<Vec<_>, _> =
                rows.and_then(|mapped| mapped.collect());
            match collected {
                Ok(results) => Ok(results),
                // A query that survives normalization can still trip the
                // FTS grammar; treat that as "no lexical hits"
                Err(e) if is_fts_grammar_error(&e) => {
                    warn!(query = %normalized, "unparseable full-text query");
                    Ok(Vec::new())
                }
                Err(e) => Err(HolocronError::store(e.to_string())),
            }
        })
    }

    async fn search_vector(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if self.dims.load(Ordering::SeqCst) == 0 || query_vec.is_empty() {
            return Ok(Vec::new());
        }

        self.with_conn(|conn| {
            let sql = format!(
                r#"
                SELECT {CHUNK_COLUMNS}, v.distance
                FROM vecs v
                JOIN chunk_meta m ON m.rowid = v.rowid
                WHERE v.embedding MATCH ?1
                ORDER BY v.distance
                LIMIT ?2
                "#
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| HolocronError::store(e.to_string()))?;

            let results = stmt
                .query_map(params![Self::vec_to_bytes(query_vec), top_k], |row| {
                    let chunk = Self::row_to_chunk(row)?;
                    let distance: f64 = row.get(9)?;
                    Ok(ScoredChunk {
                        chunk,
                        score: (1.0 / (1.0 + distance)) as f32,
                    })
                })
                .map_err(|e| HolocronError::store(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| HolocronError::store(e.to_string()))?;

            Ok(results)
        })
    }

    async fn get_chunk_by_id(&self, id: &str) -> Result<Option<ChunkMeta>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {CHUNK_COLUMNS} FROM chunk_meta m WHERE m.id = ?1");
            let result = conn
                .query_row(&sql, params![id], Self::row_to_chunk)
                .optional()
                .map_err(|e| HolocronError::store(e.to_string()))?;
            Ok(result)
        })
    }

    async fn add_links(&self, links: &[ChunkLink]) -> Result<()> {
        if links.is_empty() {
            return Ok(());
        }

        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| HolocronError::store(e.to_string()))?;
            let now = epoch_millis() as i64;

            {
                let mut stmt = tx
                    .prepare(
                        r#"
                        INSERT INTO chunk_links (src_id, dst_id, similarity, created_at)
                        VALUES (?1, ?2, ?3, ?4)
                        ON CONFLICT (src_id, dst_id)
                        DO UPDATE SET similarity = excluded.similarity, created_at = excluded.created_at
                        "#,
                    )
                    .map_err(|e| HolocronError::store(e.to_string()))?;

                for link in links {
                    stmt.execute(params![link.src_id, link.dst_id, link.similarity, now])
                        .map_err(|e| HolocronError::store(e.to_string()))?;
                }
            }

            tx.commit().map_err(|e| HolocronError::store(e.to_string()))?;
            Ok(())
        })
    }

    async fn get_links(&self, src_id: &str, limit: usize) -> Result<Vec<ChunkLink>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT src_id, dst_id, similarity
                    FROM chunk_links
                    WHERE src_id = ?1
                    ORDER BY similarity DESC
                    LIMIT ?2
                    "#,
                )
                .map_err(|e| HolocronError::store(e.to_string()))?;

            let links = stmt
                .query_map(params![src_id, limit], |row| {
                    Ok(ChunkLink {
                        src_id: row.get(0)?,
                        dst_id: row.get(1)?,
                        similarity: row.get(2)?,
                    })
                })
                .map_err(|e| HolocronError::store(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| HolocronError::store(e.to_string()))?;

            Ok(links)
        })
    }

    async fn log_index_event(&self, event: &IndexEvent) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO index_events
                    (event_type, files_changed, chunks_added, chunks_removed, commit_sha, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    event.kind.to_string(),
                    event.files_changed,
                    event.chunks_added,
                    event.chunks_removed,
                    event.commit_sha,
                    epoch_millis() as i64,
                ],
            )
            .map_err(|e| HolocronError::store(e.to_string()))?;
            Ok(())
        })
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<StoredIndexEvent>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT event_type, files_changed, chunks_added, chunks_removed, commit_sha, created_at
                    FROM index_events
                    ORDER BY id DESC
                    LIMIT ?1
                    "#,
                )
                .map_err(|e| HolocronError::store(e.to_string()))?;

            let events = stmt
                .query_map(params![limit], |row| {
                    Ok(StoredIndexEvent {
                        event_type: row.get(0)?,
                        files_changed: row.get(1)?,
                        chunks_added: row.get(2)?,
                        chunks_removed: row.get(3)?,
                        commit_sha: row.get(4)?,
                        created_at: row.get::<_, i64>(5)? as u64,
                    })
                })
                .map_err(|e| HolocronError::store(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| HolocronError::store(e.to_string()))?;

            Ok(events)
        })
    }

    async fn remove_by_file_path(&self, path: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| HolocronError::store(e.to_string()))?;

            let rowids: Vec<i64> = {
                let mut stmt = tx
                    .prepare("SELECT rowid FROM chunk_meta WHERE file_path = ?1")
                    .map_err(|e| HolocronError::store(e.to_string()))?;
                let ids = stmt
                    .query_map(params![path], |row| row.get(0))
                    .map_err(|e| HolocronError::store(e.to_string()))?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| HolocronError::store(e.to_string()))?;
                ids
            };

            let have_vecs = self.dims.load(Ordering::SeqCst) > 0;
            for rowid in &rowids {
                Self::delete_rowid(&tx, *rowid, have_vecs)?;
            }

            tx.commit().map_err(|e| HolocronError::store(e.to_string()))?;
            self.refresh_count(conn)?;
            Ok(rowids.len())
        })
    }

    async fn clear_all(&self) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| HolocronError::store(e.to_string()))?;

            tx.execute("DELETE FROM chunk_meta", [])
                .map_err(|e| HolocronError::store(e.to_string()))?;
            tx.execute("DELETE FROM chunks_fts", [])
                .map_err(|e| HolocronError::store(e.to_string()))?;
            tx.execute("DELETE FROM chunk_links", [])
                .map_err(|e| HolocronError::store(e.to_string()))?;
            tx.execute_batch("DROP TABLE IF EXISTS vecs")
                .map_err(|e| HolocronError::store(e.to_string()))?;
            tx.execute("DELETE FROM _meta WHERE key = 'dimensions'", [])
                .map_err(|e| HolocronError::store(e.to_string()))?;

            tx.commit().map_err(|e| HolocronError::store(e.to_string()))?;

            self.dims.store(0, Ordering::SeqCst);
            self.count.store(0, Ordering::SeqCst);
            Ok(())
        })
    }

    async fn all_vectors(&self) -> Result<Vec<(String, Vec<f32>)>> {
        if self.dims.load(Ordering::SeqCst) == 0 {
            return Ok(Vec::new());
        }

        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT m.id, v.embedding
                    FROM vecs v
                    JOIN chunk_meta m ON m.rowid = v.rowid
                    ORDER BY v.rowid
                    "#,
                )
                .map_err(|e| HolocronError::store(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    let id: String = row.get(0)?;
                    let bytes: Vec<u8> = row.get(1)?;
                    Ok((id, Self::bytes_to_vec(&bytes)))
                })
                .map_err(|e| HolocronError::store(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| HolocronError::store(e.to_string()))?;

            Ok(rows)
        })
    }

    fn size(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn has_vectors(&self) -> bool {
        self.dims.load(Ordering::SeqCst) > 0
    }

    fn dimensions(&self) -> usize {
        self.dims.load(Ordering::SeqCst)
    }
}

fn read_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM _meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| HolocronError::store(e.to_string()))
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO _meta (key, value) VALUES (?1, ?2)
         ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .map_err(|e| HolocronError::store(e.to_string()))?;
    Ok(())
}

fn is_fts_grammar_error(e: &rusqlite::Error) -> bool {
    let msg = e.to_string();
    msg.contains("fts5") || msg.contains("MATCH")
}

#[cfg(test)]
mod tests {
    use super::*;
    use holocron_core::CodeChunk;

    fn chunk(id: &str, content: &str, file_path: &str) -> CodeChunk {
        CodeChunk {
            id: id.to_string(),
            content: content.to_string(),
            file_path: file_path.to_string(),
            start_line: 0,
            end_line: 1,
            language: "typescript".to_string(),
            symbol_name: None,
        }
    }

    fn entry(id: &str, content: &str, file_path: &str, vector: Vec<f32>) -> BatchEntry {
        BatchEntry::new(chunk(id, content, file_path), vector, MemoryType::Semantic)
    }

    #[tokio::test]
    async fn test_add_and_search_bm25() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .add_batch(&[entry(
                "/r/a.ts:0:1",
                "function authenticateUser(token) {}",
                "/r/a.ts",
                vec![],
            )])
            .await
            .unwrap();

        let hits = store.search_bm25("authenticateUser", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, "/r/a.ts:0:1");
        assert_eq!(store.size(), 1);
        assert!(!store.has_vectors());
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .add_batch(&[entry("/r/a.ts:0:1", "old content here", "/r/a.ts", vec![])])
            .await
            .unwrap();
        store
            .add_batch(&[entry("/r/a.ts:0:1", "fresh content here", "/r/a.ts", vec![])])
            .await
            .unwrap();

        assert_eq!(store.size(), 1);
        let found = store.get_chunk_by_id("/r/a.ts:0:1").await.unwrap().unwrap();
        assert_eq!(found.content, "fresh content here");
        // the FTS row was replaced too
        assert!(store.search_bm25("old", 10).await.unwrap().is_empty());
        assert_eq!(store.search_bm25("fresh", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_and_reserved_queries_return_empty() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .add_batch(&[entry("/r/a.ts:0:1", "some content", "/r/a.ts", vec![])])
            .await
            .unwrap();

        assert!(store.search_bm25("", 10).await.unwrap().is_empty());
        assert!(store.search_bm25("   ", 10).await.unwrap().is_empty());
        // normalizes to nothing
        assert!(store.search_bm25("(*)^", 10).await.unwrap().is_empty());
        // unknown term: no hits, no error
        assert!(store.search_bm25("zzzzunknown", 10).await.unwrap().is_empty());
        // hyphenated barewords trip the FTS grammar and are swallowed
        assert!(store.search_bm25("foo-bar", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vector_search_scores() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .add_batch(&[
                entry("/r/a.ts:0:1", "alpha", "/r/a.ts", vec![1.0, 0.0, 0.0]),
                entry("/r/b.ts:0:1", "beta", "/r/b.ts", vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert!(store.has_vectors());
        assert_eq!(store.dimensions(), 3);

        let hits = store.search_vector(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "/r/a.ts:0:1");
        // exact match: distance 0 → score 1
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_vector_search_without_vectors_is_empty() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .add_batch(&[entry("/r/a.ts:0:1", "alpha", "/r/a.ts", vec![])])
            .await
            .unwrap();
        assert!(store.search_vector(&[1.0, 0.0], 5).await.unwrap().is_empty());
        assert!(store.search_vector(&[], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rolls_back_batch() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .add_batch(&[entry("/r/a.ts:0:1", "first", "/r/a.ts", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        let err = store
            .add_batch(&[
                entry("/r/b.ts:0:1", "second", "/r/b.ts", vec![1.0, 0.0, 0.0]),
                entry("/r/c.ts:0:1", "third", "/r/c.ts", vec![1.0, 0.0]),
            ])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HolocronError::DimensionMismatch { expected: 3, got: 2 }
        ));

        // whole batch rolled back, including the valid first entry
        assert_eq!(store.size(), 1);
        assert!(store.get_chunk_by_id("/r/b.ts:0:1").await.unwrap().is_none());
        assert_eq!(store.dimensions(), 3);
    }

    #[tokio::test]
    async fn test_clear_all_unlocks_dimensions() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .add_batch(&[entry("/r/a.ts:0:1", "alpha", "/r/a.ts", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();
        store.clear_all().await.unwrap();

        assert_eq!(store.size(), 0);
        assert!(!store.has_vectors());

        // a different width locks cleanly after the reset
        store
            .add_batch(&[entry("/r/a.ts:0:1", "alpha", "/r/a.ts", vec![1.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(store.dimensions(), 2);
    }

    #[tokio::test]
    async fn test_remove_by_file_path() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .add_batch(&[
                entry("/r/a.ts:0:1", "alpha one", "/r/a.ts", vec![1.0, 0.0]),
                entry("/r/a.ts:1:2", "alpha two", "/r/a.ts", vec![0.0, 1.0]),
                entry("/r/b.ts:0:1", "beta", "/r/b.ts", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let removed = store.remove_by_file_path("/r/a.ts").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.size(), 1);
        assert!(store.search_bm25("alpha", 10).await.unwrap().is_empty());
        // removing an absent path is a no-op
        assert_eq!(store.remove_by_file_path("/r/a.ts").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_links_upsert_and_order() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .add_links(&[
                ChunkLink {
                    src_id: "a".into(),
                    dst_id: "b".into(),
                    similarity: 0.7,
                },
                ChunkLink {
                    src_id: "a".into(),
                    dst_id: "c".into(),
                    similarity: 0.95,
                },
            ])
            .await
            .unwrap();

        // conflict on (src, dst) updates in place
        store
            .add_links(&[ChunkLink {
                src_id: "a".into(),
                dst_id: "b".into(),
                similarity: 0.99,
            }])
            .await
            .unwrap();

        let links = store.get_links("a", 10).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].dst_id, "b");
        assert!((links[0].similarity - 0.99).abs() < 1e-6);
        assert_eq!(links[1].dst_id, "c");
    }

    #[tokio::test]
    async fn test_event_log() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .log_index_event(&IndexEvent {
                kind: holocron_core::IndexEventKind::Full,
                files_changed: 3,
                chunks_added: 12,
                chunks_removed: 0,
                commit_sha: Some("abc123".into()),
            })
            .await
            .unwrap();

        let events = store.recent_events(10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "full");
        assert_eq!(events[0].chunks_added, 12);
        assert_eq!(events[0].commit_sha.as_deref(), Some("abc123"));
        assert!(events[0].created_at > 0);
    }

    #[tokio::test]
    async fn test_migration_drops_chunks_keeps_events() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("index.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store
                .add_batch(&[entry("/r/a.ts:0:1", "alpha", "/r/a.ts", vec![1.0, 0.0])])
                .await
                .unwrap();
            store
                .log_index_event(&IndexEvent {
                    kind: holocron_core::IndexEventKind::Full,
                    files_changed: 1,
                    chunks_added: 1,
                    chunks_removed: 0,
                    commit_sha: None,
                })
                .await
                .unwrap();
        }

        // age the schema version behind the current constant
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute(
                "UPDATE _meta SET value = '1' WHERE key = 'schema_version'",
                [],
            )
            .unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert!(store.migrated());
        assert_eq!(store.size(), 0);
        assert!(!store.has_vectors());
        // event log survived the migration
        assert_eq!(store.recent_events(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reopen_restores_dimension_lock() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("index.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store
                .add_batch(&[entry("/r/a.ts:0:1", "alpha", "/r/a.ts", vec![1.0, 0.0, 0.0])])
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.dimensions(), 3);
        assert_eq!(store.size(), 1);
        let hits = store.search_vector(&[1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_all_vectors() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.all_vectors().await.unwrap().is_empty());

        store
            .add_batch(&[
                entry("/r/a.ts:0:1", "alpha", "/r/a.ts", vec![1.0, 0.0]),
                entry("/r/b.ts:0:1", "beta", "/r/b.ts", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let vectors = store.all_vectors().await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].0, "/r/a.ts:0:1");
        assert_eq!(vectors[0].1, vec![1.0, 0.0]);
    }
}
