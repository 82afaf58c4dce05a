//! SQLite store implementation

use crate::normalize::NormalizedPaper;
use crate::store::traits::{PaperStore, StoreResult};
use crate::sync::{IdentityKey, SyncState};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed paper store
///
/// The UNIQUE constraint on `identity_key` is a backstop behind the merge's
/// own membership check; `insert_papers` counts a conflict as a skip.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates the database at the given path
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better concurrent behavior
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Creates all tables and indexes if they don't exist
fn initialize_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS papers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            identity_key TEXT NOT NULL UNIQUE,
            source TEXT NOT NULL,
            title TEXT NOT NULL,
            authors TEXT NOT NULL,
            published TEXT,
            doi TEXT,
            url TEXT,
            abstract TEXT,
            section TEXT,
            ordinal INTEGER NOT NULL,
            topics TEXT NOT NULL,
            ingested_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_papers_source ON papers(source);

        CREATE TABLE IF NOT EXISTS sync_state (
            source TEXT PRIMARY KEY,
            last_run_at TEXT NOT NULL,
            method TEXT NOT NULL,
            batch_size INTEGER NOT NULL
        );
    ",
    )?;
    Ok(())
}

impl PaperStore for SqliteStore {
    fn existing_keys(&self, source: &str) -> StoreResult<HashSet<IdentityKey>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare("SELECT identity_key FROM papers WHERE source = ?1")?;

        let keys = stmt
            .query_map(params![source], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(IdentityKey::from_stored)
            .collect();

        Ok(keys)
    }

    fn insert_papers(&self, papers: &[(IdentityKey, NormalizedPaper)]) -> StoreResult<usize> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let mut inserted = 0usize;

        for (key, paper) in papers {
            let authors = serde_json::to_string(&paper.authors)?;
            let topics = serde_json::to_string(&paper.topics)?;

            let changed = tx.execute(
                "INSERT OR IGNORE INTO papers
                 (identity_key, source, title, authors, published, doi, url, abstract, section, ordinal, topics, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    key.as_str(),
                    paper.source,
                    paper.title,
                    authors,
                    paper.published.map(|d| d.to_string()),
                    paper.doi,
                    paper.url,
                    paper.abstract_text,
                    paper.section,
                    paper.ordinal,
                    topics,
                    now
                ],
            )?;
            inserted += changed;
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn sync_state(&self, source: &str) -> StoreResult<Option<SyncState>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT last_run_at, method, batch_size FROM sync_state WHERE source = ?1",
        )?;

        let state = stmt
            .query_row(params![source], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            })
            .optional()?;

        Ok(state.and_then(|(last_run_at, method, batch_size)| {
            let last_run_at = last_run_at.parse().ok()?;
            Some(SyncState {
                last_run_at,
                method,
                batch_size,
            })
        }))
    }

    fn update_sync_state(&self, source: &str, state: &SyncState) -> StoreResult<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO sync_state (source, last_run_at, method, batch_size)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(source) DO UPDATE SET
                 last_run_at = excluded.last_run_at,
                 method = excluded.method,
                 batch_size = excluded.batch_size",
            params![
                source,
                state.last_run_at.to_rfc3339(),
                state.method,
                state.batch_size
            ],
        )?;
        Ok(())
    }

    fn count_papers(&self, source: &str) -> StoreResult<u64> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let count = conn.query_row(
            "SELECT COUNT(*) FROM papers WHERE source = ?1",
            params![source],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_all(&self) -> StoreResult<u64> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let count = conn.query_row("SELECT COUNT(*) FROM papers", [], |row| row.get(0))?;
        Ok(count)
    }
}
