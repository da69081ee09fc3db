//! SQLite emission ledger
//!
//! Remembers which pages have already been written to the records file, across runs, and keeps
//! a row per run. Pages are keyed by the SHA-256 of their normalized URL.

use crate::output::stats::CrawlStats;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;

/// SQL schema for the ledger database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_persisted INTEGER NOT NULL DEFAULT 0,
    chunks_written INTEGER NOT NULL DEFAULT 0
);

-- Pages whose records have been written
CREATE TABLE IF NOT EXISTS emitted_pages (
    url_key TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    title TEXT,
    chunk_count INTEGER NOT NULL,
    emitted_at TEXT NOT NULL,
    run_id INTEGER REFERENCES runs(id)
);
"#;

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            _ => None,
        }
    }
}

/// A row of the `runs` table
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub pages_persisted: u64,
    pub chunks_written: u64,
}

/// Ledger key of a normalized URL
pub fn url_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Cross-run record of emitted pages
pub struct EmissionLedger {
    conn: Connection,
    run_id: Option<i64>,
}

impl EmissionLedger {
    /// Opens or creates the ledger database
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        Self::with_connection(conn)
    }

    /// Creates an in-memory ledger (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn, run_id: None })
    }

    /// Opens a new run row; pages emitted afterwards are attributed to it
    pub fn start_run(&mut self, config_hash: &str) -> Result<i64, rusqlite::Error> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        let id = self.conn.last_insert_rowid();
        self.run_id = Some(id);
        Ok(id)
    }

    /// Closes the current run with its final counts
    pub fn finish_run(
        &mut self,
        status: RunStatus,
        stats: &CrawlStats,
    ) -> Result<(), rusqlite::Error> {
        let Some(run_id) = self.run_id.take() else {
            return Ok(());
        };

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_persisted = ?3, chunks_written = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                stats.pages_persisted as i64,
                stats.chunks_written as i64,
                run_id
            ],
        )?;
        Ok(())
    }

    /// Whether records for this URL were written by any run
    pub fn contains(&self, url: &str) -> Result<bool, rusqlite::Error> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM emitted_pages WHERE url_key = ?1",
                params![url_key(url)],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Records that a page's chunks were written
    pub fn record_emitted(
        &mut self,
        url: &str,
        title: &str,
        chunk_count: usize,
    ) -> Result<(), rusqlite::Error> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO emitted_pages (url_key, url, title, chunk_count, emitted_at, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![url_key(url), url, title, chunk_count as i64, now, self.run_id],
        )?;
        Ok(())
    }

    pub fn count_emitted(&self) -> Result<u64, rusqlite::Error> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM emitted_pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn latest_run(&self) -> Result<Option<RunRecord>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status, pages_persisted, chunks_written
             FROM runs ORDER BY id DESC LIMIT 1",
        )?;

        let run = stmt
            .query_row([], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(RunStatus::Running),
                    pages_persisted: row.get::<_, i64>(5)? as u64,
                    chunks_written: row.get::<_, i64>(6)? as u64,
                })
            })
            .optional()?;

        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_url_key_is_sha256_hex() {
        let key = url_key("https://example.com/");
        assert_eq!(key.len(), 64);
        assert_eq!(key, url_key("https://example.com/"));
        assert_ne!(key, url_key("https://example.com/b"));
    }

    #[test]
    fn test_record_and_contains() {
        let mut ledger = EmissionLedger::open_in_memory().unwrap();
        ledger.start_run("hash").unwrap();

        assert!(!ledger.contains("https://example.com/a").unwrap());
        ledger
            .record_emitted("https://example.com/a", "A", 3)
            .unwrap();
        assert!(ledger.contains("https://example.com/a").unwrap());

        // Recording twice keeps one row
        ledger
            .record_emitted("https://example.com/a", "A", 3)
            .unwrap();
        assert_eq!(ledger.count_emitted().unwrap(), 1);
    }

    #[test]
    fn test_run_lifecycle() {
        let mut ledger = EmissionLedger::open_in_memory().unwrap();
        let id = ledger.start_run("abc123").unwrap();

        let running = ledger.latest_run().unwrap().unwrap();
        assert_eq!(running.id, id);
        assert_eq!(running.status, RunStatus::Running);
        assert!(running.finished_at.is_none());

        let stats = CrawlStats {
            pages_persisted: 2,
            chunks_written: 7,
            ..CrawlStats::default()
        };
        ledger.finish_run(RunStatus::Completed, &stats).unwrap();

        let done = ledger.latest_run().unwrap().unwrap();
        assert_eq!(done.status, RunStatus::Completed);
        assert_eq!(done.config_hash, "abc123");
        assert_eq!(done.pages_persisted, 2);
        assert_eq!(done.chunks_written, 7);
        assert!(done.finished_at.is_some());
    }

    #[test]
    fn test_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let mut ledger = EmissionLedger::open(&path).unwrap();
            ledger.start_run("h").unwrap();
            ledger.record_emitted("https://example.com/", "Home", 1).unwrap();
        }

        let ledger = EmissionLedger::open(&path).unwrap();
        assert!(ledger.contains("https://example.com/").unwrap());
    }
}
