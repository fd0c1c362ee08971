//! SQLite log of successful dataset fetches.

use super::freshness::FetchTimestamps;
use crate::error::{DataError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use std::path::Path;

/// Persistent record of when each cached file was last downloaded.
#[derive(Debug)]
pub struct FetchLog {
    conn: Connection,
}

/// One successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    /// Cache path the body was written to
    pub path: String,
    /// URL the body was fetched from
    pub url: String,
    /// Size of the body in bytes
    pub bytes: u64,
    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
}

impl FetchRecord {
    /// Build a record for a fetch into `path`.
    pub fn new(path: &Path, url: &str, bytes: u64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            path: path_key(path),
            url: url.to_string(),
            bytes,
            fetched_at,
        }
    }
}

/// Fetch log statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLogStats {
    /// Total number of recorded fetches
    pub total_fetches: usize,
    /// Number of distinct cache paths
    pub distinct_paths: usize,
}

type RawRecord = (String, String, i64, String);

impl FetchLog {
    /// Open (or create) a fetch log.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let log = Self { conn };
        log.initialize_schema()?;
        Ok(log)
    }

    /// Create an in-memory log (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let log = Self { conn };
        log.initialize_schema()?;
        Ok(log)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS fetch_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL,
                url TEXT NOT NULL,
                bytes INTEGER NOT NULL,
                fetched_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_fetch_log_path ON fetch_log(path, fetched_at)",
            [],
        )?;

        Ok(())
    }

    /// Append a successful fetch.
    pub fn record_fetch(&self, record: &FetchRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO fetch_log (path, url, bytes, fetched_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.path,
                record.url,
                i64::try_from(record.bytes).unwrap_or(i64::MAX),
                record
                    .fetched_at
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        Ok(())
    }

    /// Most recent fetch into `path`.
    pub fn last_fetch(&self, path: &Path) -> Result<Option<FetchRecord>> {
        Ok(self.history(path, 1)?.into_iter().next())
    }

    /// Fetches into `path`, newest first.
    pub fn history(&self, path: &Path, limit: usize) -> Result<Vec<FetchRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT path, url, bytes, fetched_at FROM fetch_log
             WHERE path = ?1
             ORDER BY fetched_at DESC, id DESC
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(
                params![path_key(path), i64::try_from(limit).unwrap_or(i64::MAX)],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?
            .collect::<std::result::Result<Vec<RawRecord>, _>>()?;

        rows.into_iter().map(parse_record).collect()
    }

    /// Remove every record.
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM fetch_log", [])?;
        Ok(())
    }

    /// Get log statistics.
    pub fn get_stats(&self) -> Result<FetchLogStats> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM fetch_log", [], |row| row.get(0))?;

        let distinct: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT path) FROM fetch_log", [], |row| {
                    row.get(0)
                })?;

        Ok(FetchLogStats {
            total_fetches: total as usize,
            distinct_paths: distinct as usize,
        })
    }
}

impl FetchTimestamps for FetchLog {
    fn last_fetched(&self, path: &Path) -> Result<Option<DateTime<Utc>>> {
        Ok(self.last_fetch(path)?.map(|record| record.fetched_at))
    }
}

fn parse_record((path, url, bytes, fetched_at): RawRecord) -> Result<FetchRecord> {
    let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
        .map_err(|e| DataError::Timestamp(format!("{fetched_at}: {e}")))?
        .with_timezone(&Utc);

    Ok(FetchRecord {
        path,
        url,
        bytes: u64::try_from(bytes).unwrap_or(0),
        fetched_at,
    })
}

/// Key under which a cache path is stored: canonical when it exists.
fn path_key(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}
