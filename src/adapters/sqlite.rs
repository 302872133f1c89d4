use crate::core::TrackingStore;
use crate::domain::model::TrackingRecord;
use crate::utils::error::{Result, TrackerError};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS comment_tracking (
    comment_url TEXT PRIMARY KEY,
    last_known_rank TEXT,
    last_checked_timestamp TEXT,
    last_reply_timestamp TEXT
)";

/// Naive UTC ISO-8601, e.g. `2024-05-01T12:30:00.123456`.
pub fn utc_timestamp() -> String {
    Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TrackerError::processing("tracking database lock poisoned"))
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM comment_tracking", [], |row| {
            row.get(0)
        })?;
        Ok(n as usize)
    }
}

impl TrackingStore for SqliteStore {
    fn get_last_known_data(&self, comment_url: &str) -> Result<Option<TrackingRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT last_known_rank, last_checked_timestamp, last_reply_timestamp
                 FROM comment_tracking
                 WHERE comment_url = ?1",
                params![comment_url],
                |row| {
                    Ok(TrackingRecord {
                        comment_url: comment_url.to_string(),
                        last_known_rank: row.get(0)?,
                        last_checked_timestamp: row.get(1)?,
                        last_reply_timestamp: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn update_tracking_data(
        &self,
        comment_url: &str,
        current_rank: &str,
        reply_timestamp: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO comment_tracking
                (comment_url, last_known_rank, last_checked_timestamp, last_reply_timestamp)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(comment_url) DO UPDATE SET
                last_known_rank = excluded.last_known_rank,
                last_checked_timestamp = excluded.last_checked_timestamp,
                last_reply_timestamp = COALESCE(excluded.last_reply_timestamp,
                                                comment_tracking.last_reply_timestamp)",
            params![comment_url, current_rank, utc_timestamp(), reply_timestamp],
        )?;
        Ok(())
    }
}
