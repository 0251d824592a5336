//! SQLite-based persistence for the timer snapshot and the focus ledger.
//!
//! Two tables:
//! - `kv` -- timer snapshot JSON, today's focused-seconds counter and the
//!   last focus date.
//! - `progress_history` -- one row per local calendar day with the
//!   accumulated focused seconds for that day. Append-only except for the
//!   explicit reset-all operation.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::timer::Snapshot;

const KV_TIMER_SNAPSHOT: &str = "timer_snapshot";

/// Day key format used in `progress_history`.
const DAY_FORMAT: &str = "%Y-%m-%d";

/// SQLite database handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/focusguard/focusguard.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("focusguard.db"))
    }

    /// Open (or create) the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    /// Open an in-memory database, used by tests.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS progress_history (
                day             TEXT PRIMARY KEY,
                focused_seconds INTEGER NOT NULL DEFAULT 0
            );",
        )?;
        Ok(())
    }

    // ── kv store ─────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a key from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── timer snapshot ───────────────────────────────────────────────

    /// Durably record the timer snapshot.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.kv_set(KV_TIMER_SNAPSHOT, &json)
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Load the last saved timer snapshot, `None` on first run.
    ///
    /// A snapshot that fails to parse is treated as absent rather than
    /// fatal; the caller starts fresh.
    pub fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        let Some(json) = self.kv_get(KV_TIMER_SNAPSHOT).map_err(DatabaseError::from)? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable timer snapshot");
                Ok(None)
            }
        }
    }

    // ── progress history ─────────────────────────────────────────────

    /// Add focused seconds to a day's history entry, creating it at 0 if
    /// absent. Returns the day's new total.
    pub fn history_add(&self, day: NaiveDate, seconds: u64) -> Result<u64, rusqlite::Error> {
        let key = day.format(DAY_FORMAT).to_string();
        self.conn.execute(
            "INSERT INTO progress_history (day, focused_seconds) VALUES (?1, ?2)
             ON CONFLICT(day) DO UPDATE SET focused_seconds = focused_seconds + ?2",
            params![key, seconds],
        )?;
        self.conn.query_row(
            "SELECT focused_seconds FROM progress_history WHERE day = ?1",
            params![key],
            |row| row.get(0),
        )
    }

    /// Focused seconds recorded for a day, if any.
    pub fn history_get(&self, day: NaiveDate) -> Result<Option<u64>, rusqlite::Error> {
        let key = day.format(DAY_FORMAT).to_string();
        let result = self.conn.query_row(
            "SELECT focused_seconds FROM progress_history WHERE day = ?1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The full day -> focused-seconds mapping, ordered by day.
    pub fn history_all(&self) -> Result<BTreeMap<NaiveDate, u64>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT day, focused_seconds FROM progress_history ORDER BY day")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;

        let mut history = BTreeMap::new();
        for row in rows {
            let (key, seconds) = row?;
            match NaiveDate::parse_from_str(&key, DAY_FORMAT) {
                Ok(day) => {
                    history.insert(day, seconds);
                }
                Err(e) => {
                    tracing::warn!(day = %key, error = %e, "skipping malformed history row");
                }
            }
        }
        Ok(history)
    }

    /// The most recent `days` history entries, newest first.
    pub fn history_recent(
        &self,
        days: u32,
    ) -> Result<Vec<(NaiveDate, u64)>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT day, focused_seconds FROM progress_history ORDER BY day DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![days], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;

        let mut recent = Vec::new();
        for row in rows {
            let (key, seconds) = row?;
            if let Ok(day) = NaiveDate::parse_from_str(&key, DAY_FORMAT) {
                recent.push((day, seconds));
            }
        }
        Ok(recent)
    }

    /// Drop every history row. Only the explicit reset-all path calls this.
    pub fn history_clear(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute("DELETE FROM progress_history", [])?;
        Ok(())
    }
}
