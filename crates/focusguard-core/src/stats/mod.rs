//! Focus-time accounting.
//!
//! The aggregator keeps the day-scoped counter (today's focused seconds
//! and the date it belongs to) in memory, mirroring every change into the
//! database. Storage failures are logged; the in-memory values stay
//! authoritative until the next restart.

use chrono::NaiveDate;
use serde::Serialize;

use crate::storage::Database;

const KV_TODAY_SECONDS: &str = "focused_today_seconds";
const KV_LAST_FOCUS_DATE: &str = "last_focus_date";

/// Day-scoped focus counter plus the append-only per-day ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsAggregator {
    today_focused_secs: u64,
    last_focus_date: Option<NaiveDate>,
}

impl StatsAggregator {
    /// Restore the cached counter from the database.
    pub fn load(db: &Database) -> Self {
        let today_focused_secs = match db.kv_get(KV_TODAY_SECONDS) {
            Ok(value) => value.and_then(|v| v.parse().ok()).unwrap_or(0),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read today's focus counter");
                0
            }
        };
        let last_focus_date = match db.kv_get(KV_LAST_FOCUS_DATE) {
            Ok(value) => {
                value.and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read last focus date");
                None
            }
        };
        Self {
            today_focused_secs,
            last_focus_date,
        }
    }

    pub fn today_focused_secs(&self) -> u64 {
        self.today_focused_secs
    }

    pub fn last_focus_date(&self) -> Option<NaiveDate> {
        self.last_focus_date
    }

    /// Credit focused seconds to `date`.
    ///
    /// Adds to the ledger entry for that day and, when `date` is the day
    /// the cached counter belongs to, to the counter as well; a new date
    /// restarts the counter first. Exactly one call per completion event,
    /// so nothing is ever double-counted.
    pub fn record_focused_seconds(&mut self, db: &Database, date: NaiveDate, seconds: u32) {
        if self.last_focus_date != Some(date) {
            self.today_focused_secs = 0;
            self.last_focus_date = Some(date);
        }
        self.today_focused_secs += u64::from(seconds);

        if let Err(e) = db.history_add(date, u64::from(seconds)) {
            tracing::warn!(error = %e, %date, "failed to persist focus ledger entry");
        }
        self.persist_counter(db);
    }

    /// Reset the day-scoped counter the first time a new calendar day is
    /// observed. Invoked at startup; safe to invoke redundantly.
    pub fn rollover_if_needed(&mut self, db: &Database, today: NaiveDate) {
        if self.last_focus_date == Some(today) {
            return;
        }
        self.today_focused_secs = 0;
        self.last_focus_date = Some(today);
        self.persist_counter(db);
        tracing::debug!(%today, "daily focus counter rolled over");
    }

    /// Clear the ledger and the counter. Only the explicit reset-all
    /// command reaches this.
    pub fn reset_all(&mut self, db: &Database) {
        self.today_focused_secs = 0;
        self.last_focus_date = None;
        if let Err(e) = db.history_clear() {
            tracing::warn!(error = %e, "failed to clear focus ledger");
        }
        if let Err(e) = db
            .kv_delete(KV_TODAY_SECONDS)
            .and_then(|()| db.kv_delete(KV_LAST_FOCUS_DATE))
        {
            tracing::warn!(error = %e, "failed to clear focus counters");
        }
    }

    fn persist_counter(&self, db: &Database) {
        if let Err(e) = db.kv_set(KV_TODAY_SECONDS, &self.today_focused_secs.to_string()) {
            tracing::warn!(error = %e, "failed to persist today's focus counter");
        }
        if let Some(date) = self.last_focus_date {
            let key = date.format("%Y-%m-%d").to_string();
            if let Err(e) = db.kv_set(KV_LAST_FOCUS_DATE, &key) {
                tracing::warn!(error = %e, "failed to persist last focus date");
            }
        }
    }
}
