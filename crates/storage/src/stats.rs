// SPDX-License-Identifier: MIT

//! Cumulative sync stats, persisted as a plain atomic JSON file and
//! merged (summed) into whatever is already on disk on every save. The
//! worker holds an in-memory `SyncStats` for the current invocation's
//! "session" and flushes it here; `session_start` of the persisted
//! totals is the *earliest* session's start, not the latest.

use std::path::{Path, PathBuf};

use ssync_core::model::SyncStats;

use crate::atomic_json::{load_or_default, save_atomic};

pub struct StatsStore {
    path: PathBuf,
}

impl StatsStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        Self { path: data_dir.as_ref().join("stats.json") }
    }

    /// A fresh in-memory session accumulator for this invocation.
    pub fn new_session(&self, now: f64) -> SyncStats {
        SyncStats::new(now)
    }

    /// Load the on-disk cumulative totals without mutating them.
    pub fn load(&self) -> SyncStats {
        load_or_default(&self.path)
    }

    /// Merge `session`'s counters into the on-disk totals and persist,
    /// preserving the original `session_start` already on disk (or
    /// `session`'s, if this is the first save ever).
    pub fn flush(&self, session: &SyncStats) -> SyncStats {
        let mut existing: SyncStats = load_or_default(&self.path);
        let original_session_start =
            if existing.session_start == 0.0 { session.session_start } else { existing.session_start };
        existing.merge(session);
        existing.session_start = original_session_start;
        if let Err(e) = save_atomic(&self.path, &existing) {
            tracing::debug!(error = %e, "failed to save stats");
        }
        existing
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
