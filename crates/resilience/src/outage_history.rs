// SPDX-License-Identifier: MIT

//! Bounded outage record history with MTTR/MTBF/availability metrics.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use ssync_storage::atomic_json::{load_or_default, save_atomic};

const MAX_OUTAGES: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutageRecord {
    pub started_at: f64,
    pub ended_at: Option<f64>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub jobs_affected: u64,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct PersistedHistory {
    records: VecDeque<OutageRecord>,
}

/// Tracks up to `MAX_OUTAGES` outage records, persisted to
/// `outage_history.json` after every mutation.
pub struct OutageHistory {
    path: PathBuf,
    history: Mutex<PersistedHistory>,
}

impl OutageHistory {
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        let path = data_dir.as_ref().join("outage_history.json");
        let history = load_or_default::<PersistedHistory>(&path);
        Self { path, history: Mutex::new(history) }
    }

    fn save(&self, history: &PersistedHistory) {
        if let Err(e) = save_atomic(&self.path, history) {
            tracing::error!(error = %e, "failed to save outage history");
        }
    }

    pub fn record_outage_start(&self, started_at: f64) {
        let mut history = self.history.lock();
        history.records.push_back(OutageRecord { started_at, ended_at: None, duration: None, jobs_affected: 0 });
        while history.records.len() > MAX_OUTAGES {
            history.records.pop_front();
        }
        self.save(&history);
        tracing::debug!(started_at, "outage started");
    }

    /// Update the most recent ongoing outage (`ended_at == None`). A no-op
    /// if there is no ongoing outage.
    pub fn record_outage_end(&self, ended_at: f64, jobs_affected: u64) {
        let mut history = self.history.lock();
        let Some(record) = history.records.iter_mut().rev().find(|r| r.ended_at.is_none()) else {
            tracing::debug!("record_outage_end called but no ongoing outage found");
            return;
        };
        record.ended_at = Some(ended_at);
        record.duration = Some(ended_at - record.started_at);
        record.jobs_affected = jobs_affected;
        let duration = record.duration;
        self.save(&history);
        tracing::debug!(ended_at, duration, jobs_affected, "outage ended");
    }

    /// Copy of the history, oldest to newest.
    pub fn get_history(&self) -> Vec<OutageRecord> {
        self.history.lock().records.iter().cloned().collect()
    }

    /// The ongoing outage, if one exists.
    pub fn get_current_outage(&self) -> Option<OutageRecord> {
        self.history.lock().records.iter().rev().find(|r| r.ended_at.is_none()).cloned()
    }
}

/// Mean time to recovery over completed outages, in seconds. `None` if no
/// outage in `records` has ended.
pub fn mttr(records: &[OutageRecord]) -> Option<f64> {
    let durations: Vec<f64> = records.iter().filter_map(|r| r.duration).collect();
    if durations.is_empty() {
        return None;
    }
    Some(durations.iter().sum::<f64>() / durations.len() as f64)
}

/// Mean time between failures: average gap between one outage's
/// `ended_at` and the next outage's `started_at`, in seconds — the
/// uptime between consecutive incidents, not the start-to-start cycle
/// time. `None` if fewer than two outages are recorded, or if there are
/// not at least two consecutive records with a closed predecessor.
pub fn mtbf(records: &[OutageRecord]) -> Option<f64> {
    if records.len() < 2 {
        return None;
    }
    let mut sorted: Vec<&OutageRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.started_at.partial_cmp(&b.started_at).unwrap_or(std::cmp::Ordering::Equal));
    let gaps: Vec<f64> = sorted
        .windows(2)
        .filter_map(|w| w[0].ended_at.map(|ended| w[1].started_at - ended))
        .collect();
    if gaps.is_empty() {
        return None;
    }
    Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
}

/// Fraction of `window_secs` (ending at `now`) not spent in an outage,
/// in `[0.0, 1.0]`. Ongoing outages count as downtime up to `now`.
pub fn availability(records: &[OutageRecord], now: f64, window_secs: f64) -> f64 {
    if window_secs <= 0.0 {
        return 1.0;
    }
    let window_start = now - window_secs;
    let downtime: f64 = records
        .iter()
        .map(|r| {
            let start = r.started_at.max(window_start);
            let end = r.ended_at.unwrap_or(now).min(now);
            (end - start).max(0.0)
        })
        .sum();
    (1.0 - (downtime / window_secs).clamp(0.0, 1.0)).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "outage_history_tests.rs"]
mod tests;
