// SPDX-License-Identifier: MIT

//! Gap detection and dedup'd enqueueing of Source/Target drift.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use ssync_core::config::ReconcileInterval;
use ssync_core::model::{GapKind, GapResult, SceneSnapshot, SyncJob, UpdateType};
use ssync_storage::atomic_json::{load_or_default, save_atomic};
use ssync_storage::Queue;

use crate::adapters::SourceScene;
use crate::scene_extractor::{build_job_data, to_snapshot};

/// Parse an ISO-8601 timestamp into Unix seconds. Unparseable input is
/// treated as "infinitely old" so a gap detector never mistakenly fires
/// on malformed Source data.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9)
}

/// Three independent detectors run over one pre-fetched batch of scenes.
pub struct GapDetector {
    pub skip_missing_detector: bool,
}

impl GapDetector {
    pub fn new(skip_missing_detector: bool) -> Self {
        Self { skip_missing_detector }
    }

    /// Evaluate one scene against its (optional) Target match state and
    /// prior sync timestamp. Returns at most one gap: a StaleSync verdict
    /// (or its absence) takes precedence over the emptiness check, since
    /// a sync_timestamp at or past updated_at means skip even if Target
    /// is empty.
    pub fn detect(
        &self,
        scene: &SourceScene,
        snapshot: &SceneSnapshot,
        target_has_match: bool,
        target_is_empty: bool,
        sync_timestamp: Option<f64>,
    ) -> Option<GapResult> {
        let updated_at = scene.updated_at.as_deref().and_then(parse_timestamp);

        if let Some(ts) = sync_timestamp {
            return match updated_at {
                Some(updated) if updated > ts => Some(GapResult {
                    scene_id: scene.id,
                    kind: GapKind::StaleSync,
                    scene_snapshot: snapshot.clone(),
                    reason: format!("source updated_at {updated} exceeds sync_timestamp {ts}"),
                }),
                _ => None,
            };
        }

        if target_has_match {
            if target_is_empty && snapshot.has_meaningful_metadata() {
                return Some(GapResult {
                    scene_id: scene.id,
                    kind: GapKind::EmptyMetadata,
                    scene_snapshot: snapshot.clone(),
                    reason: "source has metadata, target item has none".to_string(),
                });
            }
            return None;
        }

        if self.skip_missing_detector {
            return None;
        }

        Some(GapResult {
            scene_id: scene.id,
            kind: GapKind::MissingFromTarget,
            scene_snapshot: snapshot.clone(),
            reason: "no sync_timestamp and no target match found".to_string(),
        })
    }
}

/// Dedup rules applied in order: already active in the queue, already
/// enqueued this run, sync_timestamp ahead of updated_at, or no
/// meaningful metadata projected.
pub struct ReconciliationEnqueuer<'a> {
    queue: &'a Queue,
}

/// Authoritative completed-row dedup window for reconciliation's
/// `active_scene_ids` check (7 days).
pub const ACTIVE_SCENE_WINDOW_SECS: f64 = 7.0 * 86_400.0;

impl<'a> ReconciliationEnqueuer<'a> {
    pub fn new(queue: &'a Queue) -> Self {
        Self { queue }
    }

    /// Attempt to enqueue a job for `scene`, returning `true` if one was
    /// enqueued. `enqueued_this_run` tracks scene ids already enqueued
    /// earlier in the same reconciliation pass.
    pub fn maybe_enqueue(
        &self,
        scene: &SourceScene,
        sync_timestamp: Option<f64>,
        enqueued_this_run: &mut HashSet<u64>,
        now: f64,
    ) -> bool {
        if self.queue.active_scene_ids(now, ACTIVE_SCENE_WINDOW_SECS).contains(&scene.id) {
            return false;
        }
        if enqueued_this_run.contains(&scene.id) {
            return false;
        }
        if let (Some(ts), Some(updated)) =
            (sync_timestamp, scene.updated_at.as_deref().and_then(parse_timestamp))
        {
            if ts >= updated {
                return false;
            }
        }

        let snapshot = to_snapshot(scene);
        if !snapshot.has_meaningful_metadata() {
            return false;
        }

        let data = build_job_data(scene);
        let job = SyncJob::new(scene.id, UpdateType::Metadata, data, now);
        if self.queue.enqueue(job).is_ok() {
            enqueued_this_run.insert(scene.id);
            true
        } else {
            false
        }
    }
}

/// Persisted reconciliation scheduler/history state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationState {
    pub last_run_time: f64,
    pub last_run_scope: String,
    pub last_gaps_found: u64,
    pub last_gaps_by_kind: HashMap<GapKind, u64>,
    pub last_enqueued: u64,
    pub last_scenes_checked: u64,
    pub is_startup_run: bool,
    pub run_count: u64,
}

const STARTUP_GRACE_SECS: f64 = 3600.0;

/// Decides when auto-reconciliation should run: once at startup (or after
/// a long enough gap since the last run looks like a restart), then on
/// the configured interval. Distinct from the recovery scheduler.
pub struct AutoReconciliationScheduler {
    path: std::path::PathBuf,
}

impl AutoReconciliationScheduler {
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        Self { path: data_dir.as_ref().join("reconciliation_state.json") }
    }

    pub fn load_state(&self) -> ReconciliationState {
        load_or_default(&self.path)
    }

    pub fn save_state(&self, state: &ReconciliationState) {
        if let Err(e) = save_atomic(&self.path, state) {
            tracing::debug!(error = %e, "failed to save reconciliation state");
        }
    }

    /// True when reconciliation has never run, or it has been at least an
    /// hour since the last run (treated as a fresh process start).
    pub fn is_startup_due(&self, now: f64) -> bool {
        let state = self.load_state();
        state.last_run_time == 0.0 || (now - state.last_run_time) >= STARTUP_GRACE_SECS
    }

    /// True when `interval` has elapsed since the last run.
    pub fn is_due(&self, interval: ReconcileInterval, now: f64) -> bool {
        let seconds = match interval {
            ReconcileInterval::Never => return false,
            ReconcileInterval::Hourly => 3600.0,
            ReconcileInterval::Daily => 86_400.0,
            ReconcileInterval::Weekly => 604_800.0,
        };
        let state = self.load_state();
        state.last_run_time == 0.0 || (now - state.last_run_time) >= seconds
    }

    /// Record the outcome of a reconciliation pass.
    #[allow(clippy::too_many_arguments)]
    pub fn record_run(
        &self,
        scope: &str,
        gaps: &[GapResult],
        enqueued: u64,
        scenes_checked: u64,
        is_startup_run: bool,
        now: f64,
    ) {
        let mut gaps_by_kind: HashMap<GapKind, u64> = HashMap::new();
        for gap in gaps {
            *gaps_by_kind.entry(gap.kind).or_insert(0) += 1;
        }
        let mut state = self.load_state();
        state.last_run_time = now;
        state.last_run_scope = scope.to_string();
        state.last_gaps_found = gaps.len() as u64;
        state.last_gaps_by_kind = gaps_by_kind;
        state.last_enqueued = enqueued;
        state.last_scenes_checked = scenes_checked;
        state.is_startup_run = is_startup_run;
        state.run_count += 1;
        self.save_state(&state);
    }
}

#[cfg(test)]
#[path = "reconciliation_tests.rs"]
mod tests;
