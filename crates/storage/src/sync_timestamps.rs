// SPDX-License-Identifier: MIT

//! Per-scene "last successfully synced at" timestamps, used by the
//! reconciliation gap detectors to tell a stale target apart from one
//! that was simply never touched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::atomic_json::{load_or_default, save_atomic};

pub struct SyncTimestampStore {
    path: PathBuf,
}

impl SyncTimestampStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        Self { path: data_dir.as_ref().join("sync_timestamps.json") }
    }

    fn load(&self) -> HashMap<String, f64> {
        load_or_default(&self.path)
    }

    /// The last time `scene_id` was successfully synced, if ever.
    pub fn get(&self, scene_id: u64) -> Option<f64> {
        self.load().get(&scene_id.to_string()).copied()
    }

    /// Record `scene_id` as synced at `now`.
    pub fn record(&self, scene_id: u64, now: f64) {
        let mut all = self.load();
        all.insert(scene_id.to_string(), now);
        if let Err(e) = save_atomic(&self.path, &all) {
            tracing::debug!(error = %e, "failed to save sync timestamps");
        }
    }
}

#[cfg(test)]
#[path = "sync_timestamps_tests.rs"]
mod tests;
