// SPDX-License-Identifier: MIT

//! Process-local in-memory hook dedup set. Authoritative only for this
//! process's lifetime; the queue's `active_scene_ids` is authoritative
//! across invocations.

use std::collections::HashSet;

use parking_lot::Mutex;

#[derive(Default)]
pub struct HookDedup {
    pending: Mutex<HashSet<u64>>,
}

impl HookDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `scene_id` as enqueued via the hook fast path. Returns `false`
    /// if it was already marked (caller should skip the enqueue).
    pub fn mark(&self, scene_id: u64) -> bool {
        self.pending.lock().insert(scene_id)
    }

    /// Clear `scene_id`'s mark once the worker reaches a terminal outcome
    /// for it (ack, requeue, or DLQ) — always, so the mark never latches.
    pub fn unmark(&self, scene_id: u64) {
        self.pending.lock().remove(&scene_id);
    }

    pub fn contains(&self, scene_id: u64) -> bool {
        self.pending.lock().contains(&scene_id)
    }
}

#[cfg(test)]
#[path = "dedup_tests.rs"]
mod tests;
