// SPDX-License-Identifier: MIT

//! Durable job queue. A row carries `{id, status, payload, enqueued_at}`;
//! state transitions are captured as WAL operations and folded into a
//! `MaterializedQueueState`.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use ssync_core::model::{job_key_for, QueueItemStatus, SyncJob};

use crate::checkpoint::Checkpointer;
use crate::wal::{Wal, WalError};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Checkpoint(#[from] crate::checkpoint::CheckpointError),
    #[error("queue item {0} not found")]
    NotFound(String),
}

/// One durable queue row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    pub status: QueueItemStatus,
    pub payload: SyncJob,
    pub enqueued_at: f64,
    pub completed_at: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum QueueOp {
    Put { id: String, payload: SyncJob, enqueued_at: f64 },
    Dequeued { id: String },
    Acked { id: String, completed_at: f64 },
    Nacked { id: String },
    Failed { id: String, completed_at: f64 },
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct MaterializedQueueState {
    items: HashMap<String, QueueItem>,
}

impl MaterializedQueueState {
    fn apply(&mut self, op: &QueueOp) {
        match op {
            QueueOp::Put { id, payload, enqueued_at } => {
                self.items.insert(
                    id.clone(),
                    QueueItem {
                        id: id.clone(),
                        status: QueueItemStatus::Ready,
                        payload: payload.clone(),
                        enqueued_at: *enqueued_at,
                        completed_at: None,
                    },
                );
            }
            QueueOp::Dequeued { id } => {
                if let Some(item) = self.items.get_mut(id) {
                    item.status = QueueItemStatus::InProgress;
                }
            }
            QueueOp::Acked { id, completed_at } => {
                if let Some(item) = self.items.get_mut(id) {
                    item.status = QueueItemStatus::Completed;
                    item.completed_at = Some(*completed_at);
                }
            }
            QueueOp::Nacked { id } => {
                if let Some(item) = self.items.get_mut(id) {
                    item.status = QueueItemStatus::Ready;
                }
            }
            QueueOp::Failed { id, completed_at } => {
                if let Some(item) = self.items.get_mut(id) {
                    item.status = QueueItemStatus::Failed;
                    item.completed_at = Some(*completed_at);
                }
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct QueueStats {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}

/// The durable sync job queue.
pub struct Queue {
    wal: Mutex<Wal<QueueOp>>,
    state: Arc<Mutex<MaterializedQueueState>>,
    checkpointer: Checkpointer,
}

impl Queue {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, QueueError> {
        let data_dir = data_dir.as_ref();
        let checkpointer = Checkpointer::new(data_dir.join("queue.snapshot.zst"));
        let (processed_seq, mut state) = match checkpointer.load::<MaterializedQueueState>()? {
            Some((seq, state)) => (seq, state),
            None => (0, MaterializedQueueState::default()),
        };

        let wal_path: PathBuf = data_dir.join("queue.wal");
        let mut wal = Wal::open(&wal_path, processed_seq)?;
        for entry in wal.entries_after(processed_seq)? {
            state.apply(&entry.entry);
            wal.mark_processed(entry.seq);
        }

        Ok(Self { wal: Mutex::new(wal), state: Arc::new(Mutex::new(state)), checkpointer })
    }

    /// `enqueue(job)` wraps the SyncJob and durably appends a `Put` op.
    /// Returns the new row id.
    pub fn enqueue(&self, job: SyncJob) -> Result<String, QueueError> {
        let mut wal = self.wal.lock();
        let seq = {
            // reserve the id before appending so state stays consistent
            // with what we're about to write
            wal.write_seq() + 1
        };
        let id = format!("q-{seq}");
        let op = QueueOp::Put { id: id.clone(), payload: job, enqueued_at: wal_now() };
        wal.append(&op)?;
        wal.flush()?;
        self.state.lock().apply(&op);
        Ok(id)
    }

    /// `get_pending` is non-blocking; the dispatcher is responsible for
    /// any polling delay. Returns at most one `Ready` row whose
    /// `next_retry_at` is already due, oldest first (FIFO at the storage
    /// layer) — a not-yet-due retry is left untouched in `Ready` so it
    /// doesn't block rows behind it in the FIFO order.
    pub fn get_pending(&self, now: f64) -> Result<Option<QueueItem>, QueueError> {
        let mut state = self.state.lock();
        let next_id = {
            let mut ready: Vec<&QueueItem> = state
                .items
                .values()
                .filter(|i| i.status == QueueItemStatus::Ready && i.payload.next_retry_at <= now)
                .collect();
            ready.sort_by(|a, b| a.enqueued_at.partial_cmp(&b.enqueued_at).unwrap_or(std::cmp::Ordering::Equal));
            ready.first().map(|i| i.id.clone())
        };
        let Some(id) = next_id else { return Ok(None) };

        let op = QueueOp::Dequeued { id: id.clone() };
        {
            let mut wal = self.wal.lock();
            wal.append(&op)?;
            wal.flush()?;
        }
        state.apply(&op);
        Ok(state.items.get(&id).cloned())
    }

    pub fn ack(&self, id: &str) -> Result<(), QueueError> {
        self.apply_terminal(QueueOp::Acked { id: id.to_string(), completed_at: wal_now() })
    }

    pub fn nack(&self, id: &str) -> Result<(), QueueError> {
        self.apply_terminal(QueueOp::Nacked { id: id.to_string() })
    }

    pub fn ack_failed(&self, id: &str) -> Result<(), QueueError> {
        self.apply_terminal(QueueOp::Failed { id: id.to_string(), completed_at: wal_now() })
    }

    /// `ack` the old row and `enqueue` a fresh one carrying the job's
    /// updated retry metadata — the underlying queue primitive does not
    /// support mutating an in-flight row in place.
    pub fn requeue_with_metadata(&self, old_id: &str, job: SyncJob) -> Result<String, QueueError> {
        self.ack(old_id)?;
        self.enqueue(job)
    }

    fn apply_terminal(&self, op: QueueOp) -> Result<(), QueueError> {
        let id = match &op {
            QueueOp::Acked { id, .. } | QueueOp::Nacked { id } | QueueOp::Failed { id, .. } => id.clone(),
            QueueOp::Put { .. } | QueueOp::Dequeued { .. } => unreachable!("not a terminal op"),
        };
        if !self.state.lock().items.contains_key(&id) {
            return Err(QueueError::NotFound(id));
        }
        let mut wal = self.wal.lock();
        wal.append(&op)?;
        wal.flush()?;
        self.state.lock().apply(&op);
        Ok(())
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        let mut stats = QueueStats::default();
        for item in state.items.values() {
            match item.status {
                QueueItemStatus::Inited | QueueItemStatus::Ready => stats.pending += 1,
                QueueItemStatus::InProgress => stats.in_progress += 1,
                QueueItemStatus::Completed => stats.completed += 1,
                QueueItemStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Scene ids whose rows are in `{Inited, Ready, InProgress}` or
    /// `Completed` within `completed_window_secs` of `now` — the
    /// authoritative dedup filter.
    pub fn active_scene_ids(&self, now: f64, completed_window_secs: f64) -> std::collections::HashSet<u64> {
        let state = self.state.lock();
        state
            .items
            .values()
            .filter(|item| match item.status {
                QueueItemStatus::Inited | QueueItemStatus::Ready | QueueItemStatus::InProgress => true,
                QueueItemStatus::Completed => item
                    .completed_at
                    .is_some_and(|completed_at| now - completed_at <= completed_window_secs),
                QueueItemStatus::Failed => false,
            })
            .map(|item| item.payload.scene_id)
            .collect()
    }

    /// Whether `scene_id` already has a job key matching a queued row —
    /// convenience wrapper used by the enqueuer's at-most-one-active
    /// invariant check.
    pub fn has_active_job_for_scene(&self, scene_id: u64) -> bool {
        let key = job_key_for(scene_id);
        let state = self.state.lock();
        state.items.values().any(|item| {
            item.payload.job_key() == key
                && matches!(item.status, QueueItemStatus::Inited | QueueItemStatus::Ready | QueueItemStatus::InProgress)
        })
    }

    /// Delete rows in `{Inited, Ready, InProgress}` — used by the
    /// "clear queue" admin task. In-progress rows from a previous
    /// session are orphans and must be cleared to prevent auto-resume
    /// re-processing. Checkpoints immediately afterward: the WAL only
    /// ever records `Put`/status-transition ops, so a pruned row would
    /// otherwise reappear on the next open() replay.
    pub fn prune_pending(&self) -> Result<usize, QueueError> {
        let pruned = {
            let ids: Vec<String> = {
                let state = self.state.lock();
                state
                    .items
                    .values()
                    .filter(|i| matches!(i.status, QueueItemStatus::Inited | QueueItemStatus::Ready | QueueItemStatus::InProgress))
                    .map(|i| i.id.clone())
                    .collect()
            };
            let mut state = self.state.lock();
            for id in &ids {
                state.items.remove(id);
            }
            ids.len()
        };
        self.checkpoint()?;
        Ok(pruned)
    }

    /// Snapshot materialized state and truncate the WAL, bounding replay
    /// cost on long-running installs.
    pub fn checkpoint(&self) -> Result<(), QueueError> {
        let mut wal = self.wal.lock();
        let state = self.state.lock();
        self.checkpointer.save(wal.write_seq(), &*state)?;
        wal.truncate()?;
        Ok(())
    }
}

fn wal_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
