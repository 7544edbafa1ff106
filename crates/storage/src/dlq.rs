// SPDX-License-Identifier: MIT

//! Dead-letter queue: a second, independent WAL + materialized table,
//! writable concurrently with the main queue.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use ssync_core::error::ErrorKind;
use ssync_core::model::{DeadLetterEntry, SyncJob};

use crate::checkpoint::Checkpointer;
use crate::wal::{Wal, WalError};

#[derive(Debug, Error)]
pub enum DlqError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Checkpoint(#[from] crate::checkpoint::CheckpointError),
    #[error("dead-letter entry {0} not found")]
    NotFound(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum DlqOp {
    Added(DeadLetterEntry),
    Removed { id: String },
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct MaterializedDlqState {
    entries: HashMap<String, DeadLetterEntry>,
}

impl MaterializedDlqState {
    fn apply(&mut self, op: &DlqOp) {
        match op {
            DlqOp::Added(entry) => {
                self.entries.insert(entry.id.clone(), entry.clone());
            }
            DlqOp::Removed { id } => {
                self.entries.remove(id);
            }
        }
    }
}

pub struct Dlq {
    wal: parking_lot::Mutex<Wal<DlqOp>>,
    state: parking_lot::Mutex<MaterializedDlqState>,
    checkpointer: Checkpointer,
}

impl Dlq {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, DlqError> {
        let data_dir = data_dir.as_ref();
        let checkpointer = Checkpointer::new(data_dir.join("dlq.snapshot.zst"));
        let (processed_seq, mut state) = match checkpointer.load::<MaterializedDlqState>()? {
            Some((seq, state)) => (seq, state),
            None => (0, MaterializedDlqState::default()),
        };

        let mut wal = Wal::open(data_dir.join("dlq.wal"), processed_seq)?;
        for entry in wal.entries_after(processed_seq)? {
            state.apply(&entry.entry);
            wal.mark_processed(entry.seq);
        }

        Ok(Self { wal: parking_lot::Mutex::new(wal), state: parking_lot::Mutex::new(state), checkpointer })
    }

    /// Record a job that exhausted retries or failed permanently.
    pub fn add(
        &self,
        source_job_id: &str,
        job_payload: SyncJob,
        error_kind: ErrorKind,
        error_message: impl Into<String>,
        stack_trace: Option<String>,
        failed_at: f64,
    ) -> Result<String, DlqError> {
        let mut wal = self.wal.lock();
        let id = format!("dlq-{}", wal.write_seq() + 1);
        let entry = DeadLetterEntry {
            id: id.clone(),
            source_job_id: source_job_id.to_string(),
            scene_id: job_payload.scene_id,
            job_payload,
            error_kind,
            error_message: error_message.into(),
            stack_trace,
            retry_count: 0,
            failed_at,
        };
        let op = DlqOp::Added(entry);
        wal.append(&op)?;
        wal.flush()?;
        drop(wal);
        self.state.lock().apply(&op);
        Ok(id)
    }

    pub fn list(&self) -> Vec<DeadLetterEntry> {
        let mut entries: Vec<DeadLetterEntry> = self.state.lock().entries.values().cloned().collect();
        entries.sort_by(|a, b| a.failed_at.partial_cmp(&b.failed_at).unwrap_or(std::cmp::Ordering::Equal));
        entries
    }

    pub fn get(&self, id: &str) -> Option<DeadLetterEntry> {
        self.state.lock().entries.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count by `error_kind` — used by the `outage_summary` admin mode.
    pub fn count_by_kind(&self, kind: ErrorKind) -> usize {
        self.state.lock().entries.values().filter(|e| e.error_kind == kind).count()
    }

    /// Remove a single entry, e.g. after it has been recovered.
    pub fn remove(&self, id: &str) -> Result<(), DlqError> {
        if !self.state.lock().entries.contains_key(id) {
            return Err(DlqError::NotFound(id.to_string()));
        }
        let op = DlqOp::Removed { id: id.to_string() };
        let mut wal = self.wal.lock();
        wal.append(&op)?;
        wal.flush()?;
        drop(wal);
        self.state.lock().apply(&op);
        Ok(())
    }

    /// Remove every entry. Used by the `purge_dlq` admin mode.
    pub fn purge(&self) -> Result<usize, DlqError> {
        let ids: Vec<String> = self.state.lock().entries.keys().cloned().collect();
        for id in &ids {
            self.remove(id)?;
        }
        Ok(ids.len())
    }

    /// Reconstruct a fresh `SyncJob` from a dead-letter entry's payload,
    /// with `retry_count` reset to zero, and remove the entry from the
    /// DLQ. The caller is responsible for re-enqueueing the returned job
    /// onto the main queue.
    pub fn recover(&self, id: &str) -> Result<SyncJob, DlqError> {
        let entry = self.get(id).ok_or_else(|| DlqError::NotFound(id.to_string()))?;
        let mut job = entry.job_payload;
        job.retry_count = 0;
        job.next_retry_at = 0.0;
        job.last_error_kind = None;
        self.remove(id)?;
        Ok(job)
    }

    /// All entries whose `error_kind` is `ServerDown` — the only kind
    /// where the failure was Target's fault rather than the job's, and
    /// therefore eligible for bulk recovery once Target comes back up.
    pub fn server_down_entries(&self) -> Vec<DeadLetterEntry> {
        self.list().into_iter().filter(|e| e.error_kind == ErrorKind::ServerDown).collect()
    }

    /// Remove entries older than `retention_days`, relative to `now`.
    /// Called on startup and on demand.
    pub fn prune_expired(&self, retention_days: f64, now: f64) -> Result<usize, DlqError> {
        let cutoff = now - retention_days * 86_400.0;
        let expired: Vec<String> =
            self.state.lock().entries.values().filter(|e| e.failed_at < cutoff).map(|e| e.id.clone()).collect();
        for id in &expired {
            self.remove(id)?;
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), retention_days, "pruned expired dead-letter entries");
        }
        Ok(expired.len())
    }

    pub fn checkpoint(&self) -> Result<(), DlqError> {
        let mut wal = self.wal.lock();
        let state = self.state.lock();
        self.checkpointer.save(wal.write_seq(), &*state)?;
        wal.truncate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "dlq_tests.rs"]
mod tests;
