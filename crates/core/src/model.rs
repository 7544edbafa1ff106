// SPDX-License-Identifier: MIT

//! Core data model: `SyncJob`, `QueueItem` status, DLQ entries, stats,
//! gap results, and match results.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ErrorKind;

/// Kind of update a `SyncJob` carries. `Metadata` is the only kind in
/// scope today; the enum stays open for future event kinds (e.g. a
/// dedicated `Image` update) without changing the queue schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    Metadata,
}

/// Payload carried by a queued sync job.
///
/// Identity is `scene_id`. Every retry rewrites the same logical job
/// with a new `retry_count`, `next_retry_at`, and `last_error_kind` —
/// retry state is data, not process state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    pub scene_id: u64,
    pub update_type: UpdateType,
    pub data: HashMap<String, serde_json::Value>,
    pub enqueued_at: f64,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub next_retry_at: f64,
    #[serde(default)]
    pub last_error_kind: Option<ErrorKind>,
}

impl SyncJob {
    pub fn new(scene_id: u64, update_type: UpdateType, data: HashMap<String, serde_json::Value>, now: f64) -> Self {
        Self { scene_id, update_type, data, enqueued_at: now, retry_count: 0, next_retry_at: 0.0, last_error_kind: None }
    }

    /// `job_key` identity used for active-scene dedup: `"scene:<id>"`.
    pub fn job_key(&self) -> String {
        job_key_for(self.scene_id)
    }

    /// Rewrite this job's retry metadata in place for the next attempt.
    pub fn prepare_for_retry(&mut self, kind: ErrorKind, next_retry_at: f64) {
        self.retry_count += 1;
        self.next_retry_at = next_retry_at;
        self.last_error_kind = Some(kind);
    }
}

pub fn job_key_for(scene_id: u64) -> String {
    format!("scene:{scene_id}")
}

/// Persisted status of a queue row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemStatus {
    Inited,
    Ready,
    InProgress,
    Completed,
    Failed,
}

/// A dead-letter entry: a job that exhausted retries or failed permanently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub id: String,
    pub source_job_id: String,
    pub scene_id: u64,
    pub job_payload: SyncJob,
    pub error_kind: ErrorKind,
    pub error_message: String,
    pub stack_trace: Option<String>,
    pub retry_count: u32,
    pub failed_at: f64,
}

/// Cumulative counters merged (summed) into any existing stats file on save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    pub jobs_processed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_to_dlq: u64,
    pub total_processing_time: f64,
    pub errors_by_kind: HashMap<ErrorKind, u64>,
    pub high_confidence_matches: u64,
    pub low_confidence_matches: u64,
    pub session_start: f64,
}

impl SyncStats {
    pub fn new(session_start: f64) -> Self {
        Self { session_start, ..Default::default() }
    }

    pub fn record_success(&mut self, elapsed_secs: f64, confidence: MatchConfidence) {
        self.jobs_processed += 1;
        self.jobs_succeeded += 1;
        self.total_processing_time += elapsed_secs;
        match confidence {
            MatchConfidence::High => self.high_confidence_matches += 1,
            MatchConfidence::Low => self.low_confidence_matches += 1,
        }
    }

    pub fn record_failure(&mut self, kind: ErrorKind, elapsed_secs: f64, to_dlq: bool) {
        self.jobs_processed += 1;
        self.jobs_failed += 1;
        self.total_processing_time += elapsed_secs;
        *self.errors_by_kind.entry(kind).or_insert(0) += 1;
        if to_dlq {
            self.jobs_to_dlq += 1;
        }
    }

    /// Sum `other` into `self`, preserving `self.session_start` (the
    /// earlier of the two, matching "merged into any existing stats
    /// file on save; original session_start preserved").
    pub fn merge(&mut self, other: &SyncStats) {
        self.jobs_processed += other.jobs_processed;
        self.jobs_succeeded += other.jobs_succeeded;
        self.jobs_failed += other.jobs_failed;
        self.jobs_to_dlq += other.jobs_to_dlq;
        self.total_processing_time += other.total_processing_time;
        self.high_confidence_matches += other.high_confidence_matches;
        self.low_confidence_matches += other.low_confidence_matches;
        for (kind, count) in &other.errors_by_kind {
            *self.errors_by_kind.entry(*kind).or_insert(0) += count;
        }
    }
}

/// Kind of drift a reconciliation detector found between Source and Target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    EmptyMetadata,
    StaleSync,
    MissingFromTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapResult {
    pub scene_id: u64,
    pub kind: GapKind,
    pub scene_snapshot: SceneSnapshot,
    pub reason: String,
}

/// Confidence of a matcher lookup. `None` is not a variant here — it is
/// encoded by the matcher returning `Err(SyncError::NotFound)` so the
/// caller routes it through the normal retry ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    High,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub confidence: MatchConfidence,
    pub chosen_item: Option<TargetItemRef>,
    pub candidates: Vec<TargetItemRef>,
}

/// A reference to a matched item in the Target library, enough for the
/// writer to issue edit/upload calls without re-resolving it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetItemRef {
    pub item_id: String,
    pub library: String,
    pub file_names: Vec<String>,
}

/// A typed view of the Source fields the core actually reads, pulled out
/// of the raw GraphQL scene payload before sanitisation/matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub id: u64,
    pub title: Option<String>,
    pub details: Option<String>,
    pub date: Option<String>,
    pub rating100: Option<u8>,
    pub studio: Option<String>,
    #[serde(default)]
    pub performers: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub path: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub external_ids: Vec<String>,
}

impl SceneSnapshot {
    /// Meaningful metadata is present iff at least one of
    /// `{studio, performers, tags, details, date}` is non-empty. Rating
    /// alone never qualifies.
    pub fn has_meaningful_metadata(&self) -> bool {
        self.studio.as_ref().is_some_and(|s| !s.is_empty())
            || !self.performers.is_empty()
            || !self.tags.is_empty()
            || self.details.as_ref().is_some_and(|s| !s.is_empty())
            || self.date.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Whether this event carries an identification payload (an external
    /// id array), which is always processed even with otherwise-empty
    /// input.
    pub fn is_identification(&self) -> bool {
        !self.external_ids.is_empty()
    }
}
