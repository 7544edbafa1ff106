// SPDX-License-Identifier: MIT

//! The job-processing worker loop: circuit check, recovery probe timing,
//! dequeue, rate-limit wait, process, classify, ack | retry | DLQ.

use std::collections::HashMap;
use std::time::Duration;

use rand::thread_rng;

use ssync_core::backoff::policy_for;
use ssync_core::clock::Clock;
use ssync_core::error::ErrorKind;
use ssync_core::model::{MatchConfidence, SyncJob, SyncStats};
use ssync_core::SyncError;
use ssync_resilience::{CircuitBreaker, CircuitState, OutageHistory, RecoveryRateLimiter, RecoveryScheduler};
use ssync_storage::{Dlq, Queue, SyncTimestampStore};
use ssync_sync::adapters::{LibraryRef, TargetApi};
use ssync_sync::sanitize::{self, ValidationIssue};
use ssync_sync::{Matcher, TargetWriter, WriterPolicy};

use crate::dedup::HookDedup;

/// Worker-level policy knobs resolved from `PluginConfig`.
pub struct WorkerConfig {
    pub library_list: Vec<String>,
    pub strict_matching: bool,
    pub writer_policy: WriterPolicy,
    pub tag_limit: u32,
    /// How many ack cycles between DLQ summary logs. Default 10.
    pub dlq_summary_interval: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            library_list: Vec::new(),
            strict_matching: false,
            writer_policy: WriterPolicy::default(),
            tag_limit: 100,
            dlq_summary_interval: 10,
        }
    }
}

/// Outcome of a single `run_cycle` call, reported back to the draining
/// caller so it knows whether to keep looping or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Circuit is open; no Target calls were attempted.
    CircuitOpen,
    /// No pending job was ready to process this cycle.
    Idle,
    /// A job reached a terminal or requeued state.
    Processed { scene_id: u64, succeeded: bool },
}

pub struct Worker<'a, C: Clock> {
    queue: &'a Queue,
    dlq: &'a Dlq,
    circuit: &'a CircuitBreaker<C>,
    recovery: &'a RecoveryScheduler,
    rate_limiter: &'a RecoveryRateLimiter,
    sync_timestamps: &'a SyncTimestampStore,
    outage_history: Option<&'a OutageHistory>,
    target: &'a dyn TargetApi,
    clock: C,
    config: WorkerConfig,
    ack_cycles: parking_lot::Mutex<u64>,
}

impl<'a, C: Clock> Worker<'a, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: &'a Queue,
        dlq: &'a Dlq,
        circuit: &'a CircuitBreaker<C>,
        recovery: &'a RecoveryScheduler,
        rate_limiter: &'a RecoveryRateLimiter,
        sync_timestamps: &'a SyncTimestampStore,
        outage_history: Option<&'a OutageHistory>,
        target: &'a dyn TargetApi,
        clock: C,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            dlq,
            circuit,
            recovery,
            rate_limiter,
            sync_timestamps,
            outage_history,
            target,
            clock,
            config,
            ack_cycles: parking_lot::Mutex::new(0),
        }
    }

    /// Probe Target if a recovery check is due, and keep the rate
    /// limiter's ramp window aligned with the circuit's transitions.
    pub async fn maybe_probe_recovery(&self, now: f64) {
        let before = self.circuit.state();
        if !self.recovery.should_check_recovery(before, now) {
            return;
        }

        let healthy = self.target.health_check().await.is_ok();
        let stats = self.queue.stats();
        let jobs_affected = (stats.pending + stats.in_progress) as u64;
        self.recovery.record_health_check(healthy, self.circuit, now, self.outage_history, jobs_affected);

        let after = self.circuit.state();
        if before != CircuitState::Closed && after == CircuitState::Closed {
            self.rate_limiter.start_recovery_period(now);
        }
    }

    /// Drop the rate limiter's ramp once its window has elapsed, mirroring
    /// the recovery scheduler's own `clear_recovery_period`.
    pub fn maybe_clear_recovery_ramp(&self, now: f64) {
        if !self.rate_limiter.is_in_recovery_period(now) {
            self.rate_limiter.end_recovery_period();
            self.recovery.clear_recovery_period();
        }
    }

    /// Run exactly one iteration of the worker loop.
    pub async fn run_cycle(&self, session: &mut SyncStats, dedup: &HookDedup) -> Result<CycleOutcome, WorkerError> {
        let now = self.clock.now_secs();
        if !self.circuit.can_execute() {
            return Ok(CycleOutcome::CircuitOpen);
        }

        self.maybe_probe_recovery(now).await;
        self.maybe_clear_recovery_ramp(now);

        // A probe that failed in HalfOpen may have just reopened the
        // breaker; re-check before touching the queue.
        if !self.circuit.can_execute() {
            return Ok(CycleOutcome::CircuitOpen);
        }

        let Some(item) = self.queue.get_pending(now)? else {
            return Ok(CycleOutcome::Idle);
        };

        let wait = self.rate_limiter.should_wait(now);
        if wait > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(wait)).await;
        }

        let scene_id = item.payload.scene_id;
        let started = self.clock.now_secs();

        match self.process(&item.payload).await {
            Ok(confidence) => {
                dedup.unmark(scene_id);
                self.queue.ack(&item.id)?;
                self.circuit.record_success();
                self.rate_limiter.record_result(true, self.clock.now_secs());
                let elapsed = self.clock.now_secs() - started;
                session.record_success(elapsed, confidence);
                self.sync_timestamps.record(scene_id, self.clock.now_secs());
                self.note_ack_cycle();
                Ok(CycleOutcome::Processed { scene_id, succeeded: true })
            }
            Err(err) => {
                dedup.unmark(scene_id);
                let kind = err.kind();
                self.rate_limiter.record_result(false, self.clock.now_secs());
                let elapsed = self.clock.now_secs() - started;

                if kind == ErrorKind::Permanent {
                    self.queue.ack_failed(&item.id)?;
                    self.dlq.add(&item.id, item.payload.clone(), kind, err.message(), None, self.clock.now_secs())?;
                    session.record_failure(kind, elapsed, true);
                } else {
                    self.circuit.record_failure();
                    let mut job = item.payload.clone();
                    let policy = policy_for(kind);
                    let delay = policy.calculate_delay(job.retry_count, &mut thread_rng());
                    job.prepare_for_retry(kind, self.clock.now_secs() + delay.as_secs_f64());

                    if job.retry_count >= policy.max_attempts {
                        self.queue.ack_failed(&item.id)?;
                        self.dlq.add(&item.id, job, kind, err.message(), None, self.clock.now_secs())?;
                        session.record_failure(kind, elapsed, true);
                    } else {
                        self.queue.requeue_with_metadata(&item.id, job)?;
                        session.record_failure(kind, elapsed, false);
                    }
                }

                self.note_ack_cycle();
                Ok(CycleOutcome::Processed { scene_id, succeeded: false })
            }
        }
    }

    fn note_ack_cycle(&self) {
        let mut cycles = self.ack_cycles.lock();
        *cycles += 1;
        if *cycles % self.config.dlq_summary_interval == 0 {
            let entries = self.dlq.list();
            tracing::info!(dlq_count = entries.len(), "dead-letter queue summary");
            for entry in entries.iter().take(5) {
                tracing::info!(scene_id = entry.scene_id, error_kind = ?entry.error_kind, "recent dlq entry");
            }
        }
    }

    /// (a) path presence check, (b) library resolution, (c) matcher
    /// lookup, (d) metadata write, (e) return confidence for stats.
    async fn process(&self, job: &SyncJob) -> Result<MatchConfidence, SyncError> {
        let path = job
            .data
            .get("path")
            .and_then(|v| v.as_str())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| SyncError::permanent("job has no source path"))?;

        let issues = sanitize::validate_scene_data(job.scene_id, &job.data, self.config.tag_limit as usize);
        if let Some(ValidationIssue::Critical(reason)) = issues.iter().find(|i| matches!(i, ValidationIssue::Critical(_))) {
            return Err(SyncError::permanent(reason.clone()));
        }

        let libraries = self.resolve_libraries().await?;
        if libraries.is_empty() {
            return Err(SyncError::permanent("no target libraries configured or found"));
        }

        let matcher = Matcher::new(self.target);
        let mut chosen_ref = None;
        let mut confidence = MatchConfidence::High;
        for library in &libraries {
            match matcher.find(library, path).await {
                Ok(result) => {
                    confidence = result.confidence;
                    match (result.confidence, result.chosen_item, result.candidates.first().cloned()) {
                        (MatchConfidence::High, Some(item), _) => {
                            chosen_ref = Some(item);
                            break;
                        }
                        (MatchConfidence::Low, _, Some(first)) => {
                            if self.config.strict_matching {
                                return Err(SyncError::permanent("ambiguous match with strict_matching enabled"));
                            }
                            chosen_ref = Some(first);
                            break;
                        }
                        _ => continue,
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err),
            }
        }

        let Some(chosen_ref) = chosen_ref else {
            return Err(SyncError::not_found(format!("no target item found for path: {path}")));
        };

        let target_item = self.target.get_item(&chosen_ref.item_id).await?;
        let sanitized = self.sanitize_job_data(&job.data);

        let writer = TargetWriter::new(self.target, self.config.writer_policy);
        let result = writer.sync(&target_item, &sanitized).await?;
        for warning in &result.warnings {
            tracing::warn!(scene_id = job.scene_id, warning, "non-critical field sync failure");
        }
        for issue in &result.validation_issues {
            tracing::debug!(scene_id = job.scene_id, issue, "post-write validation mismatch");
        }

        Ok(confidence)
    }

    async fn resolve_libraries(&self) -> Result<Vec<LibraryRef>, SyncError> {
        if self.config.library_list.is_empty() {
            return self.target.sections().await;
        }

        let mut libraries = Vec::with_capacity(self.config.library_list.len());
        for name in &self.config.library_list {
            match self.target.section(name).await? {
                Some(library) => libraries.push(library),
                None => tracing::warn!(library = name, "configured library not found on target"),
            }
        }
        Ok(libraries)
    }

    fn sanitize_job_data(&self, data: &HashMap<String, serde_json::Value>) -> HashMap<String, serde_json::Value> {
        let mut out = HashMap::new();

        sanitize_scalar(data, &mut out, "title", sanitize::TITLE_MAX);
        sanitize_scalar(data, &mut out, "studio", sanitize::STUDIO_MAX);
        sanitize_scalar(data, &mut out, "summary", sanitize::SUMMARY_MAX);
        sanitize_scalar(data, &mut out, "date", sanitize::NAME_MAX);

        if let Some(rating) = data.get("rating100") {
            out.insert("rating100".to_string(), rating.clone());
        }

        for field in ["performers", "tags"] {
            if let Some(values) = data.get(field).and_then(|v| v.as_array()) {
                let strings: Vec<String> = values.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
                let limit = if field == "tags" { self.config.tag_limit as usize } else { sanitize::PERFORMERS_MAX };
                let (cleaned, _issues) = sanitize::sanitize_list_field(&strings, limit, field);
                out.insert(field.to_string(), serde_json::json!(cleaned.unwrap_or_default()));
            }
        }

        for field in ["poster_url", "background_url", "path"] {
            if let Some(value) = data.get(field) {
                out.insert(field.to_string(), value.clone());
            }
        }

        out
    }
}

/// Copy a scalar job-data field into `out`, sanitizing a present string and
/// passing a present `null` through unchanged so the writer can still tell
/// "absent ⇒ preserve" from "present-null ⇒ clear" (see
/// `ssync_sync::writer::TargetWriter::build_scalar_edits`). A key that
/// isn't in `data` at all is left out of `out` entirely.
fn sanitize_scalar(data: &HashMap<String, serde_json::Value>, out: &mut HashMap<String, serde_json::Value>, field: &str, max_len: usize) {
    let Some(value) = data.get(field) else { return };
    let sanitized = match value {
        serde_json::Value::String(s) => serde_json::Value::String(sanitize::sanitize_field(s, max_len)),
        serde_json::Value::Null => serde_json::Value::Null,
        other => other.clone(),
    };
    out.insert(field.to_string(), sanitized);
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Queue(#[from] ssync_storage::QueueError),
    #[error(transparent)]
    Dlq(#[from] ssync_storage::DlqError),
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
