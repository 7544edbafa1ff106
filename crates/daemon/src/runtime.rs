// SPDX-License-Identifier: MIT

//! Wires one invocation's storage, resilience, and adapter handles together.
//! Built once per process in `main`, then threaded by reference through
//! every mode handler and the worker.

use std::sync::Arc;

use ssync_core::clock::{Clock, SystemClock};
use ssync_core::config::PluginConfig;
use ssync_resilience::{CircuitBreaker, OutageHistory, RecoveryRateLimiter, RecoveryScheduler};
use ssync_storage::{Dlq, DlqError, Queue, QueueError, StatsStore, SyncTimestampStore};
use ssync_sync::adapters::SourceApi;
use ssync_sync::reconciliation::AutoReconciliationScheduler;
use ssync_sync::{FieldSyncToggles, TargetApi, WriterPolicy};

use crate::protocol::ServerConnection;
use crate::source_client::HttpSourceApi;
use crate::target_client::HttpTargetApi;
use crate::worker::WorkerConfig;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Dlq(#[from] DlqError),
}

/// Everything one invocation needs: durable state, resilience state, and
/// the outbound Source/Target adapters. Generic over `Clock` so tests can
/// swap in a `FakeClock`; real invocations use the default `SystemClock`.
pub struct Runtime<C: Clock = SystemClock> {
    pub queue: Queue,
    pub dlq: Dlq,
    pub circuit: CircuitBreaker<C>,
    pub recovery: RecoveryScheduler,
    pub rate_limiter: RecoveryRateLimiter,
    pub sync_timestamps: SyncTimestampStore,
    pub outage_history: OutageHistory,
    pub reconcile_scheduler: AutoReconciliationScheduler,
    pub stats_store: StatsStore,
    pub config: PluginConfig,
    pub clock: C,
    pub target: Arc<dyn TargetApi>,
    pub source: Arc<dyn SourceApi>,
}

impl Runtime<SystemClock> {
    /// Open every durable store under `data_dir`, rehydrate the rate
    /// limiter's ramp window if one was already in progress, and build
    /// the real HTTP Source/Target adapters from `server_connection`.
    pub fn open(
        data_dir: impl AsRef<std::path::Path>,
        config: PluginConfig,
        server_connection: &ServerConnection,
    ) -> Result<Self, RuntimeError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).ok();

        let clock = SystemClock;
        let queue = Queue::open(data_dir)?;
        let dlq = Dlq::open(data_dir)?;
        let outage_history = OutageHistory::open(data_dir);
        let circuit = CircuitBreaker::new(clock.clone(), Some(data_dir.join("circuit_breaker.json")), None);
        let recovery = RecoveryScheduler::new(data_dir);
        let rate_limiter = RecoveryRateLimiter::new();
        let sync_timestamps = SyncTimestampStore::open(data_dir);
        let reconcile_scheduler = AutoReconciliationScheduler::open(data_dir);
        let stats_store = StatsStore::open(data_dir);

        // The rate limiter holds no state of its own across invocations;
        // a recovery period already in progress is rehydrated from the
        // recovery scheduler's persisted `recovery_started_at`.
        let recovery_state = recovery.load_state();
        if recovery_state.recovery_started_at != 0.0 {
            rate_limiter.start_recovery_period(recovery_state.recovery_started_at);
        }

        let connect_timeout = std::time::Duration::from_secs_f64(config.connect_timeout_secs);
        let read_timeout = std::time::Duration::from_secs_f64(config.read_timeout_secs);

        let source: Arc<dyn SourceApi> = Arc::new(HttpSourceApi::new(
            server_connection.base_url(),
            server_connection.api_key.clone(),
            connect_timeout,
            read_timeout,
        ));
        let target: Arc<dyn TargetApi> =
            Arc::new(HttpTargetApi::new(config.target_url.clone(), config.target_token.clone(), connect_timeout, read_timeout));

        Ok(Self {
            queue,
            dlq,
            circuit,
            recovery,
            rate_limiter,
            sync_timestamps,
            outage_history,
            reconcile_scheduler,
            stats_store,
            config,
            clock,
            target,
            source,
        })
    }
}

impl<C: Clock> Runtime<C> {
    /// Worker policy knobs derived from `self.config`.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            library_list: self.config.library_list.clone(),
            strict_matching: self.config.strict_matching,
            writer_policy: WriterPolicy {
                preserve_target_edits: self.config.preserve_target_edits,
                toggles: FieldSyncToggles::default(),
            },
            tag_limit: self.config.tag_limit,
            dlq_summary_interval: 10,
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
