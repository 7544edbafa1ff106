// SPDX-License-Identifier: MIT

//! Three-state circuit breaker guarding Target API calls during outages.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use ssync_core::Clock;
use ssync_storage::atomic_json::{load_or_default, save_atomic_locked};

use crate::outage_history::OutageHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<f64>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self { state: CircuitState::Closed, failure_count: 0, success_count: 0, opened_at: None }
    }
}

/// Tracks consecutive failures and blocks execution once a threshold is
/// reached; allows one recovery probe after `recovery_timeout` elapses.
pub struct CircuitBreaker<C: Clock> {
    failure_threshold: u32,
    recovery_timeout: f64,
    success_threshold: u32,
    state_path: Option<PathBuf>,
    outage_history: Option<Arc<OutageHistory>>,
    clock: C,
    inner: Mutex<PersistedState>,
}

impl<C: Clock> CircuitBreaker<C> {
    /// Defaults matching the original: 5 consecutive failures to open,
    /// 60s recovery timeout, 1 success to close.
    pub fn new(clock: C, state_path: Option<PathBuf>, outage_history: Option<Arc<OutageHistory>>) -> Self {
        Self::with_config(clock, 5, 60.0, 1, state_path, outage_history)
    }

    pub fn with_config(
        clock: C,
        failure_threshold: u32,
        recovery_timeout: f64,
        success_threshold: u32,
        state_path: Option<PathBuf>,
        outage_history: Option<Arc<OutageHistory>>,
    ) -> Self {
        let inner = match &state_path {
            Some(path) => load_or_default::<PersistedState>(path),
            None => PersistedState::default(),
        };
        Self {
            failure_threshold,
            recovery_timeout,
            success_threshold,
            state_path,
            outage_history,
            clock,
            inner: Mutex::new(inner),
        }
    }

    fn save(&self, state: &PersistedState) {
        if let Some(path) = &self.state_path {
            if let Err(e) = save_atomic_locked(path, state) {
                tracing::debug!(error = %e, "failed to persist circuit breaker state");
            }
        }
    }

    /// Current state, performing the lazy `Open -> HalfOpen` transition
    /// once `recovery_timeout` has elapsed since `opened_at`.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::Open {
            if let Some(opened_at) = inner.opened_at {
                if self.clock.now_secs() - opened_at >= self.recovery_timeout {
                    inner.state = CircuitState::HalfOpen;
                    inner.success_count = 0;
                    tracing::info!(recovery_timeout = self.recovery_timeout, "circuit breaker entering half_open state");
                    self.save(&inner);
                }
            }
        }
        inner.state
    }

    pub fn can_execute(&self) -> bool {
        self.state() != CircuitState::Open
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.success_count += 1;
            if inner.success_count >= self.success_threshold {
                self.close(&mut inner);
            } else {
                self.save(&inner);
            }
        } else {
            inner.failure_count = 0;
            self.save(&inner);
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen {
            self.open(&mut inner);
        } else {
            inner.failure_count += 1;
            if inner.failure_count >= self.failure_threshold {
                self.open(&mut inner);
            } else {
                self.save(&inner);
            }
        }
    }

    /// Force the circuit back to `Closed`, e.g. for manual recovery.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        self.close(&mut inner);
    }

    fn open(&self, inner: &mut PersistedState) {
        inner.state = CircuitState::Open;
        let now = self.clock.now_secs();
        inner.opened_at = Some(now);
        inner.failure_count = 0;
        inner.success_count = 0;
        tracing::warn!(failure_threshold = self.failure_threshold, "circuit breaker opened");
        self.save(inner);
        if let Some(history) = &self.outage_history {
            history.record_outage_start(now);
        }
    }

    fn close(&self, inner: &mut PersistedState) {
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
        inner.failure_count = 0;
        inner.success_count = 0;
        tracing::info!("circuit breaker closed");
        self.save(inner);
    }
}

#[cfg(test)]
#[path = "circuit_breaker_tests.rs"]
mod tests;
