// SPDX-License-Identifier: MIT

//! Check-on-invocation recovery scheduler: since this plugin runs
//! per-event rather than as a long-lived daemon, recovery detection is
//! driven by persisted state rather than a background timer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ssync_core::Clock;
use ssync_storage::atomic_json::{load_or_default, save_atomic};

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::outage_history::OutageHistory;

const RECOVERY_CHECK_INTERVAL_SECS: f64 = 5.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecoveryState {
    pub last_check_time: f64,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
    pub last_recovery_time: f64,
    pub recovery_count: u64,
    pub recovery_started_at: f64,
}

pub struct RecoveryScheduler {
    path: PathBuf,
}

impl RecoveryScheduler {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { path: data_dir.as_ref().join("recovery_state.json") }
    }

    pub fn load_state(&self) -> RecoveryState {
        load_or_default(&self.path)
    }

    pub fn save_state(&self, state: &RecoveryState) {
        if let Err(e) = save_atomic(&self.path, state) {
            tracing::debug!(error = %e, "failed to save recovery state");
        }
    }

    /// Whether a health probe is due: never while `Closed`; otherwise
    /// every `RECOVERY_CHECK_INTERVAL_SECS` during an outage.
    pub fn should_check_recovery(&self, circuit_state: CircuitState, now: f64) -> bool {
        if circuit_state == CircuitState::Closed {
            return false;
        }
        let state = self.load_state();
        (now - state.last_check_time) >= RECOVERY_CHECK_INTERVAL_SECS
    }

    /// Record a health-check result and drive the circuit breaker's
    /// `HalfOpen` recovery attempt. On `Closed` transition, starts a
    /// fresh recovery-period clock for the rate limiter to ramp against,
    /// and, if `outage_history` is attached, closes out the ongoing outage
    /// record with `jobs_affected`.
    pub fn record_health_check<C: Clock>(
        &self,
        success: bool,
        circuit_breaker: &CircuitBreaker<C>,
        now: f64,
        outage_history: Option<&OutageHistory>,
        jobs_affected: u64,
    ) {
        let mut state = self.load_state();
        state.last_check_time = now;

        if success {
            state.consecutive_successes += 1;
            state.consecutive_failures = 0;

            if circuit_breaker.state() == CircuitState::HalfOpen {
                circuit_breaker.record_success();
                if circuit_breaker.state() == CircuitState::Closed {
                    state.recovery_count += 1;
                    state.last_recovery_time = now;
                    state.recovery_started_at = now;
                    state.consecutive_successes = 0;
                    if let Some(history) = outage_history {
                        history.record_outage_end(now, jobs_affected);
                    }
                    tracing::info!(recovery_count = state.recovery_count, "recovery detected, target is back online");
                }
            } else if circuit_breaker.state() == CircuitState::Open {
                tracing::debug!("health check passed but circuit still open, awaiting recovery_timeout");
            }
        } else {
            state.consecutive_failures += 1;
            state.consecutive_successes = 0;

            if circuit_breaker.state() == CircuitState::HalfOpen {
                circuit_breaker.record_failure();
            }
            tracing::debug!(circuit_state = ?circuit_breaker.state(), "health check failed");
        }

        self.save_state(&state);
    }

    /// Clear recovery-period state once the graduated ramp completes.
    pub fn clear_recovery_period(&self) {
        let mut state = self.load_state();
        state.recovery_started_at = 0.0;
        self.save_state(&state);
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
