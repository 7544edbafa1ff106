// SPDX-License-Identifier: MIT

//! Token-bucket rate limiter for graduated queue drain after a Target
//! outage recovers.

use std::collections::VecDeque;

use parking_lot::Mutex;

const CAPACITY: f64 = 1.0;
const BACKOFF_DURATION_SECS: f64 = 60.0;
const BACKOFF_RESTORE_ERROR_RATE: f64 = 0.1;

struct State {
    recovery_started_at: f64,
    tokens: f64,
    last_update: f64,
    rate_multiplier: f64,
    backoff_until: f64,
    results: VecDeque<(f64, bool)>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            recovery_started_at: 0.0,
            tokens: CAPACITY,
            last_update: 0.0,
            rate_multiplier: 1.0,
            backoff_until: 0.0,
            results: VecDeque::new(),
        }
    }
}

/// Graduated rate limiter ramping linearly from `initial_rate` to
/// `target_rate` jobs/sec over `ramp_duration` seconds, with adaptive
/// backoff when the rolling error rate spikes.
pub struct RecoveryRateLimiter {
    initial_rate: f64,
    target_rate: f64,
    ramp_duration: f64,
    error_threshold: f64,
    error_window: f64,
    state: Mutex<State>,
}

impl RecoveryRateLimiter {
    /// Defaults matching the original: ramp from 5 to 20 jobs/sec over
    /// 300s, 30% error-rate backoff trigger, 60s rolling window.
    pub fn new() -> Self {
        Self::with_config(5.0, 20.0, 300.0, 0.3, 60.0)
    }

    pub fn with_config(initial_rate: f64, target_rate: f64, ramp_duration: f64, error_threshold: f64, error_window: f64) -> Self {
        Self { initial_rate, target_rate, ramp_duration, error_threshold, error_window, state: Mutex::new(State::default()) }
    }

    pub fn is_in_recovery_period(&self, now: f64) -> bool {
        let state = self.state.lock();
        state.recovery_started_at != 0.0 && (now - state.recovery_started_at) < self.ramp_duration
    }

    /// Begin a graduated-drain window, resetting tokens/backoff/rolling
    /// error window together.
    pub fn start_recovery_period(&self, now: f64) {
        let mut state = self.state.lock();
        state.recovery_started_at = now;
        state.tokens = CAPACITY;
        state.last_update = now;
        state.rate_multiplier = 1.0;
        state.backoff_until = 0.0;
        state.results.clear();
        tracing::info!(
            initial_rate = self.initial_rate,
            target_rate = self.target_rate,
            ramp_duration = self.ramp_duration,
            "recovery period started"
        );
    }

    /// End the graduated-drain window, resetting all recovery-period
    /// state. Driven by the recovery scheduler's `clear_recovery_period`
    /// once `elapsed >= ramp_duration`.
    pub fn end_recovery_period(&self) {
        let mut state = self.state.lock();
        *state = State::default();
        tracing::info!("recovery period ended, returning to unlimited rate");
    }

    fn current_rate_locked(&self, state: &State, now: f64) -> f64 {
        if state.recovery_started_at == 0.0 || (now - state.recovery_started_at) >= self.ramp_duration {
            return self.target_rate * state.rate_multiplier;
        }
        let elapsed = now - state.recovery_started_at;
        let progress = elapsed / self.ramp_duration;
        let rate = self.initial_rate + (self.target_rate - self.initial_rate) * progress;
        rate * state.rate_multiplier
    }

    pub fn current_rate(&self, now: f64) -> f64 {
        self.current_rate_locked(&self.state.lock(), now)
    }

    /// `0.0` if the job may proceed now, otherwise the seconds to wait
    /// until the next token is available. Outside a recovery period,
    /// always `0.0` — the limiter only throttles graduated drain.
    pub fn should_wait(&self, now: f64) -> f64 {
        let mut state = self.state.lock();
        if state.recovery_started_at == 0.0 || (now - state.recovery_started_at) >= self.ramp_duration {
            return 0.0;
        }

        if state.last_update > 0.0 {
            let elapsed = now - state.last_update;
            let rate = self.current_rate_locked(&state, now);
            state.tokens = (state.tokens + elapsed * rate).min(CAPACITY);
        }
        state.last_update = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return 0.0;
        }

        let shortage = 1.0 - state.tokens;
        let rate = self.current_rate_locked(&state, now);
        if rate > 0.0 {
            shortage / rate
        } else {
            0.0
        }
    }

    /// Record a job outcome for rolling error-rate monitoring, pruning
    /// results outside `error_window` and adjusting `rate_multiplier`.
    pub fn record_result(&self, success: bool, now: f64) {
        let mut state = self.state.lock();
        state.results.push_back((now, success));
        let cutoff = now - self.error_window;
        while state.results.front().is_some_and(|(ts, _)| *ts < cutoff) {
            state.results.pop_front();
        }
        self.maybe_adjust_rate(&mut state, now);
    }

    fn maybe_adjust_rate(&self, state: &mut State, now: f64) {
        if state.recovery_started_at == 0.0 || (now - state.recovery_started_at) >= self.ramp_duration {
            return;
        }
        let err_rate = Self::error_rate_locked(state, now, self.error_window);

        if err_rate > self.error_threshold && state.rate_multiplier == 1.0 {
            state.rate_multiplier = 0.5;
            state.backoff_until = now + BACKOFF_DURATION_SECS;
            tracing::warn!(error_rate = err_rate, threshold = self.error_threshold, "reducing drain rate by 50% for 60s");
        } else if err_rate < BACKOFF_RESTORE_ERROR_RATE && state.rate_multiplier < 1.0 && now >= state.backoff_until {
            state.rate_multiplier = 1.0;
            tracing::info!(error_rate = err_rate, "error rate recovered, restoring full drain rate");
        }
    }

    fn error_rate_locked(state: &State, now: f64, window: f64) -> f64 {
        let cutoff = now - window;
        let recent: Vec<&(f64, bool)> = state.results.iter().filter(|(ts, _)| *ts >= cutoff).collect();
        if recent.is_empty() {
            return 0.0;
        }
        let failures = recent.iter().filter(|(_, success)| !success).count();
        failures as f64 / recent.len() as f64
    }

    pub fn error_rate(&self, now: f64) -> f64 {
        Self::error_rate_locked(&self.state.lock(), now, self.error_window)
    }
}

impl Default for RecoveryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "rate_limiter_tests.rs"]
mod tests;
