// SPDX-License-Identifier: MIT

//! Clock abstraction for testable time handling.
//!
//! Every component that measures elapsed time (backoff, circuit breaker,
//! recovery scheduler, rate limiter) takes a `Clock` rather than calling
//! `SystemTime::now()` directly, so tests can advance time deterministically
//! instead of sleeping.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time as a Unix timestamp in seconds.
pub trait Clock: Clone + Send + Sync {
    fn now_secs(&self) -> f64;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<f64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { current: Arc::new(Mutex::new(1_000_000.0)) }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration.as_secs_f64();
    }

    /// Set the clock to a specific Unix timestamp in seconds.
    pub fn set(&self, now_secs: f64) {
        *self.current.lock() = now_secs;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now_secs(&self) -> f64 {
        *self.current.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
