// SPDX-License-Identifier: MIT

//! Full-jitter exponential backoff with per-kind parameters.

use rand::Rng;
use std::time::Duration;

use crate::error::ErrorKind;

/// Backoff parameters for one error kind.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl BackoffPolicy {
    /// `Transient`/`Permanent`/`ServerDown` ladder: base 5s, cap 80s, 5 attempts.
    pub const STANDARD: BackoffPolicy =
        BackoffPolicy { base: Duration::from_secs(5), cap: Duration::from_secs(80), max_attempts: 5 };

    /// `NotFound` ladder: wider, since the item may only surface after a
    /// library scan. Base 30s, cap 600s, 12 attempts.
    pub const NOT_FOUND: BackoffPolicy =
        BackoffPolicy { base: Duration::from_secs(30), cap: Duration::from_secs(600), max_attempts: 12 };

    /// Full-jitter delay for the given (zero-indexed) attempt number:
    /// `uniform(0, min(cap, base * 2^attempt))`.
    pub fn calculate_delay(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let exp = 2f64.powi(attempt.min(32) as i32);
        let unclamped = self.base.as_secs_f64() * exp;
        let upper = unclamped.min(self.cap.as_secs_f64());
        let jittered = rng.gen_range(0.0..=upper.max(0.0));
        Duration::from_secs_f64(jittered)
    }

    /// Upper envelope for `calculate_delay`, used by property tests:
    /// `min(cap, base * 2^attempt)`.
    pub fn upper_envelope(&self, attempt: u32) -> Duration {
        let exp = 2f64.powi(attempt.min(32) as i32);
        let unclamped = self.base.as_secs_f64() * exp;
        Duration::from_secs_f64(unclamped.min(self.cap.as_secs_f64()))
    }
}

/// The classifier feeds straight into backoff params so `NotFound` jobs
/// get the wider ladder without the worker special-casing them elsewhere.
pub fn policy_for(kind: ErrorKind) -> BackoffPolicy {
    match kind {
        ErrorKind::NotFound => BackoffPolicy::NOT_FOUND,
        ErrorKind::Transient | ErrorKind::Permanent | ErrorKind::ServerDown => BackoffPolicy::STANDARD,
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
