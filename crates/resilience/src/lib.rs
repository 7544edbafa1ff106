// SPDX-License-Identifier: MIT

//! ssync-resilience: circuit breaker, recovery scheduler, outage history,
//! and graduated-drain rate limiter.

pub mod circuit_breaker;
pub mod outage_history;
pub mod rate_limiter;
pub mod recovery;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use outage_history::{availability, mtbf, mttr, OutageHistory, OutageRecord};
pub use rate_limiter::RecoveryRateLimiter;
pub use recovery::{RecoveryScheduler, RecoveryState};
