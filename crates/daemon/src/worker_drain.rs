// SPDX-License-Identifier: MIT

//! Bounded-time queue drain: approximates a long-lived worker loop within
//! one process-per-invocation run by cycling the worker until it goes
//! idle twice in a row, the circuit opens, or `max_wait` elapses.

use std::time::Duration;

use ssync_core::clock::Clock;
use ssync_core::model::SyncStats;

use crate::dedup::HookDedup;
use crate::runtime::Runtime;
use crate::worker::{CycleOutcome, Worker};
use crate::DispatchError;

/// Drain the queue with a fresh, process-local dedup set.
pub async fn drain<C: Clock>(rt: &Runtime<C>, max_wait: Duration) -> Result<(), DispatchError> {
    drain_with_dedup(rt, max_wait, &HookDedup::new()).await
}

/// Drain the queue, sharing `dedup` with the hook fast path that may have
/// marked scenes earlier in the same invocation.
pub async fn drain_with_dedup<C: Clock>(rt: &Runtime<C>, max_wait: Duration, dedup: &HookDedup) -> Result<(), DispatchError> {
    let worker = Worker::new(
        &rt.queue,
        &rt.dlq,
        &rt.circuit,
        &rt.recovery,
        &rt.rate_limiter,
        &rt.sync_timestamps,
        Some(&rt.outage_history),
        rt.target.as_ref(),
        rt.clock.clone(),
        rt.worker_config(),
    );

    let mut session = SyncStats::new(rt.clock.now_secs());
    let deadline = tokio::time::Instant::now() + max_wait;
    let mut consecutive_idle = 0u32;

    loop {
        if tokio::time::Instant::now() >= deadline {
            break;
        }

        match worker.run_cycle(&mut session, dedup).await? {
            CycleOutcome::CircuitOpen => break,
            CycleOutcome::Idle => {
                consecutive_idle += 1;
                if consecutive_idle >= 2 {
                    break;
                }
            }
            CycleOutcome::Processed { .. } => {
                consecutive_idle = 0;
            }
        }
    }

    rt.stats_store.flush(&session);
    Ok(())
}

#[cfg(test)]
#[path = "worker_drain_tests.rs"]
mod tests;
