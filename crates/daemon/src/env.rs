// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve the plugin data directory: `SSYNC_STATE_DIR` > `XDG_STATE_HOME/ssync` >
/// `~/.local/state/ssync`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SSYNC_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("ssync");
    }
    dirs::state_dir().unwrap_or_else(|| PathBuf::from(".")).join("ssync")
}

/// Override for the worker's queue poll interval (`poll_interval` in config
/// is the primary source; this env var wins when set, for quick local
/// tuning without touching the plugin-settings blob).
pub fn poll_interval_override() -> Option<Duration> {
    std::env::var("SSYNC_POLL_INTERVAL_MS").ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// How long the dispatcher waits for the worker to drain pending jobs
/// before process exit, scaled by queue depth. Defaults to 2s/job up to a
/// 30s ceiling; both are overridable for testing.
pub fn max_wait_per_job() -> Duration {
    std::env::var("SSYNC_MAX_WAIT_PER_JOB_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(2))
}

pub fn max_wait_ceiling() -> Duration {
    std::env::var("SSYNC_MAX_WAIT_CEILING_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// Drain grace period the worker is joined with before process exit.
pub fn drain_grace() -> Duration {
    std::env::var("SSYNC_DRAIN_GRACE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
