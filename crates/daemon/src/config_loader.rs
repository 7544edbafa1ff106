// SPDX-License-Identifier: MIT

//! Loads `RawPluginConfig` from environment variables instead of the host's
//! GraphQL plugin-settings blob, since the dispatcher has no prior GraphQL
//! connection to fetch settings before it knows whether the plugin is even
//! enabled.

use std::str::FromStr;

use ssync_core::config::{coerce_bool, ReconcileInterval, ReconcileScope};
use ssync_core::RawPluginConfig;

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str) -> bool {
    env_var(key).is_some_and(|v| coerce_bool(&v))
}

fn parse_reconcile_interval(value: Option<String>) -> ReconcileInterval {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("hourly") => ReconcileInterval::Hourly,
        Some("daily") => ReconcileInterval::Daily,
        Some("weekly") => ReconcileInterval::Weekly,
        _ => ReconcileInterval::Never,
    }
}

fn parse_reconcile_scope(value: Option<String>) -> ReconcileScope {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("all") => ReconcileScope::All,
        Some("recent7days") | Some("recent_7days") => ReconcileScope::Recent7days,
        _ => ReconcileScope::Recent24h,
    }
}

pub fn load_raw_config_from_env() -> RawPluginConfig {
    RawPluginConfig {
        target_url: env_var("SSYNC_TARGET_URL"),
        target_token: env_var("SSYNC_TARGET_TOKEN"),
        enabled: env_var("SSYNC_ENABLED").map(|v| coerce_bool(&v)).unwrap_or(true),
        max_retries: parse_env_or("SSYNC_MAX_RETRIES", 5),
        poll_interval: parse_env_or("SSYNC_POLL_INTERVAL", 1.0),
        connect_timeout_secs: parse_env_or("SSYNC_CONNECT_TIMEOUT_SECS", 5.0),
        read_timeout_secs: parse_env_or("SSYNC_READ_TIMEOUT_SECS", 30.0),
        dlq_retention_days: parse_env_or("SSYNC_DLQ_RETENTION_DAYS", 30),
        library_list: env_var("SSYNC_LIBRARY_LIST")
            .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default(),
        strict_matching: env_bool("SSYNC_STRICT_MATCHING"),
        preserve_target_edits: env_bool("SSYNC_PRESERVE_TARGET_EDITS"),
        tag_limit: parse_env_or("SSYNC_TAG_LIMIT", 100),
        skip_missing_detector: env_bool("SSYNC_SKIP_MISSING_DETECTOR"),
        reconcile_interval: parse_reconcile_interval(env_var("SSYNC_RECONCILE_INTERVAL")),
        reconcile_scope: parse_reconcile_scope(env_var("SSYNC_RECONCILE_SCOPE")),
        debug_logging: env_bool("SSYNC_DEBUG_LOGGING"),
        path_obfuscation: env_bool("SSYNC_PATH_OBFUSCATION"),
    }
}

#[cfg(test)]
#[path = "config_loader_tests.rs"]
mod tests;
