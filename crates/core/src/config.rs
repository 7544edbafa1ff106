// SPDX-License-Identifier: MIT

//! Plugin configuration and validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileInterval {
    Never,
    Hourly,
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileScope {
    All,
    Recent24h,
    Recent7days,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target_url must use http or https scheme: {0}")]
    InvalidUrlScheme(String),
    #[error("target_token must be at least 10 characters")]
    TokenTooShort,
    #[error("max_retries must be in [1, 20], got {0}")]
    MaxRetriesOutOfRange(u32),
    #[error("poll_interval must be in [0.1, 60.0] seconds, got {0}")]
    PollIntervalOutOfRange(f64),
    #[error("dlq_retention_days must be in [1, 365], got {0}")]
    DlqRetentionOutOfRange(u32),
    #[error("tag_limit must be in [10, 500], got {0}")]
    TagLimitOutOfRange(u32),
    #[error("target_url is required")]
    MissingUrl,
    #[error("target_token is required")]
    MissingToken,
}

/// Raw plugin settings as deserialized from the host's GraphQL plugin
/// settings blob or environment variables, before validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPluginConfig {
    pub target_url: Option<String>,
    pub target_token: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: f64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: f64,
    #[serde(default = "default_dlq_retention_days")]
    pub dlq_retention_days: u32,
    #[serde(default)]
    pub library_list: Vec<String>,
    #[serde(default)]
    pub strict_matching: bool,
    #[serde(default)]
    pub preserve_target_edits: bool,
    #[serde(default = "default_tag_limit")]
    pub tag_limit: u32,
    #[serde(default)]
    pub skip_missing_detector: bool,
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval: ReconcileInterval,
    #[serde(default = "default_reconcile_scope")]
    pub reconcile_scope: ReconcileScope,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub path_obfuscation: bool,
}

fn default_true() -> bool {
    true
}
fn default_max_retries() -> u32 {
    5
}
fn default_poll_interval() -> f64 {
    1.0
}
fn default_connect_timeout() -> f64 {
    5.0
}
fn default_read_timeout() -> f64 {
    30.0
}
fn default_dlq_retention_days() -> u32 {
    30
}
fn default_tag_limit() -> u32 {
    100
}
fn default_reconcile_interval() -> ReconcileInterval {
    ReconcileInterval::Never
}
fn default_reconcile_scope() -> ReconcileScope {
    ReconcileScope::Recent24h
}

/// Validated plugin configuration. Construction is the only way to get
/// one, so every consumer can trust the invariants already hold.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub target_url: String,
    pub target_token: String,
    pub enabled: bool,
    pub max_retries: u32,
    pub poll_interval: f64,
    pub connect_timeout_secs: f64,
    pub read_timeout_secs: f64,
    pub dlq_retention_days: u32,
    pub library_list: Vec<String>,
    pub strict_matching: bool,
    pub preserve_target_edits: bool,
    pub tag_limit: u32,
    pub skip_missing_detector: bool,
    pub reconcile_interval: ReconcileInterval,
    pub reconcile_scope: ReconcileScope,
    pub debug_logging: bool,
    pub path_obfuscation: bool,
}

impl PluginConfig {
    pub fn validate(raw: RawPluginConfig) -> Result<Self, ConfigError> {
        let target_url = raw.target_url.filter(|s| !s.is_empty()).ok_or(ConfigError::MissingUrl)?;
        if !(target_url.starts_with("http://") || target_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrlScheme(target_url));
        }

        let target_token = raw.target_token.filter(|s| !s.is_empty()).ok_or(ConfigError::MissingToken)?;
        if target_token.len() < 10 {
            return Err(ConfigError::TokenTooShort);
        }

        if !(1..=20).contains(&raw.max_retries) {
            return Err(ConfigError::MaxRetriesOutOfRange(raw.max_retries));
        }
        if !(0.1..=60.0).contains(&raw.poll_interval) {
            return Err(ConfigError::PollIntervalOutOfRange(raw.poll_interval));
        }
        if !(1..=365).contains(&raw.dlq_retention_days) {
            return Err(ConfigError::DlqRetentionOutOfRange(raw.dlq_retention_days));
        }
        if !(10..=500).contains(&raw.tag_limit) {
            return Err(ConfigError::TagLimitOutOfRange(raw.tag_limit));
        }

        Ok(PluginConfig {
            target_url,
            target_token,
            enabled: raw.enabled,
            max_retries: raw.max_retries,
            poll_interval: raw.poll_interval,
            connect_timeout_secs: raw.connect_timeout_secs,
            read_timeout_secs: raw.read_timeout_secs,
            dlq_retention_days: raw.dlq_retention_days,
            library_list: raw.library_list,
            strict_matching: raw.strict_matching,
            preserve_target_edits: raw.preserve_target_edits,
            tag_limit: raw.tag_limit,
            skip_missing_detector: raw.skip_missing_detector,
            reconcile_interval: raw.reconcile_interval,
            reconcile_scope: raw.reconcile_scope,
            debug_logging: raw.debug_logging,
            path_obfuscation: raw.path_obfuscation,
        })
    }
}

/// Coerce common string spellings to a bool ("yes"/"no", "1"/"0",
/// "true"/"false", case-insensitive). Unrecognised strings default to
/// `false` — a plugin-settings blob with a typo should not silently
/// enable a destructive toggle.
pub fn coerce_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "yes" | "1" | "on")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
