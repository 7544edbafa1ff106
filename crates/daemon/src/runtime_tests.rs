use super::*;
use tempfile::tempdir;

use ssync_core::config::ReconcileInterval;
use ssync_resilience::RecoveryScheduler;

fn test_config() -> PluginConfig {
    PluginConfig {
        target_url: "http://target.local".to_string(),
        target_token: "0123456789".to_string(),
        enabled: true,
        max_retries: 5,
        poll_interval: 1.0,
        connect_timeout_secs: 5.0,
        read_timeout_secs: 30.0,
        dlq_retention_days: 30,
        library_list: vec!["Movies".to_string()],
        strict_matching: true,
        preserve_target_edits: true,
        tag_limit: 250,
        skip_missing_detector: false,
        reconcile_interval: ReconcileInterval::Daily,
        reconcile_scope: ssync_core::config::ReconcileScope::Recent7days,
        debug_logging: false,
        path_obfuscation: false,
    }
}

fn test_connection() -> ServerConnection {
    ServerConnection { scheme: "http".to_string(), host: "127.0.0.1".to_string(), port: 9999, session_cookie: None, api_key: None }
}

#[test]
fn open_creates_data_dir_and_opens_every_store() {
    let dir = tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let nested = dir.path().join("nested").join("state");

    let rt = Runtime::open(&nested, test_config(), &test_connection()).unwrap_or_else(|e| panic!("open: {e}"));

    assert!(nested.is_dir());
    assert_eq!(rt.queue.stats().pending, 0);
    assert_eq!(rt.dlq.len(), 0);
}

#[test]
fn worker_config_reflects_plugin_config() {
    let dir = tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let rt = Runtime::open(dir.path(), test_config(), &test_connection()).unwrap_or_else(|e| panic!("open: {e}"));

    let worker_config = rt.worker_config();
    assert_eq!(worker_config.library_list, vec!["Movies".to_string()]);
    assert!(worker_config.strict_matching);
    assert!(worker_config.writer_policy.preserve_target_edits);
    assert_eq!(worker_config.tag_limit, 250);
}

#[test]
fn open_rehydrates_an_in_progress_recovery_ramp() {
    let dir = tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let now = SystemClock.now_secs();

    let recovery = RecoveryScheduler::new(dir.path());
    let mut state = recovery.load_state();
    state.recovery_started_at = now - 10.0;
    recovery.save_state(&state);

    let rt = Runtime::open(dir.path(), test_config(), &test_connection()).unwrap_or_else(|e| panic!("open: {e}"));

    assert!(rt.rate_limiter.is_in_recovery_period(now));
}

#[test]
fn open_leaves_rate_limiter_idle_with_no_prior_recovery() {
    let dir = tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let rt = Runtime::open(dir.path(), test_config(), &test_connection()).unwrap_or_else(|e| panic!("open: {e}"));

    assert!(!rt.rate_limiter.is_in_recovery_period(SystemClock.now_secs()));
}
