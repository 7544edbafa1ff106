use super::*;
use serial_test::serial;

#[test]
#[serial]
fn state_dir_honors_explicit_override() {
    std::env::set_var("SSYNC_STATE_DIR", "/tmp/ssync-test-state");
    assert_eq!(state_dir(), PathBuf::from("/tmp/ssync-test-state"));
    std::env::remove_var("SSYNC_STATE_DIR");
}

#[test]
#[serial]
fn poll_interval_override_is_none_by_default() {
    std::env::remove_var("SSYNC_POLL_INTERVAL_MS");
    assert_eq!(poll_interval_override(), None);
}

#[test]
#[serial]
fn poll_interval_override_parses_milliseconds() {
    std::env::set_var("SSYNC_POLL_INTERVAL_MS", "250");
    assert_eq!(poll_interval_override(), Some(Duration::from_millis(250)));
    std::env::remove_var("SSYNC_POLL_INTERVAL_MS");
}

#[test]
#[serial]
fn drain_grace_defaults_to_five_seconds() {
    std::env::remove_var("SSYNC_DRAIN_GRACE_MS");
    assert_eq!(drain_grace(), Duration::from_secs(5));
}
