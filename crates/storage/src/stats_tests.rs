use super::*;
use tempfile::tempdir;

#[test]
fn first_flush_persists_session_as_is() {
    let dir = tempdir().unwrap();
    let store = StatsStore::open(dir.path());
    let mut session = store.new_session(1000.0);
    session.record_success(0.5, ssync_core::model::MatchConfidence::High);

    let totals = store.flush(&session);
    assert_eq!(totals.jobs_succeeded, 1);
    assert_eq!(totals.session_start, 1000.0);
}

#[test]
fn second_flush_sums_counters_and_keeps_original_session_start() {
    let dir = tempdir().unwrap();
    let store = StatsStore::open(dir.path());

    let mut first = store.new_session(1000.0);
    first.record_success(1.0, ssync_core::model::MatchConfidence::High);
    store.flush(&first);

    let mut second = store.new_session(2000.0);
    second.record_success(1.0, ssync_core::model::MatchConfidence::Low);
    let totals = store.flush(&second);

    assert_eq!(totals.jobs_succeeded, 2);
    assert_eq!(totals.high_confidence_matches, 1);
    assert_eq!(totals.low_confidence_matches, 1);
    assert_eq!(totals.session_start, 1000.0);
}

#[test]
fn load_without_flush_returns_default() {
    let dir = tempdir().unwrap();
    let store = StatsStore::open(dir.path());
    let totals = store.load();
    assert_eq!(totals.jobs_processed, 0);
}
