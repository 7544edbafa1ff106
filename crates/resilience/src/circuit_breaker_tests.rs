use super::*;
use ssync_core::FakeClock;
use tempfile::tempdir;

#[test]
fn starts_closed_and_allows_execution() {
    let breaker = CircuitBreaker::new(FakeClock::new(), None, None);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert!(breaker.can_execute());
}

#[test]
fn opens_after_failure_threshold_consecutive_failures() {
    let breaker = CircuitBreaker::with_config(FakeClock::new(), 3, 60.0, 1, None, None);
    breaker.record_failure();
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Closed);
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
    assert!(!breaker.can_execute());
}

#[test]
fn success_in_closed_state_resets_failure_count() {
    let breaker = CircuitBreaker::with_config(FakeClock::new(), 3, 60.0, 1, None, None);
    breaker.record_failure();
    breaker.record_failure();
    breaker.record_success();
    breaker.record_failure();
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn transitions_to_half_open_after_recovery_timeout_elapses() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::with_config(clock.clone(), 1, 60.0, 1, None, None);
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);

    clock.advance(std::time::Duration::from_secs_f64(59.0));
    assert_eq!(breaker.state(), CircuitState::Open);

    clock.advance(std::time::Duration::from_secs_f64(2.0));
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert!(breaker.can_execute());
}

#[test]
fn half_open_success_closes_circuit() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::with_config(clock.clone(), 1, 60.0, 1, None, None);
    breaker.record_failure();
    clock.advance(std::time::Duration::from_secs_f64(61.0));
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    breaker.record_success();
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn half_open_failure_reopens_circuit_immediately() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::with_config(clock.clone(), 1, 60.0, 1, None, None);
    breaker.record_failure();
    clock.advance(std::time::Duration::from_secs_f64(61.0));
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[test]
fn reset_forces_closed_state() {
    let breaker = CircuitBreaker::with_config(FakeClock::new(), 1, 60.0, 1, None, None);
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
    breaker.reset();
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn state_persists_across_instances_sharing_a_state_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("circuit.json");

    {
        let breaker = CircuitBreaker::with_config(FakeClock::new(), 1, 60.0, 1, Some(path.clone()), None);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    let reopened = CircuitBreaker::with_config(FakeClock::new(), 1, 60.0, 1, Some(path), None);
    assert_eq!(reopened.state(), CircuitState::Open);
}

#[test]
fn opening_records_outage_start_when_history_attached() {
    let history = Arc::new(OutageHistory::open(tempdir().unwrap().path()));
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::with_config(clock, 1, 60.0, 1, None, Some(history.clone()));

    breaker.record_failure();
    assert!(history.get_current_outage().is_some());
}
