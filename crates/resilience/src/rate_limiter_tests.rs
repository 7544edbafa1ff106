use super::*;

#[test]
fn outside_recovery_period_never_waits() {
    let limiter = RecoveryRateLimiter::new();
    assert_eq!(limiter.should_wait(1_000.0), 0.0);
    assert!(!limiter.is_in_recovery_period(1_000.0));
}

#[test]
fn first_job_after_start_proceeds_immediately() {
    let limiter = RecoveryRateLimiter::new();
    limiter.start_recovery_period(1_000.0);
    assert_eq!(limiter.should_wait(1_000.0), 0.0);
}

#[test]
fn second_job_without_elapsed_time_must_wait() {
    let limiter = RecoveryRateLimiter::new();
    limiter.start_recovery_period(1_000.0);
    limiter.should_wait(1_000.0); // consumes the initial burst token
    let wait = limiter.should_wait(1_000.0);
    assert!(wait > 0.0);
}

#[test]
fn rate_ramps_linearly_from_initial_to_target() {
    let limiter = RecoveryRateLimiter::with_config(5.0, 20.0, 300.0, 0.3, 60.0);
    limiter.start_recovery_period(0.0);
    assert!((limiter.current_rate(0.0) - 5.0).abs() < 1e-9);
    assert!((limiter.current_rate(150.0) - 12.5).abs() < 1e-9);
    assert!((limiter.current_rate(300.0) - 20.0).abs() < 1e-9);
}

#[test]
fn recovery_period_ends_after_ramp_duration() {
    let limiter = RecoveryRateLimiter::with_config(5.0, 20.0, 300.0, 0.3, 60.0);
    limiter.start_recovery_period(0.0);
    assert!(limiter.is_in_recovery_period(299.0));
    assert!(!limiter.is_in_recovery_period(300.0));
}

#[test]
fn high_error_rate_triggers_fifty_percent_backoff() {
    let limiter = RecoveryRateLimiter::with_config(5.0, 20.0, 300.0, 0.3, 60.0);
    limiter.start_recovery_period(0.0);
    let base_rate = limiter.current_rate(1.0);

    for i in 0..10 {
        limiter.record_result(i >= 5, 1.0); // 50% failures, above 30% threshold
    }

    assert!((limiter.current_rate(1.0) - base_rate * 0.5).abs() < 1e-9);
}

#[test]
fn error_rate_prunes_results_outside_window() {
    let limiter = RecoveryRateLimiter::with_config(5.0, 20.0, 300.0, 0.3, 60.0);
    limiter.start_recovery_period(0.0);
    limiter.record_result(false, 0.0);
    limiter.record_result(false, 0.0);
    assert_eq!(limiter.error_rate(0.0), 1.0);
    assert_eq!(limiter.error_rate(200.0), 0.0);
}

#[test]
fn end_recovery_period_resets_all_state() {
    let limiter = RecoveryRateLimiter::with_config(5.0, 20.0, 300.0, 0.3, 60.0);
    limiter.start_recovery_period(0.0);
    limiter.record_result(false, 0.0);
    limiter.end_recovery_period();

    assert!(!limiter.is_in_recovery_period(0.0));
    assert_eq!(limiter.error_rate(0.0), 0.0);
}
