use super::*;

#[test]
fn delay_never_exceeds_upper_envelope() {
    let mut rng = rand::thread_rng();
    for policy in [BackoffPolicy::STANDARD, BackoffPolicy::NOT_FOUND] {
        for attempt in 0..15 {
            let envelope = policy.upper_envelope(attempt);
            for _ in 0..20 {
                let delay = policy.calculate_delay(attempt, &mut rng);
                assert!(delay <= envelope, "attempt {attempt}: {delay:?} > {envelope:?}");
            }
        }
    }
}

#[test]
fn delay_never_exceeds_cap() {
    let mut rng = rand::thread_rng();
    for policy in [BackoffPolicy::STANDARD, BackoffPolicy::NOT_FOUND] {
        for attempt in 0..20 {
            let delay = policy.calculate_delay(attempt, &mut rng);
            assert!(delay <= policy.cap);
        }
    }
}

#[test]
fn not_found_ladder_is_wider_than_standard() {
    assert!(BackoffPolicy::NOT_FOUND.base > BackoffPolicy::STANDARD.base);
    assert!(BackoffPolicy::NOT_FOUND.cap > BackoffPolicy::STANDARD.cap);
    assert!(BackoffPolicy::NOT_FOUND.max_attempts > BackoffPolicy::STANDARD.max_attempts);
}

#[test]
fn policy_for_routes_not_found_to_wide_ladder() {
    assert_eq!(policy_for(ErrorKind::NotFound).max_attempts, BackoffPolicy::NOT_FOUND.max_attempts);
    assert_eq!(policy_for(ErrorKind::Transient).max_attempts, BackoffPolicy::STANDARD.max_attempts);
    assert_eq!(policy_for(ErrorKind::Permanent).max_attempts, BackoffPolicy::STANDARD.max_attempts);
    assert_eq!(policy_for(ErrorKind::ServerDown).max_attempts, BackoffPolicy::STANDARD.max_attempts);
}
