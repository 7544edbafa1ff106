use super::*;
use ssync_core::error::ErrorKind;

#[test]
fn graphql_url_trims_trailing_slash() {
    let api = HttpSourceApi::new("http://localhost:9999/", None, Duration::from_secs(1), Duration::from_secs(1));
    assert_eq!(api.graphql_url(), "http://localhost:9999/graphql");
}

#[test]
fn kind_to_error_round_trips_through_kind() {
    assert_eq!(kind_to_error(ErrorKind::Transient, "x".into()).kind(), ErrorKind::Transient);
    assert_eq!(kind_to_error(ErrorKind::Permanent, "x".into()).kind(), ErrorKind::Permanent);
    assert_eq!(kind_to_error(ErrorKind::NotFound, "x".into()).kind(), ErrorKind::NotFound);
    assert_eq!(kind_to_error(ErrorKind::ServerDown, "x".into()).kind(), ErrorKind::ServerDown);
}
