use super::*;

#[test]
fn parses_full_envelope() {
    let raw = r#"{
        "server_connection": {"Scheme": "http", "Host": "localhost", "Port": 9999, "ApiKey": "abc"},
        "args": {"mode": "queue_status"}
    }"#;
    let envelope = Envelope::parse(raw).unwrap();
    let conn = envelope.server_connection.unwrap();
    assert_eq!(conn.base_url(), "http://localhost:9999");
    assert_eq!(envelope.args.mode.as_deref(), Some("queue_status"));
}

#[test]
fn parses_hook_context() {
    let raw = r#"{"args": {"hookContext": {"type": "Scene.Update.Post", "id": 42, "input": {"title": "Hello"}}}}"#;
    let envelope = Envelope::parse(raw).unwrap();
    let hook = envelope.args.hook_context.unwrap();
    assert_eq!(hook.kind, HookContext::SCENE_UPDATE_POST);
    assert_eq!(hook.id, 42);
    assert!(!hook.has_empty_input());
}

#[test]
fn empty_input_hook_is_detected() {
    let raw = r#"{"args": {"hookContext": {"type": "Scene.Update.Post", "id": 1, "input": {}}}}"#;
    let envelope = Envelope::parse(raw).unwrap();
    assert!(envelope.args.hook_context.unwrap().has_empty_input());
}

#[test]
fn identification_payload_is_detected() {
    let raw = r#"{"args": {"hookContext": {"type": "Scene.Update.Post", "id": 1, "input": {"stash_ids": [{"endpoint": "x", "stash_id": "y"}]}}}}"#;
    let envelope = Envelope::parse(raw).unwrap();
    assert!(envelope.args.hook_context.unwrap().is_identification());
}

#[test]
fn purge_dlq_days_argument_is_parsed() {
    let raw = r#"{"args": {"mode": "purge_dlq", "days": 30}}"#;
    let envelope = Envelope::parse(raw).unwrap();
    assert_eq!(envelope.args.days, Some(30));
}

#[test]
fn mode_output_serializes_to_host_shape() {
    let ok: OutputEnvelope = ModeOutput::Ok.into();
    assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"output":"ok"}"#);

    let disabled: OutputEnvelope = ModeOutput::Disabled.into();
    assert_eq!(serde_json::to_string(&disabled).unwrap(), r#"{"output":"disabled"}"#);
}

#[test]
fn error_envelope_serializes_to_host_shape() {
    let err = ErrorEnvelope::new("boom");
    assert_eq!(serde_json::to_string(&err).unwrap(), r#"{"error":"boom"}"#);
}

#[test]
fn session_cookie_alias_accepts_either_casing() {
    let raw = r#"{"server_connection": {"Scheme": "http", "Host": "h", "Port": 1, "sessionCookie": "abc"}, "args": {}}"#;
    let envelope = Envelope::parse(raw).unwrap();
    assert_eq!(envelope.server_connection.unwrap().session_cookie.as_deref(), Some("abc"));
}
