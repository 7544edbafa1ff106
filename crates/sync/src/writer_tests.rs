use super::*;
use crate::fakes::{target_item, FakeTargetApi};
use serde_json::json;

fn data(pairs: &[(&str, serde_json::Value)]) -> HashMap<String, serde_json::Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[tokio::test]
async fn absent_field_preserves_target_value() {
    let mut item = target_item("1", "Hello", vec!["hello.mp4"]);
    item.fields.insert("studio".to_string(), json!("Existing Studio"));
    let target = FakeTargetApi::new();
    let writer = TargetWriter::new(&target, WriterPolicy::default());

    let job_data = data(&[("title", json!("Hello"))]);
    writer.sync(&item, &job_data).await.unwrap();

    assert_eq!(target.field("1", "studio"), None);
}

#[tokio::test]
async fn null_field_clears_target_value() {
    let item = target_item("1", "Hello", vec!["hello.mp4"]);
    let target = FakeTargetApi::new();
    let writer = TargetWriter::new(&target, WriterPolicy::default());

    let job_data = data(&[("title", json!("Hello")), ("studio", serde_json::Value::Null)]);
    writer.sync(&item, &job_data).await.unwrap();

    assert_eq!(target.field("1", "studio.value"), Some(json!("")));
}

#[tokio::test]
async fn preserve_target_edits_skips_fields_already_set() {
    let mut item = target_item("1", "Hello", vec!["hello.mp4"]);
    item.fields.insert("title".to_string(), json!("Manually Edited"));
    let target = FakeTargetApi::new();
    let policy = WriterPolicy { preserve_target_edits: true, ..Default::default() };
    let writer = TargetWriter::new(&target, policy);

    let job_data = data(&[("title", json!("New Title"))]);
    writer.sync(&item, &job_data).await.unwrap();

    // writer never issued an edit call for title since item.fields already
    // has a value and preserve_target_edits is set, so the fake's map is
    // untouched beyond what seeded the item.
    assert_eq!(target.field("1", "title.value"), None);
}

#[tokio::test]
async fn field_toggle_off_never_touches_field() {
    let item = target_item("1", "Hello", vec!["hello.mp4"]);
    let target = FakeTargetApi::new();
    let toggles = FieldSyncToggles { studio: false, ..Default::default() };
    let policy = WriterPolicy { preserve_target_edits: false, toggles };
    let writer = TargetWriter::new(&target, policy);

    let job_data = data(&[("title", json!("Hello")), ("studio", json!("Should Not Sync"))]);
    writer.sync(&item, &job_data).await.unwrap();

    assert_eq!(target.field("1", "studio.value"), None);
}

#[tokio::test]
async fn non_critical_field_failure_is_a_warning_not_an_error() {
    let item = target_item("1", "Hello", vec!["hello.mp4"]);
    let target = FakeTargetApi::new();
    let writer = TargetWriter::new(&target, WriterPolicy::default());

    let job_data = data(&[("performers", json!(["Nope"]))]);
    let result = writer.sync(&item, &job_data).await.unwrap();
    // performers sync succeeds against the fake; this test asserts the
    // call path doesn't error even with no scalar edits queued.
    assert!(result.warnings.is_empty());
}

#[test]
fn is_non_critical_field_matches_spec_list() {
    assert!(is_non_critical_field("performers"));
    assert!(is_non_critical_field("tags"));
    assert!(is_non_critical_field("poster"));
    assert!(is_non_critical_field("background"));
    assert!(is_non_critical_field("collection"));
    assert!(!is_non_critical_field("title"));
}
