use super::*;
use serde_json::json;

#[test]
fn parse_target_item_flattens_media_parts_and_fields() {
    let raw = json!({
        "ratingKey": "501",
        "title": "A Movie",
        "summary": "existing summary",
        "Media": [{"Part": [{"file": "/movies/a.mp4"}]}],
    });
    let item = parse_target_item(&raw);
    assert_eq!(item.key, "501");
    assert_eq!(item.title, "A Movie");
    assert_eq!(item.file_paths, vec!["/movies/a.mp4".to_string()]);
    assert_eq!(item.fields.get("summary").and_then(|v| v.as_str()), Some("existing summary"));
}

#[test]
fn parse_target_item_handles_missing_media() {
    let raw = json!({"ratingKey": 7, "title": "No Files"});
    let item = parse_target_item(&raw);
    assert_eq!(item.key, "7");
    assert!(item.file_paths.is_empty());
}

#[test]
fn url_joins_base_and_path() {
    let api = HttpTargetApi::new("http://host:32400/", "tok", Duration::from_secs(1), Duration::from_secs(1));
    assert_eq!(api.url("/identity"), "http://host:32400/identity");
}

#[test]
fn value_as_query_string_unwraps_plain_strings() {
    assert_eq!(value_as_query_string(&json!("hello")), "hello");
    assert_eq!(value_as_query_string(&json!(42)), "42");
}
