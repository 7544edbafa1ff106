use super::*;
use serde_json::json;

#[test]
fn flattens_nested_studio_performers_tags_and_paths() {
    let raw = json!({
        "id": 42,
        "title": "Hello",
        "studio": {"name": "Acme"},
        "performers": [{"name": "Alice"}, {"name": "Bob"}],
        "tags": [{"name": "one"}, {"name": "two"}],
        "paths": {"screenshot": "http://x/poster.jpg", "preview": "http://x/bg.jpg"},
        "files": [{"path": "/media/hello.mp4"}],
        "updated_at": "2026-01-01T00:00:00Z",
    });

    let scene = extract_scene_metadata(&raw);
    assert_eq!(scene.id, 42);
    assert_eq!(scene.title.as_deref(), Some("Hello"));
    assert_eq!(scene.studio.as_deref(), Some("Acme"));
    assert_eq!(scene.performers, vec!["Alice".to_string(), "Bob".to_string()]);
    assert_eq!(scene.tags, vec!["one".to_string(), "two".to_string()]);
    assert_eq!(scene.poster_url.as_deref(), Some("http://x/poster.jpg"));
    assert_eq!(scene.background_url.as_deref(), Some("http://x/bg.jpg"));
    assert_eq!(scene.path.as_deref(), Some("/media/hello.mp4"));
}

#[test]
fn missing_nested_fields_default_empty() {
    let raw = json!({"id": 1});
    let scene = extract_scene_metadata(&raw);
    assert!(scene.studio.is_none());
    assert!(scene.performers.is_empty());
    assert!(scene.tags.is_empty());
    assert!(scene.path.is_none());
}

#[test]
fn get_scene_file_path_reads_first_file_only() {
    let raw = json!({"files": [{"path": "/a.mp4"}, {"path": "/b.mp4"}]});
    assert_eq!(get_scene_file_path(&raw), Some("/a.mp4".to_string()));
}

#[test]
fn get_scene_file_path_none_when_no_files() {
    let raw = json!({"files": []});
    assert_eq!(get_scene_file_path(&raw), None);
}

#[test]
fn build_job_data_omits_absent_fields() {
    let scene = SourceScene { id: 1, title: Some("T".to_string()), ..Default::default() };
    let data = build_job_data(&scene);
    assert!(data.contains_key("title"));
    assert!(!data.contains_key("studio"));
    assert!(!data.contains_key("performers"));
}

#[test]
fn to_snapshot_reports_meaningful_metadata_from_studio() {
    let scene = SourceScene { id: 1, studio: Some("Acme".to_string()), ..Default::default() };
    let snapshot = to_snapshot(&scene);
    assert!(snapshot.has_meaningful_metadata());
}

#[test]
fn to_snapshot_rating_alone_is_not_meaningful() {
    let scene = SourceScene { id: 1, rating100: Some(80), ..Default::default() };
    let snapshot = to_snapshot(&scene);
    assert!(!snapshot.has_meaningful_metadata());
}
