use super::*;
use serde_json::json;

#[test]
fn collapses_whitespace_and_trims() {
    assert_eq!(sanitize_field("  hello   world  ", 0), "hello world");
}

#[test]
fn translates_typographic_punctuation() {
    assert_eq!(sanitize_field("\u{201c}fancy\u{201d} \u{2014} title", 0), "\"fancy\" - title");
}

#[test]
fn strips_control_and_format_chars() {
    let s = format!("a{}b{}c", '\u{0007}', '\u{200b}');
    assert_eq!(sanitize_field(&s, 0), "abc");
}

#[test]
fn truncates_at_word_boundary_above_threshold() {
    let text = "one two three four five";
    let out = sanitize_field(text, 14);
    assert!(out.chars().count() <= 14);
    assert!(!out.ends_with(' '));
    assert_eq!(out, "one two three");
}

#[test]
fn truncates_hard_when_no_good_boundary() {
    let text = "supercalifragilisticexpialidocious";
    let out = sanitize_field(text, 10);
    assert_eq!(out.chars().count(), 10);
}

#[test]
fn sanitize_field_is_idempotent() {
    let text = "  \u{201c}Weird\u{201d}   Spacing\u{2014}here  ";
    let once = sanitize_field(text, 20);
    let twice = sanitize_field(&once, 20);
    assert_eq!(once, twice);
}

#[test]
fn empty_input_stays_empty() {
    assert_eq!(sanitize_field("", 10), "");
}

#[test]
fn sanitize_list_field_drops_empties_and_dedupes_whitespace() {
    let values = vec!["  Alice  ".to_string(), "".to_string(), "Bob".to_string()];
    let (result, issues) = sanitize_list_field(&values, 10, "performers");
    assert_eq!(result, Some(vec!["Alice".to_string(), "Bob".to_string()]));
    assert!(issues.is_empty());
}

#[test]
fn sanitize_list_field_truncates_over_limit() {
    let values: Vec<String> = (0..5).map(|i| format!("tag{i}")).collect();
    let (result, issues) = sanitize_list_field(&values, 3, "tags");
    assert_eq!(result.unwrap().len(), 3);
    assert_eq!(issues.len(), 1);
}

#[test]
fn sanitize_list_field_all_empty_is_none() {
    let values = vec!["".to_string(), "   ".to_string()];
    let (result, issues) = sanitize_list_field(&values, 10, "tags");
    assert_eq!(result, None);
    assert!(issues.is_empty());
}

#[test]
fn validate_scene_data_requires_title() {
    let data = HashMap::new();
    let issues = validate_scene_data(1, &data, 100);
    assert!(issues.contains(&ValidationIssue::Critical("title is required".to_string())));
}

#[test]
fn validate_scene_data_rejects_zero_scene_id() {
    let mut data = HashMap::new();
    data.insert("title".to_string(), json!("A Title"));
    let issues = validate_scene_data(0, &data, 100);
    assert!(issues.iter().any(|i| matches!(i, ValidationIssue::Critical(m) if m.contains("scene_id"))));
}

#[test]
fn validate_scene_data_flags_out_of_range_rating() {
    let mut data = HashMap::new();
    data.insert("title".to_string(), json!("A Title"));
    data.insert("rating100".to_string(), json!(150));
    let issues = validate_scene_data(1, &data, 100);
    assert!(issues.iter().any(|i| matches!(i, ValidationIssue::Warning(_))));
}

#[test]
fn validate_scene_data_accepts_well_formed_scene() {
    let mut data = HashMap::new();
    data.insert("title".to_string(), json!("A Title"));
    data.insert("rating100".to_string(), json!(80));
    let issues = validate_scene_data(42, &data, 100);
    assert!(issues.is_empty());
}

#[test]
fn coerce_bool_matches_core() {
    assert!(coerce_bool("true"));
    assert!(!coerce_bool("false"));
}
