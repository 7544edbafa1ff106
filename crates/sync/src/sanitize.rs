// SPDX-License-Identifier: MIT

//! Metadata sanitiser and validator.

use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Per-field length/count limits.
pub const TITLE_MAX: usize = 255;
pub const STUDIO_MAX: usize = 255;
pub const SUMMARY_MAX: usize = 10_000;
pub const TAGLINE_MAX: usize = 255;
pub const NAME_MAX: usize = 255;
pub const PERFORMERS_MAX: usize = 50;
pub const COLLECTIONS_MAX: usize = 20;

/// A scene-data validation failure. Critical errors (missing/empty title,
/// non-positive scene id) should abort the job as `Permanent`; everything
/// else is a warning the caller may log and continue past.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    Critical(String),
    Warning(String),
}

/// Sanitise one string field for safe downstream use: NFC-normalise, strip
/// `Cc`/`Cf` code points, translate typographic punctuation to ASCII,
/// collapse whitespace, trim, and truncate to `max_length` preferring a
/// word boundary above 80% of the limit. `max_length == 0` means no limit.
///
/// Idempotent: `sanitize_field(sanitize_field(x, n), n) == sanitize_field(x, n)`.
pub fn sanitize_field(text: &str, max_length: usize) -> String {
    if text.is_empty() {
        return String::new();
    }

    let normalized: String = text.nfc().collect();

    let stripped: String = normalized
        .chars()
        .filter(|c| !matches!(unicode_category(*c), Category::Control | Category::Format))
        .collect();

    let translated = translate_punctuation(&stripped);

    let collapsed = translated.split_whitespace().collect::<Vec<_>>().join(" ");

    truncate_at_word_boundary(&collapsed, max_length)
}

fn truncate_at_word_boundary(text: &str, max_length: usize) -> String {
    if max_length == 0 || text.chars().count() <= max_length {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let truncated: String = chars[..max_length].iter().collect();
    let threshold = (max_length as f64 * 0.8) as usize;

    if let Some(last_space) = truncated.rfind(' ') {
        let prefix_chars = truncated[..last_space].chars().count();
        if prefix_chars > threshold {
            return truncated[..last_space].to_string();
        }
    }
    truncated
}

fn translate_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            other => out.push(other),
        }
    }
    out
}

/// Coarse Unicode general-category classification, just enough to detect
/// `Cc` (control) and `Cf` (format) without pulling in a full Unicode
/// tables dependency.
enum Category {
    Control,
    Format,
    Other,
}

fn unicode_category(c: char) -> Category {
    let cp = c as u32;
    // Cc: C0 controls, DEL, C1 controls.
    if cp <= 0x1F || (0x7F..=0x9F).contains(&cp) {
        return Category::Control;
    }
    // Cf: common format characters (soft hyphen, zero-width {non-}joiner,
    // BOM/zero-width no-break space, directional marks, word joiner, the
    // invisible math operators, and the explicit bidi isolates).
    let is_format = matches!(cp, 0x00AD)
        || (0x200B..=0x200F).contains(&cp)
        || (0x202A..=0x202E).contains(&cp)
        || (0x2060..=0x2064).contains(&cp)
        || (0x2066..=0x206F).contains(&cp)
        || cp == 0xFEFF;
    if is_format {
        Category::Format
    } else {
        Category::Other
    }
}

/// Filter a list field: drop empty strings, sanitise each entry to
/// `NAME_MAX`, and truncate to `limit` with a warning if exceeded. An empty
/// result becomes `None` (list fields with no entries are absent, not
/// empty-but-present).
pub fn sanitize_list_field(
    values: &[String],
    limit: usize,
    field_name: &str,
) -> (Option<Vec<String>>, Vec<ValidationIssue>) {
    let mut issues = Vec::new();
    let mut cleaned: Vec<String> = values
        .iter()
        .map(|v| sanitize_field(v, NAME_MAX))
        .filter(|v| !v.is_empty())
        .collect();

    if cleaned.len() > limit {
        issues.push(ValidationIssue::Warning(format!(
            "{field_name} has {} entries, truncating to {limit}",
            cleaned.len()
        )));
        cleaned.truncate(limit);
    }

    if cleaned.is_empty() {
        (None, issues)
    } else {
        (Some(cleaned), issues)
    }
}

/// Validate a scene's job `data` map. Title is required and must be
/// non-empty after sanitisation; scene id must be `> 0`; rating is
/// 0-100; everything else is optional.
pub fn validate_scene_data(
    scene_id: u64,
    data: &HashMap<String, serde_json::Value>,
    tag_limit: usize,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if scene_id == 0 {
        issues.push(ValidationIssue::Critical("scene_id must be > 0".to_string()));
    }

    match data.get("title").and_then(|v| v.as_str()) {
        Some(title) if !sanitize_field(title, TITLE_MAX).is_empty() => {}
        Some(_) => issues.push(ValidationIssue::Critical("title is empty after sanitisation".to_string())),
        None => issues.push(ValidationIssue::Critical("title is required".to_string())),
    }

    if let Some(rating) = data.get("rating100").and_then(|v| v.as_i64()) {
        if !(0..=100).contains(&rating) {
            issues.push(ValidationIssue::Warning(format!("rating100 {rating} out of range 0-100")));
        }
    }

    if let Some(tags) = data.get("tags").and_then(|v| v.as_array()) {
        if tags.len() > tag_limit {
            issues.push(ValidationIssue::Warning(format!(
                "tags has {} entries, truncating to {tag_limit}",
                tags.len()
            )));
        }
    }

    if let Some(performers) = data.get("performers").and_then(|v| v.as_array()) {
        if performers.len() > PERFORMERS_MAX {
            issues.push(ValidationIssue::Warning(format!(
                "performers has {} entries, truncating to {PERFORMERS_MAX}",
                performers.len()
            )));
        }
    }

    issues
}

/// Coerce common string spellings to a bool, mirroring
/// `ssync_core::config::coerce_bool` for field values read out of a raw
/// JSON/GraphQL settings blob (kept here too since sanitisation and config
/// coercion are conceptually the same "tolerant parsing" operation).
pub fn coerce_bool(value: &str) -> bool {
    ssync_core::config::coerce_bool(value)
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
