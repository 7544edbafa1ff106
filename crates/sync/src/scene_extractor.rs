// SPDX-License-Identifier: MIT

//! Flattens a raw Source scene payload into the shapes the rest of the
//! pipeline consumes.

use crate::adapters::SourceScene;
use ssync_core::model::SceneSnapshot;
use std::collections::HashMap;

/// Flatten nested GraphQL shapes (`studio.name`, `performers[].name`,
/// `tags[].name`, `paths.screenshot`/`paths.preview`) into the scalar
/// fields `SourceScene` expects. Mirrors `extract_scene_metadata`.
pub fn extract_scene_metadata(raw: &serde_json::Value) -> SourceScene {
    let id = raw.get("id").and_then(|v| v.as_u64()).unwrap_or(0);

    let studio = raw
        .get("studio")
        .and_then(|s| s.get("name"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let performers = raw
        .get("performers")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|p| p.get("name").and_then(|n| n.as_str()).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let tags = raw
        .get("tags")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|t| t.get("name").and_then(|n| n.as_str()).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let poster_url = raw
        .get("paths")
        .and_then(|p| p.get("screenshot"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let background_url = raw
        .get("paths")
        .and_then(|p| p.get("preview"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    SourceScene {
        id,
        title: raw.get("title").and_then(|v| v.as_str()).map(str::to_string),
        path: get_scene_file_path(raw),
        studio,
        performers,
        tags,
        details: raw.get("details").and_then(|v| v.as_str()).map(str::to_string),
        date: raw.get("date").and_then(|v| v.as_str()).map(str::to_string),
        rating100: raw.get("rating100").and_then(|v| v.as_i64()),
        poster_url,
        background_url,
        created_at: raw.get("created_at").and_then(|v| v.as_str()).map(str::to_string),
        updated_at: raw.get("updated_at").and_then(|v| v.as_str()).map(str::to_string),
    }
}

/// Primary filesystem path of a scene's first file, per
/// `get_scene_file_path`: `scene["files"][0]["path"]`.
pub fn get_scene_file_path(raw: &serde_json::Value) -> Option<String> {
    raw.get("files")
        .and_then(|v| v.as_array())
        .and_then(|files| files.first())
        .and_then(|f| f.get("path"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Project a `SourceScene` into the `data` map a sync job carries, and the
/// `SceneSnapshot` the gap detectors and quality gate compare against.
/// List/optional fields that are empty are omitted, matching the job-data
/// absent-vs-null convention enforced by the writer (see
/// `ssync_sync::writer`).
pub fn build_job_data(scene: &SourceScene) -> HashMap<String, serde_json::Value> {
    let mut data = HashMap::new();

    if let Some(title) = &scene.title {
        data.insert("title".to_string(), serde_json::Value::String(title.clone()));
    }
    if let Some(studio) = &scene.studio {
        data.insert("studio".to_string(), serde_json::Value::String(studio.clone()));
    }
    if !scene.performers.is_empty() {
        data.insert("performers".to_string(), serde_json::json!(scene.performers));
    }
    if !scene.tags.is_empty() {
        data.insert("tags".to_string(), serde_json::json!(scene.tags));
    }
    if let Some(details) = &scene.details {
        data.insert("summary".to_string(), serde_json::Value::String(details.clone()));
    }
    if let Some(date) = &scene.date {
        data.insert("date".to_string(), serde_json::Value::String(date.clone()));
    }
    if let Some(rating) = scene.rating100 {
        data.insert("rating100".to_string(), serde_json::json!(rating));
    }
    if let Some(poster) = &scene.poster_url {
        data.insert("poster_url".to_string(), serde_json::Value::String(poster.clone()));
    }
    if let Some(background) = &scene.background_url {
        data.insert("background_url".to_string(), serde_json::Value::String(background.clone()));
    }

    data
}

/// Build the lightweight snapshot the gap detectors compare Source against
/// Target with (see `ssync_core::model::SceneSnapshot::has_meaningful_metadata`).
pub fn to_snapshot(scene: &SourceScene) -> SceneSnapshot {
    SceneSnapshot {
        id: scene.id,
        title: scene.title.clone(),
        details: scene.details.clone(),
        date: scene.date.clone(),
        rating100: scene.rating100.map(|r| r.clamp(0, u8::MAX as i64) as u8),
        studio: scene.studio.clone(),
        performers: scene.performers.clone(),
        tags: scene.tags.clone(),
        path: scene.path.clone(),
        created_at: scene.created_at.clone(),
        updated_at: scene.updated_at.clone(),
        external_ids: Vec::new(),
    }
}

#[cfg(test)]
#[path = "scene_extractor_tests.rs"]
mod tests;
