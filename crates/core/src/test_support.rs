// SPDX-License-Identifier: MIT

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::collections::HashMap;

use crate::model::{SceneSnapshot, SyncJob, UpdateType};

/// Proptest strategies for core data types.
pub mod strategies {
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    pub fn arb_error_kind() -> impl Strategy<Value = ErrorKind> {
        prop_oneof![
            Just(ErrorKind::Transient),
            Just(ErrorKind::Permanent),
            Just(ErrorKind::NotFound),
            Just(ErrorKind::ServerDown),
        ]
    }

    /// Strings drawn from a wide Unicode range, including control and
    /// format characters, for sanitiser idempotence checks.
    pub fn arb_dirty_string() -> impl Strategy<Value = String> {
        proptest::collection::vec(any::<char>(), 0..64).prop_map(|chars| chars.into_iter().collect())
    }
}

pub fn sync_job(scene_id: u64, title: &str) -> SyncJob {
    let mut data = HashMap::new();
    data.insert("title".to_string(), serde_json::Value::String(title.to_string()));
    SyncJob::new(scene_id, UpdateType::Metadata, data, 1_000_000.0)
}

pub fn scene_snapshot(id: u64) -> SceneSnapshot {
    SceneSnapshot {
        id,
        title: Some(format!("Scene {id}")),
        details: None,
        date: None,
        rating100: None,
        studio: None,
        performers: Vec::new(),
        tags: Vec::new(),
        path: Some(format!("/media/videos/scene-{id}.mp4")),
        created_at: Some("2026-01-01T00:00:00Z".to_string()),
        updated_at: Some("2026-01-01T00:00:00Z".to_string()),
        external_ids: Vec::new(),
    }
}
