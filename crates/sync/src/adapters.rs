// SPDX-License-Identifier: MIT

//! `SourceApi` / `TargetApi`: the two outbound adapter traits the worker,
//! matcher, writer, and reconciliation engine are built against. Both are
//! async, `Send + Sync + 'static`, with one error enum per side and
//! `test-support`-gated fake implementations for tests.

use async_trait::async_trait;
use ssync_core::SyncError;
use std::collections::HashMap;

/// A handle to one Target library section (e.g. a Plex "Movies" section).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRef {
    pub name: String,
    pub id: String,
}

/// Source-side scene filter for `findScenes`, mirroring
/// `{created_at|updated_at: {value, modifier}}`.
#[derive(Debug, Clone)]
pub enum SceneFilter {
    /// All scenes, unfiltered.
    All,
    /// Scenes created at or after the given ISO-8601 timestamp.
    CreatedSince(String),
    /// Scenes updated at or after the given ISO-8601 timestamp.
    UpdatedSince(String),
}

/// A single Source scene as returned by `findScene`/`findScenes`, already
/// flattened by `scene_extractor` into the shape the rest of the pipeline
/// consumes.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SourceScene {
    pub id: u64,
    pub title: Option<String>,
    pub path: Option<String>,
    pub studio: Option<String>,
    pub performers: Vec<String>,
    pub tags: Vec<String>,
    pub details: Option<String>,
    pub date: Option<String>,
    pub rating100: Option<i64>,
    pub poster_url: Option<String>,
    pub background_url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A Target library item as returned by search, minimally shaped for the
/// matcher and writer (see `ssync_core::model::TargetItemRef` for the
/// cross-module key the rest of the pipeline threads around).
#[derive(Debug, Clone)]
pub struct TargetItem {
    pub key: String,
    pub title: String,
    pub file_paths: Vec<String>,
    pub fields: HashMap<String, serde_json::Value>,
}

/// Outbound calls against the upstream content-management server
/// ("Source"). One error kind per call site; callers classify via
/// `ssync_core::error::classify_exception`/`classify_http` as close to the
/// call as possible.
#[async_trait]
pub trait SourceApi: Send + Sync + 'static {
    async fn find_scene(&self, id: u64) -> Result<Option<SourceScene>, SyncError>;

    async fn find_scenes(&self, filter: SceneFilter) -> Result<Vec<SourceScene>, SyncError>;

    /// Fetch raw bytes for a Source-served image (poster/background),
    /// authenticated the same way as GraphQL calls.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, SyncError>;

    /// True if the host reports an active library scan, used to suppress
    /// reconciliation/auto-scan triggers while one is running.
    async fn is_scan_running(&self) -> Result<bool, SyncError>;
}

/// Outbound calls against the media server ("Target").
#[async_trait]
pub trait TargetApi: Send + Sync + 'static {
    async fn sections(&self) -> Result<Vec<LibraryRef>, SyncError>;

    async fn section(&self, name: &str) -> Result<Option<LibraryRef>, SyncError>;

    /// Title search within one library section.
    async fn search(&self, library: &LibraryRef, title: &str) -> Result<Vec<TargetItem>, SyncError>;

    /// Batch-edit scalar fields in one call: `{field.value: new_value}`.
    async fn edit(&self, item: &TargetItem, fields: HashMap<String, serde_json::Value>) -> Result<(), SyncError>;

    /// Re-read an item's current field values, used by the writer's
    /// post-write validation pass.
    async fn get_item(&self, key: &str) -> Result<TargetItem, SyncError>;

    async fn upload_poster(&self, item: &TargetItem, bytes: Vec<u8>) -> Result<(), SyncError>;

    async fn upload_art(&self, item: &TargetItem, bytes: Vec<u8>) -> Result<(), SyncError>;

    /// Deep identity/status probe used by the recovery scheduler; exercises
    /// the database, not just TCP reachability.
    async fn health_check(&self) -> Result<(), SyncError>;
}

#[cfg(test)]
#[path = "adapters_tests.rs"]
mod tests;
