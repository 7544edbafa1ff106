// SPDX-License-Identifier: MIT

//! Shared `SourceApi`/`TargetApi` test doubles, exposed behind the
//! `test-support` feature so the daemon crate's tests can drive the
//! worker and reconciliation engine without a real Source/Target.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ssync_core::error::SyncError;

use crate::adapters::{LibraryRef, SceneFilter, SourceApi, SourceScene, TargetApi, TargetItem};

/// In-memory `SourceApi` double: scenes and images are preloaded, and
/// `is_scan_running` is a simple flag.
#[derive(Default)]
pub struct FakeSourceApi {
    scenes: Mutex<HashMap<u64, SourceScene>>,
    images: Mutex<HashMap<String, Vec<u8>>>,
    scan_running: Mutex<bool>,
}

impl FakeSourceApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(self, scene: SourceScene) -> Self {
        self.scenes.lock().unwrap_or_else(|e| e.into_inner()).insert(scene.id, scene);
        self
    }

    pub fn with_image(self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.lock().unwrap_or_else(|e| e.into_inner()).insert(url.to_string(), bytes);
        self
    }

    pub fn set_scan_running(&self, running: bool) {
        *self.scan_running.lock().unwrap_or_else(|e| e.into_inner()) = running;
    }
}

#[async_trait]
impl SourceApi for FakeSourceApi {
    async fn find_scene(&self, id: u64) -> Result<Option<SourceScene>, SyncError> {
        Ok(self.scenes.lock().unwrap_or_else(|e| e.into_inner()).get(&id).cloned())
    }

    async fn find_scenes(&self, filter: SceneFilter) -> Result<Vec<SourceScene>, SyncError> {
        let scenes = self.scenes.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<SourceScene> = match filter {
            SceneFilter::All => scenes.values().cloned().collect(),
            SceneFilter::CreatedSince(since) => scenes
                .values()
                .filter(|s| s.created_at.as_deref().is_some_and(|c| c >= since.as_str()))
                .cloned()
                .collect(),
            SceneFilter::UpdatedSince(since) => scenes
                .values()
                .filter(|s| s.updated_at.as_deref().is_some_and(|u| u >= since.as_str()))
                .cloned()
                .collect(),
        };
        out.sort_by_key(|s| s.id);
        Ok(out)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, SyncError> {
        self.images
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
            .ok_or_else(|| SyncError::not_found(format!("no fake image for {url}")))
    }

    async fn is_scan_running(&self) -> Result<bool, SyncError> {
        Ok(*self.scan_running.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Controls how `FakeTargetApi` answers the next `N` calls of a given
/// kind before falling back to its steady-state behaviour.
#[derive(Default)]
struct Faults {
    health_check: usize,
    search: usize,
    edit: usize,
}

/// In-memory `TargetApi` double: one library section ("Movies"),
/// preloaded items keyed by `key`, and fault injection counters so
/// tests can simulate a flaky-then-recovering Target.
pub struct FakeTargetApi {
    items: Mutex<HashMap<String, TargetItem>>,
    by_title: Mutex<HashMap<String, Vec<String>>>,
    faults: Mutex<Faults>,
    health_ok: Mutex<bool>,
}

impl Default for FakeTargetApi {
    fn default() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            by_title: Mutex::new(HashMap::new()),
            faults: Mutex::new(Faults::default()),
            health_ok: Mutex::new(true),
        }
    }
}

impl FakeTargetApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, title: &str, item: TargetItem) -> Self {
        self.by_title
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(title.to_string())
            .or_default()
            .push(item.key.clone());
        self.items.lock().unwrap_or_else(|e| e.into_inner()).insert(item.key.clone(), item);
        self
    }

    /// Make the next `n` `health_check` calls fail.
    pub fn fail_health_checks(&self, n: usize) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).health_check = n;
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.health_ok.lock().unwrap_or_else(|e| e.into_inner()) = healthy;
    }

    /// Make the next `n` `search` calls return a `ServerDown` error.
    pub fn fail_searches(&self, n: usize) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).search = n;
    }

    pub fn field(&self, key: &str, field: &str) -> Option<serde_json::Value> {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).get(key).and_then(|i| i.fields.get(field).cloned())
    }
}

#[async_trait]
impl TargetApi for FakeTargetApi {
    async fn sections(&self) -> Result<Vec<LibraryRef>, SyncError> {
        Ok(vec![LibraryRef { name: "Movies".to_string(), id: "1".to_string() }])
    }

    async fn section(&self, name: &str) -> Result<Option<LibraryRef>, SyncError> {
        Ok(Some(LibraryRef { name: name.to_string(), id: "1".to_string() }))
    }

    async fn search(&self, _library: &LibraryRef, title: &str) -> Result<Vec<TargetItem>, SyncError> {
        {
            let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
            if faults.search > 0 {
                faults.search -= 1;
                return Err(SyncError::ServerDown { message: "fake target down".to_string(), source: None });
            }
        }
        let keys = self.by_title.lock().unwrap_or_else(|e| e.into_inner()).get(title).cloned().unwrap_or_default();
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(keys.into_iter().filter_map(|k| items.get(&k).cloned()).collect())
    }

    async fn edit(&self, item: &TargetItem, fields: HashMap<String, serde_json::Value>) -> Result<(), SyncError> {
        {
            let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
            if faults.edit > 0 {
                faults.edit -= 1;
                return Err(SyncError::transient("fake edit failed"));
            }
        }
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        let entry = items.entry(item.key.clone()).or_insert_with(|| item.clone());
        for (k, v) in fields {
            entry.fields.insert(strip_list_suffix(&k), v);
        }
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<TargetItem, SyncError> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| SyncError::not_found(format!("no fake item {key}")))
    }

    async fn upload_poster(&self, _item: &TargetItem, _bytes: Vec<u8>) -> Result<(), SyncError> {
        Ok(())
    }

    async fn upload_art(&self, _item: &TargetItem, _bytes: Vec<u8>) -> Result<(), SyncError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), SyncError> {
        {
            let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
            if faults.health_check > 0 {
                faults.health_check -= 1;
                return Err(SyncError::ServerDown { message: "fake target unhealthy".to_string(), source: None });
            }
        }
        if *self.health_ok.lock().unwrap_or_else(|e| e.into_inner()) {
            Ok(())
        } else {
            Err(SyncError::ServerDown { message: "fake target unhealthy".to_string(), source: None })
        }
    }
}

/// `performers[0].tag.value` / `collection[0].tag.value` -> `performers`
/// / `collection`, `title.value` -> `title`, matching the writer's edit
/// key shapes.
fn strip_list_suffix(field: &str) -> String {
    let base = field.split('.').next().unwrap_or(field);
    base.split('[').next().unwrap_or(base).to_string()
}

pub fn library(name: &str) -> LibraryRef {
    LibraryRef { name: name.to_string(), id: "1".to_string() }
}

pub fn target_item(key: &str, title: &str, file_paths: Vec<&str>) -> TargetItem {
    TargetItem {
        key: key.to_string(),
        title: title.to_string(),
        file_paths: file_paths.into_iter().map(str::to_string).collect(),
        fields: HashMap::new(),
    }
}
