// SPDX-License-Identifier: MIT

//! Thin GraphQL `SourceApi` implementation. Source's schema is treated as
//! opaque — this adapter issues the handful of named operations the core
//! actually needs and classifies failures through
//! `ssync_core::error::classify_http`/`classify_exception`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use ssync_core::error::{classify_http, ErrorKind, ExceptionShape};
use ssync_core::SyncError;
use ssync_sync::adapters::{SceneFilter, SourceApi, SourceScene};
use ssync_sync::scene_extractor::extract_scene_metadata;

pub struct HttpSourceApi {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpSourceApi {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, connect_timeout: Duration, read_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { base_url: base_url.into(), api_key, client }
    }

    fn graphql_url(&self) -> String {
        format!("{}/graphql", self.base_url.trim_end_matches('/'))
    }

    async fn graphql(&self, query: &str, variables: serde_json::Value) -> Result<serde_json::Value, SyncError> {
        let mut req = self.client.post(self.graphql_url()).json(&json!({"query": query, "variables": variables}));
        if let Some(key) = &self.api_key {
            req = req.header("ApiKey", key);
        }

        let response = req.send().await.map_err(|e| classify_reqwest(&e))?;
        let status = response.status();
        if !status.is_success() {
            let kind = classify_http(status.as_u16());
            return Err(kind_to_error(kind, format!("source returned status {status}")));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| classify_reqwest(&e))?;
        if let Some(errors) = body.get("errors") {
            return Err(SyncError::transient(format!("source graphql errors: {errors}")));
        }
        Ok(body.get("data").cloned().unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl SourceApi for HttpSourceApi {
    async fn find_scene(&self, id: u64) -> Result<Option<SourceScene>, SyncError> {
        let data = self
            .graphql(
                "query($id: ID!) { findScene(id: $id) { id title details date rating100 studio { name } \
                 performers { name } tags { name } files { path } paths { screenshot preview } \
                 created_at updated_at } }",
                json!({ "id": id.to_string() }),
            )
            .await?;
        Ok(data.get("findScene").filter(|v| !v.is_null()).map(extract_scene_metadata))
    }

    async fn find_scenes(&self, filter: SceneFilter) -> Result<Vec<SourceScene>, SyncError> {
        let filter_json = match filter {
            SceneFilter::All => json!({}),
            SceneFilter::CreatedSince(since) => json!({"created_at": {"value": since, "modifier": "GREATER_THAN"}}),
            SceneFilter::UpdatedSince(since) => json!({"updated_at": {"value": since, "modifier": "GREATER_THAN"}}),
        };
        let data = self
            .graphql(
                "query($filter: SceneFilterType) { findScenes(scene_filter: $filter) { scenes { id title \
                 details date rating100 studio { name } performers { name } tags { name } files { path } \
                 paths { screenshot preview } created_at updated_at } } }",
                json!({ "filter": filter_json }),
            )
            .await?;
        let scenes = data
            .get("findScenes")
            .and_then(|v| v.get("scenes"))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(scenes.iter().map(extract_scene_metadata).collect())
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, SyncError> {
        let mut req = self.client.get(url);
        if let Some(key) = &self.api_key {
            req = req.header("ApiKey", key);
        }
        let response = req.send().await.map_err(|e| classify_reqwest(&e))?;
        if !response.status().is_success() {
            return Err(kind_to_error(classify_http(response.status().as_u16()), format!("image fetch failed: {url}")));
        }
        Ok(response.bytes().await.map_err(|e| classify_reqwest(&e))?.to_vec())
    }

    async fn is_scan_running(&self) -> Result<bool, SyncError> {
        let data = self.graphql("query { jobQueue { status description } }", json!({})).await?;
        Ok(data
            .get("jobQueue")
            .and_then(|v| v.as_array())
            .is_some_and(|jobs| jobs.iter().any(|j| j.get("status").and_then(|s| s.as_str()) == Some("RUNNING"))))
    }
}

fn classify_reqwest(err: &reqwest::Error) -> SyncError {
    let kind = if err.is_timeout() || err.is_connect() {
        ExceptionShape::ConnectionOrTimeout
    } else if let Some(status) = err.status() {
        ExceptionShape::AlreadyClassified(classify_http(status.as_u16()))
    } else {
        ExceptionShape::Other
    };
    kind_to_error(ssync_core::error::classify_exception(kind), err.to_string())
}

fn kind_to_error(kind: ErrorKind, message: String) -> SyncError {
    match kind {
        ErrorKind::Transient => SyncError::transient(message),
        ErrorKind::Permanent => SyncError::permanent(message),
        ErrorKind::NotFound => SyncError::not_found(message),
        ErrorKind::ServerDown => SyncError::ServerDown { message, source: None },
    }
}

#[cfg(test)]
#[path = "source_client_tests.rs"]
mod tests;
