// SPDX-License-Identifier: MIT

//! Thin REST `TargetApi` implementation. Target's object model is treated
//! as opaque: this adapter only issues the library search/edit/upload/
//! health-check calls the writer and matcher need.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use ssync_core::error::{classify_http, ErrorKind, ExceptionShape};
use ssync_core::SyncError;
use ssync_sync::adapters::{LibraryRef, TargetApi, TargetItem};

pub struct HttpTargetApi {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpTargetApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, connect_timeout: Duration, read_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { base_url: base_url.into(), token: token.into(), client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn request(&self, req: reqwest::RequestBuilder) -> Result<serde_json::Value, SyncError> {
        let response = req.header("X-Plex-Token", &self.token).send().await.map_err(|e| classify_reqwest(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(kind_to_error(classify_http(status.as_u16()), format!("target returned status {status}")));
        }
        response.json().await.map_err(|e| classify_reqwest(&e))
    }
}

#[async_trait]
impl TargetApi for HttpTargetApi {
    async fn sections(&self) -> Result<Vec<LibraryRef>, SyncError> {
        let body = self.request(self.client.get(self.url("/library/sections"))).await?;
        let sections = body
            .get("MediaContainer")
            .and_then(|v| v.get("Directory"))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(sections
            .iter()
            .filter_map(|s| {
                let name = s.get("title").and_then(|v| v.as_str())?.to_string();
                let id = s.get("key").and_then(|v| v.as_str())?.to_string();
                Some(LibraryRef { name, id })
            })
            .collect())
    }

    async fn section(&self, name: &str) -> Result<Option<LibraryRef>, SyncError> {
        Ok(self.sections().await?.into_iter().find(|s| s.name == name))
    }

    async fn search(&self, library: &LibraryRef, title: &str) -> Result<Vec<TargetItem>, SyncError> {
        let body = self
            .request(
                self.client
                    .get(self.url(&format!("/library/sections/{}/search", library.id)))
                    .query(&[("title", title)]),
            )
            .await?;
        let metadata = body
            .get("MediaContainer")
            .and_then(|v| v.get("Metadata"))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(metadata.iter().map(parse_target_item).collect())
    }

    async fn edit(&self, item: &TargetItem, fields: HashMap<String, serde_json::Value>) -> Result<(), SyncError> {
        let mut query: Vec<(String, String)> = vec![("type".to_string(), "1".to_string())];
        for (key, value) in fields {
            query.push((key, value_as_query_string(&value)));
        }
        let req = self
            .client
            .put(self.url(&format!("/library/metadata/{}", item.key)))
            .header("X-Plex-Token", &self.token)
            .query(&query);
        let response = req.send().await.map_err(|e| classify_reqwest(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(kind_to_error(classify_http(status.as_u16()), format!("edit failed with status {status}")));
        }
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<TargetItem, SyncError> {
        let body = self.request(self.client.get(self.url(&format!("/library/metadata/{key}")))).await?;
        let metadata = body
            .get("MediaContainer")
            .and_then(|v| v.get("Metadata"))
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .ok_or_else(|| SyncError::not_found(format!("target item {key} not found")))?;
        Ok(parse_target_item(metadata))
    }

    async fn upload_poster(&self, item: &TargetItem, bytes: Vec<u8>) -> Result<(), SyncError> {
        self.upload_image(item, "posters", bytes).await
    }

    async fn upload_art(&self, item: &TargetItem, bytes: Vec<u8>) -> Result<(), SyncError> {
        self.upload_image(item, "arts", bytes).await
    }

    async fn health_check(&self) -> Result<(), SyncError> {
        self.request(self.client.get(self.url("/identity"))).await.map(|_| ())
    }
}

impl HttpTargetApi {
    async fn upload_image(&self, item: &TargetItem, kind: &str, bytes: Vec<u8>) -> Result<(), SyncError> {
        let response = self
            .client
            .post(self.url(&format!("/library/metadata/{}/{kind}", item.key)))
            .header("X-Plex-Token", &self.token)
            .body(bytes)
            .send()
            .await
            .map_err(|e| classify_reqwest(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(kind_to_error(classify_http(status.as_u16()), format!("{kind} upload failed with status {status}")));
        }
        Ok(())
    }
}

fn parse_target_item(raw: &serde_json::Value) -> TargetItem {
    let key = raw
        .get("ratingKey")
        .and_then(|v| v.as_str().map(str::to_string).or_else(|| v.as_u64().map(|n| n.to_string())))
        .unwrap_or_default();
    let title = raw.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string();
    let file_paths = raw
        .get("Media")
        .and_then(|v| v.as_array())
        .map(|media| {
            media
                .iter()
                .filter_map(|m| m.get("Part").and_then(|p| p.as_array()))
                .flatten()
                .filter_map(|p| p.get("file").and_then(|v| v.as_str()).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let mut fields = HashMap::new();
    for field in ["summary", "tagline", "studio", "originallyAvailableAt"] {
        if let Some(value) = raw.get(field) {
            fields.insert(field.to_string(), value.clone());
        }
    }

    TargetItem { key, title, file_paths, fields }
}

fn value_as_query_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
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
#[path = "target_client_tests.rs"]
mod tests;
