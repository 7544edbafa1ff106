// SPDX-License-Identifier: MIT

//! Stdin/stdout invocation envelope.

use serde::{Deserialize, Serialize};

/// Host connection details, present on every invocation but only read by
/// the real Source/Target adapters (never by the dispatch table itself).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConnection {
    #[serde(rename = "Scheme")]
    pub scheme: String,
    #[serde(rename = "Host")]
    pub host: String,
    #[serde(rename = "Port")]
    pub port: u16,
    #[serde(alias = "SessionCookie", alias = "sessionCookie", default)]
    pub session_cookie: Option<String>,
    #[serde(rename = "ApiKey", default)]
    pub api_key: Option<String>,
}

impl ServerConnection {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// A hook-triggered event invocation, as opposed to an admin/task mode.
#[derive(Debug, Clone, Deserialize)]
pub struct HookContext {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: u64,
    #[serde(default)]
    pub input: serde_json::Value,
}

impl HookContext {
    pub const SCENE_UPDATE_POST: &'static str = "Scene.Update.Post";
    pub const SCENE_CREATE_POST: &'static str = "Scene.Create.Post";

    /// `input` carries an identification payload (an external-id array),
    /// which is always processed even with otherwise-empty input.
    pub fn is_identification(&self) -> bool {
        self.input
            .get("external_ids")
            .or_else(|| self.input.get("stash_ids"))
            .and_then(|v| v.as_array())
            .is_some_and(|a| !a.is_empty())
    }

    /// Whether `input` carries no field data at all (a scan-triggered
    /// refresh rather than a user edit).
    pub fn has_empty_input(&self) -> bool {
        match &self.input {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Args {
    #[serde(rename = "hookContext", default)]
    pub hook_context: Option<HookContext>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub server_connection: Option<ServerConnection>,
    pub args: Args,
}

impl Envelope {
    pub fn parse(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }
}

/// Successful stdout payload: `{"output": "ok"|"disabled"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeOutput {
    Ok,
    Disabled,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputEnvelope {
    pub output: &'static str,
}

impl From<ModeOutput> for OutputEnvelope {
    fn from(value: ModeOutput) -> Self {
        OutputEnvelope { output: match value { ModeOutput::Ok => "ok", ModeOutput::Disabled => "disabled" } }
    }
}

/// Stderr error payload: `{"error": "<message>"}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
