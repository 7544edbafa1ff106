// SPDX-License-Identifier: MIT

//! Dispatcher entry point: reads one JSON envelope from stdin, resolves
//! either a hook-triggered sync or an admin/task mode, and writes the
//! host's `{"output": ...}` / `{"error": ...}` line protocol.

mod config_loader;
mod dedup;
mod env;
mod host_log;
mod modes;
mod protocol;
mod runtime;
mod source_client;
mod target_client;
mod worker;
mod worker_drain;

use std::io::Read;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ssync_core::clock::Clock;
use ssync_core::config::{ConfigError, PluginConfig};
use ssync_core::model::{SceneSnapshot, SyncJob, UpdateType};
use ssync_core::SyncError;
use ssync_storage::{DlqError, QueueError};
use ssync_sync::adapters::SourceApi;
use ssync_sync::scene_extractor::{build_job_data, to_snapshot};
use ssync_sync::sanitize::{self, ValidationIssue};

use dedup::HookDedup;
use host_log::HostLogLayer;
use protocol::{Envelope, ErrorEnvelope, HookContext, ModeOutput, OutputEnvelope};
use runtime::Runtime;
use worker::WorkerError;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("malformed invocation envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Runtime(#[from] runtime::RuntimeError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Dlq(#[from] DlqError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error("no server connection in invocation envelope")]
    MissingServerConnection,
    #[error("unknown mode: {0}")]
    UnknownMode(String),
}

fn main() {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        emit_error(format!("failed to read stdin: {e}"));
        std::process::exit(1);
    }

    let raw_config = config_loader::load_raw_config_from_env();
    let config = match PluginConfig::validate(raw_config) {
        Ok(config) => config,
        Err(e) => {
            emit_error(e.to_string());
            std::process::exit(1);
        }
    };

    if !config.enabled {
        print_output(ModeOutput::Disabled);
        return;
    }

    init_tracing(config.debug_logging);

    let tokio_rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            emit_error(format!("failed to start async runtime: {e}"));
            std::process::exit(1);
        }
    };

    let overall_budget = env::max_wait_ceiling() + env::drain_grace();
    let outcome = tokio_rt.block_on(async { tokio::time::timeout(overall_budget, dispatch(&input, config)).await });

    match outcome {
        Ok(Ok(())) => print_output(ModeOutput::Ok),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "invocation failed");
            emit_error(e.to_string());
            std::process::exit(1);
        }
        Err(_) => {
            tracing::error!(timeout_secs = overall_budget.as_secs_f64(), "invocation exceeded overall time budget");
            emit_error("invocation exceeded overall time budget");
            std::process::exit(1);
        }
    }
}

async fn dispatch(input: &str, config: PluginConfig) -> Result<(), DispatchError> {
    let envelope = Envelope::parse(input)?;
    let server_connection = envelope.server_connection.ok_or(DispatchError::MissingServerConnection)?;

    let rt = Runtime::open(env::state_dir(), config, &server_connection)?;

    if let Some(mode) = &envelope.args.mode {
        let handler = modes::lookup(mode).ok_or_else(|| DispatchError::UnknownMode(mode.clone()))?;
        return handler(&rt, envelope.args.days).await;
    }

    if let Some(hook_context) = &envelope.args.hook_context {
        handle_hook(&rt, hook_context).await?;
    }

    maybe_auto_reconcile(&rt).await?;
    Ok(())
}

/// Fast-path a hook-triggered event: validate, enqueue, and drain just
/// enough of the queue to cover this one job within the per-job wait
/// budget before the process exits.
async fn handle_hook(rt: &Runtime, hook_context: &HookContext) -> Result<(), DispatchError> {
    if !matches!(hook_context.kind.as_str(), HookContext::SCENE_UPDATE_POST | HookContext::SCENE_CREATE_POST) {
        return Ok(());
    }
    if hook_context.has_empty_input() && !hook_context.is_identification() {
        tracing::debug!(scene_id = hook_context.id, "skipping hook: no field data and not an identification event");
        return Ok(());
    }

    let dedup = HookDedup::new();
    if !dedup.mark(hook_context.id) {
        return Ok(());
    }

    let Some(scene) = rt.source.find_scene(hook_context.id).await? else {
        tracing::warn!(scene_id = hook_context.id, "hook fired for a scene that no longer exists");
        dedup.unmark(hook_context.id);
        return Ok(());
    };

    let snapshot: SceneSnapshot = to_snapshot(&scene);
    if !snapshot.has_meaningful_metadata() && !snapshot.is_identification() {
        tracing::debug!(scene_id = scene.id, "skipping hook: scene carries no meaningful metadata");
        dedup.unmark(hook_context.id);
        return Ok(());
    }

    let data = build_job_data(&scene);
    let issues = sanitize::validate_scene_data(scene.id, &data, rt.config.tag_limit as usize);
    if let Some(ValidationIssue::Critical(reason)) = issues.iter().find(|i| matches!(i, ValidationIssue::Critical(_))) {
        tracing::warn!(scene_id = scene.id, reason, "dropping hook event: critical validation failure");
        dedup.unmark(hook_context.id);
        return Ok(());
    }

    if rt.queue.has_active_job_for_scene(scene.id) {
        tracing::debug!(scene_id = scene.id, "skipping hook: scene already has an active queue row");
        return worker_drain::drain_with_dedup(rt, env::max_wait_per_job(), &dedup).await;
    }

    let job = SyncJob::new(scene.id, UpdateType::Metadata, data, rt.clock.now_secs());
    rt.queue.enqueue(job)?;

    worker_drain::drain_with_dedup(rt, env::max_wait_per_job(), &dedup).await
}

/// Run a reconciliation pass if the configured interval is due. Never
/// blocks a hook-triggered invocation on a full pass failing; logged and
/// swallowed rather than propagated, since a missed reconciliation tick
/// is not worth failing the triggering hook over.
async fn maybe_auto_reconcile(rt: &Runtime) -> Result<(), DispatchError> {
    let now = rt.clock.now_secs();
    if !rt.reconcile_scheduler.is_due(rt.config.reconcile_interval, now) {
        return Ok(());
    }
    if let Err(e) = modes::reconcile(rt, rt.config.reconcile_scope).await {
        tracing::warn!(error = %e, "scheduled reconciliation pass failed");
    }
    Ok(())
}

fn init_tracing(debug_logging: bool) {
    let default_level = if debug_logging { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("SSYNC_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry().with(filter).with(HostLogLayer::to_stderr()).try_init();
}

fn print_output(output: ModeOutput) {
    let envelope: OutputEnvelope = output.into();
    if let Ok(json) = serde_json::to_string(&envelope) {
        println!("{json}");
    }
}

fn emit_error(message: impl Into<String>) {
    let envelope = ErrorEnvelope::new(message);
    if let Ok(json) = serde_json::to_string(&envelope) {
        eprintln!("{json}");
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

