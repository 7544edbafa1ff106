// SPDX-License-Identifier: MIT

//! Admin/task "mode" handlers and their dispatch table. Keeps mode
//! dispatch a table (`MODE_TABLE`), not a conditional ladder, so a new
//! admin command is one more row.

use std::collections::HashSet;
use std::pin::Pin;

use ssync_core::clock::Clock;
use ssync_core::config::ReconcileScope;
use ssync_sync::adapters::{LibraryRef, SceneFilter, SourceScene, TargetApi, TargetItem};
use ssync_sync::reconciliation::{GapDetector, ReconciliationEnqueuer};
use ssync_sync::scene_extractor::to_snapshot;
use ssync_sync::Matcher;

use crate::runtime::Runtime;
use crate::DispatchError;

pub type ModeFuture<'a> = Pin<Box<dyn std::future::Future<Output = Result<(), DispatchError>> + 'a>>;
pub type ModeHandler = for<'a> fn(&'a Runtime, Option<u32>) -> ModeFuture<'a>;

/// Name -> handler. New admin commands are a new row here.
pub const MODE_TABLE: &[(&str, ModeHandler)] = &[
    ("queue_status", |rt, _days| Box::pin(queue_status(rt))),
    ("clear_queue", |rt, _days| Box::pin(clear_queue(rt))),
    ("clear_dlq", |rt, _days| Box::pin(clear_dlq(rt))),
    ("purge_dlq", |rt, days| Box::pin(purge_dlq(rt, days))),
    ("process_queue", |rt, _days| Box::pin(process_queue(rt))),
    ("reconcile_all", |rt, _days| Box::pin(reconcile(rt, ReconcileScope::All))),
    ("reconcile_recent", |rt, _days| Box::pin(reconcile(rt, ReconcileScope::Recent24h))),
    ("reconcile_7days", |rt, _days| Box::pin(reconcile(rt, ReconcileScope::Recent7days))),
    ("health_check", |rt, _days| Box::pin(health_check(rt))),
    ("outage_summary", |rt, _days| Box::pin(outage_summary(rt))),
    ("recover_outage_jobs", |rt, _days| Box::pin(recover_outage_jobs(rt))),
    // "all"/"recent" run the configured reconciliation scope rather than a
    // fixed one.
    ("all", |rt, _days| Box::pin(reconcile(rt, ReconcileScope::All))),
    ("recent", |rt, _days| Box::pin(reconcile(rt, rt.config.reconcile_scope))),
];

pub fn lookup(mode: &str) -> Option<ModeHandler> {
    MODE_TABLE.iter().find(|(name, _)| *name == mode).map(|(_, handler)| *handler)
}

async fn queue_status(rt: &Runtime) -> Result<(), DispatchError> {
    let stats = rt.queue.stats();
    tracing::info!(
        pending = stats.pending,
        in_progress = stats.in_progress,
        completed = stats.completed,
        failed = stats.failed,
        dlq_count = rt.dlq.len(),
        circuit_state = ?rt.circuit.state(),
        "queue status"
    );
    Ok(())
}

async fn clear_queue(rt: &Runtime) -> Result<(), DispatchError> {
    let pruned = rt.queue.prune_pending()?;
    tracing::info!(pruned, "cleared pending/in-progress queue rows");
    Ok(())
}

async fn clear_dlq(rt: &Runtime) -> Result<(), DispatchError> {
    let purged = rt.dlq.purge()?;
    tracing::info!(purged, "cleared all dead-letter entries");
    Ok(())
}

async fn purge_dlq(rt: &Runtime, days: Option<u32>) -> Result<(), DispatchError> {
    let retention_days = days.unwrap_or(rt.config.dlq_retention_days);
    let now = rt.clock.now_secs();
    let pruned = rt.dlq.prune_expired(retention_days as f64, now)?;
    tracing::info!(pruned, retention_days, "purged expired dead-letter entries");
    Ok(())
}

async fn process_queue(rt: &Runtime) -> Result<(), DispatchError> {
    crate::worker_drain::drain(rt, crate::env::max_wait_ceiling()).await
}

async fn health_check(rt: &Runtime) -> Result<(), DispatchError> {
    let now = rt.clock.now_secs();
    let healthy = rt.target.health_check().await.is_ok();
    let stats = rt.queue.stats();
    let jobs_affected = (stats.pending + stats.in_progress) as u64;
    rt.recovery.record_health_check(healthy, &rt.circuit, now, Some(&rt.outage_history), jobs_affected);
    tracing::info!(healthy, circuit_state = ?rt.circuit.state(), "health check");
    Ok(())
}

async fn outage_summary(rt: &Runtime) -> Result<(), DispatchError> {
    let now = rt.clock.now_secs();
    let history = rt.outage_history.get_history();
    let mttr = ssync_resilience::mttr(&history);
    let mtbf = ssync_resilience::mtbf(&history);
    let availability_30d = ssync_resilience::availability(&history, now, 30.0 * 86_400.0);
    tracing::info!(
        outages_recorded = history.len(),
        mttr_secs = mttr,
        mtbf_secs = mtbf,
        availability_30d,
        server_down_dlq_count = rt.dlq.count_by_kind(ssync_core::error::ErrorKind::ServerDown),
        "outage summary"
    );
    Ok(())
}

async fn recover_outage_jobs(rt: &Runtime) -> Result<(), DispatchError> {
    let entries = rt.dlq.server_down_entries();
    let mut recovered = 0u64;
    for entry in &entries {
        let job = rt.dlq.recover(&entry.id)?;
        rt.queue.enqueue(job)?;
        recovered += 1;
    }
    tracing::info!(recovered, "recovered server-down dead-letter entries back onto the queue");
    Ok(())
}

pub(crate) async fn reconcile(rt: &Runtime, scope: ReconcileScope) -> Result<(), DispatchError> {
    let now = rt.clock.now_secs();

    if rt.source.is_scan_running().await.unwrap_or(false) {
        tracing::info!("skipping reconciliation: source scan in progress");
        return Ok(());
    }

    let filter = match scope {
        ReconcileScope::All => SceneFilter::All,
        ReconcileScope::Recent24h => SceneFilter::UpdatedSince(iso8601(now - 86_400.0)),
        ReconcileScope::Recent7days => SceneFilter::UpdatedSince(iso8601(now - 7.0 * 86_400.0)),
    };
    let scope_name = match scope {
        ReconcileScope::All => "all",
        ReconcileScope::Recent24h => "recent_24h",
        ReconcileScope::Recent7days => "recent_7days",
    };

    let scenes = rt.source.find_scenes(filter).await?;
    let libraries = resolve_libraries(rt).await?;
    let detector = GapDetector::new(rt.config.skip_missing_detector);
    let enqueuer = ReconciliationEnqueuer::new(&rt.queue);

    let mut gaps = Vec::new();
    let mut enqueued_this_run = HashSet::new();
    let mut enqueued_count = 0u64;
    let is_startup_run = rt.reconcile_scheduler.is_startup_due(now);

    for scene in &scenes {
        let snapshot = to_snapshot(scene);
        let sync_timestamp = rt.sync_timestamps.get(scene.id);
        let (target_has_match, target_is_empty) = probe_target_match(rt, &libraries, scene).await;

        if let Some(gap) = detector.detect(scene, &snapshot, target_has_match, target_is_empty, sync_timestamp) {
            if enqueuer.maybe_enqueue(scene, sync_timestamp, &mut enqueued_this_run, now) {
                enqueued_count += 1;
            }
            gaps.push(gap);
        }
    }

    rt.reconcile_scheduler.record_run(scope_name, &gaps, enqueued_count, scenes.len() as u64, is_startup_run, now);
    tracing::info!(scope = scope_name, scenes_checked = scenes.len(), gaps = gaps.len(), enqueued = enqueued_count, "reconciliation pass complete");
    Ok(())
}

async fn resolve_libraries(rt: &Runtime) -> Result<Vec<LibraryRef>, DispatchError> {
    if rt.config.library_list.is_empty() {
        return Ok(rt.target.sections().await?);
    }
    let mut libraries = Vec::with_capacity(rt.config.library_list.len());
    for name in &rt.config.library_list {
        if let Some(library) = rt.target.section(name).await? {
            libraries.push(library);
        }
    }
    Ok(libraries)
}

/// Whether `scene` already has a Target match, and whether that match's
/// fields carry no meaningful metadata.
async fn probe_target_match(rt: &Runtime, libraries: &[LibraryRef], scene: &SourceScene) -> (bool, bool) {
    let Some(path) = scene.path.as_deref().filter(|p| !p.is_empty()) else {
        return (false, false);
    };
    let matcher = Matcher::new(rt.target.as_ref());
    for library in libraries {
        let Ok(result) = matcher.find(library, path).await else { continue };
        let Some(first) = result.candidates.first() else { continue };
        if let Ok(item) = rt.target.get_item(&first.item_id).await {
            return (true, target_item_is_empty(&item));
        }
    }
    (false, false)
}

fn target_item_is_empty(item: &TargetItem) -> bool {
    item.fields.values().all(|v| match v {
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Null => true,
        _ => false,
    })
}

fn iso8601(unix_secs: f64) -> String {
    chrono::DateTime::from_timestamp(unix_secs as i64, 0).map(|dt| dt.to_rfc3339()).unwrap_or_default()
}

#[cfg(test)]
#[path = "modes_tests.rs"]
mod tests;
