use super::*;
use std::sync::Arc;

use tempfile::tempdir;

use ssync_core::clock::SystemClock;
use ssync_core::config::ReconcileInterval;
use ssync_resilience::{CircuitBreaker, OutageHistory, RecoveryRateLimiter, RecoveryScheduler};
use ssync_storage::{Dlq, Queue, StatsStore, SyncTimestampStore};
use ssync_sync::adapters::SourceScene;
use ssync_sync::fakes::{self, FakeSourceApi, FakeTargetApi};
use ssync_sync::reconciliation::AutoReconciliationScheduler;

fn test_config() -> PluginConfig {
    PluginConfig {
        target_url: "http://target.local".to_string(),
        target_token: "0123456789".to_string(),
        enabled: true,
        max_retries: 5,
        poll_interval: 1.0,
        connect_timeout_secs: 5.0,
        read_timeout_secs: 30.0,
        dlq_retention_days: 30,
        library_list: Vec::new(),
        strict_matching: false,
        preserve_target_edits: false,
        tag_limit: 100,
        skip_missing_detector: false,
        reconcile_interval: ReconcileInterval::Never,
        reconcile_scope: ssync_core::config::ReconcileScope::All,
        debug_logging: false,
        path_obfuscation: false,
    }
}

fn scene(id: u64) -> SourceScene {
    SourceScene {
        id,
        title: Some("Hello".to_string()),
        path: Some("/media/videos/hello.mp4".to_string()),
        studio: None,
        performers: Vec::new(),
        tags: Vec::new(),
        details: None,
        date: None,
        rating100: None,
        poster_url: None,
        background_url: None,
        created_at: None,
        updated_at: None,
    }
}

fn build_runtime(dir: &std::path::Path, source: Arc<FakeSourceApi>, target: Arc<FakeTargetApi>) -> Runtime<SystemClock> {
    let clock = SystemClock;
    Runtime {
        queue: Queue::open(dir).unwrap_or_else(|e| panic!("queue: {e}")),
        dlq: Dlq::open(dir).unwrap_or_else(|e| panic!("dlq: {e}")),
        circuit: CircuitBreaker::new(clock.clone(), None, None),
        recovery: RecoveryScheduler::new(dir),
        rate_limiter: RecoveryRateLimiter::new(),
        sync_timestamps: SyncTimestampStore::open(dir),
        outage_history: OutageHistory::open(dir),
        reconcile_scheduler: AutoReconciliationScheduler::open(dir),
        stats_store: StatsStore::open(dir),
        config: test_config(),
        clock,
        target,
        source,
    }
}

fn hook(kind: &str, id: u64) -> HookContext {
    HookContext { kind: kind.to_string(), id, input: serde_json::json!({"title": "Hello"}) }
}

#[tokio::test]
async fn handle_hook_skips_enqueue_when_scene_already_has_an_active_row() {
    let dir = tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let source = Arc::new(FakeSourceApi::new().with_scene(scene(42)));
    let target_item = fakes::target_item("801", "hello", vec!["/media/videos/hello.mp4"]);
    let target = Arc::new(FakeTargetApi::new().with_item("hello", target_item));
    let rt = build_runtime(dir.path(), source, target);

    // Simulate a row left behind by an earlier invocation (e.g. its
    // process exited before the drain finished): already Ready/InProgress
    // for the same scene, with no matching event in `HookDedup` (which is
    // fresh per process and would never have seen it).
    let mut stuck_data = std::collections::HashMap::new();
    stuck_data.insert("title".to_string(), serde_json::json!("Hello"));
    stuck_data.insert("path".to_string(), serde_json::json!("/media/videos/hello.mp4"));
    let stuck = rt
        .queue
        .enqueue(SyncJob::new(42, UpdateType::Metadata, stuck_data, rt.clock.now_secs()))
        .unwrap_or_else(|e| panic!("enqueue stuck: {e}"));
    assert!(rt.queue.has_active_job_for_scene(42));

    handle_hook(&rt, &hook(HookContext::SCENE_UPDATE_POST, 42)).await.unwrap_or_else(|e| panic!("hook: {e}"));

    // The drain still processes the pre-existing `stuck` row to
    // completion; no *second* row was enqueued for scene 42 by the hook.
    let scene_42_rows = [rt.queue.stats().pending, rt.queue.stats().in_progress, rt.queue.stats().completed, rt.queue.stats().failed]
        .iter()
        .sum::<usize>();
    assert_eq!(scene_42_rows, 1);
    assert_eq!(rt.queue.stats().completed, 1);
    assert_eq!(rt.dlq.len(), 0);
    let _ = stuck;
}

#[tokio::test]
async fn handle_hook_enqueues_when_no_active_row_exists() {
    let dir = tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let source = Arc::new(FakeSourceApi::new().with_scene(scene(7)));
    let target_item = fakes::target_item("802", "hello", vec!["/media/videos/hello.mp4"]);
    let target = Arc::new(FakeTargetApi::new().with_item("hello", target_item));
    let rt = build_runtime(dir.path(), source, target);

    handle_hook(&rt, &hook(HookContext::SCENE_UPDATE_POST, 7)).await.unwrap_or_else(|e| panic!("hook: {e}"));

    assert_eq!(rt.queue.stats().completed, 1);
}
