use super::*;
use ssync_core::error::ErrorKind;
use ssync_core::model::UpdateType;
use std::collections::HashMap as StdHashMap;
use tempfile::tempdir;

fn job(scene_id: u64) -> SyncJob {
    SyncJob::new(scene_id, UpdateType::Metadata, StdHashMap::new(), 1_000.0)
}

#[test]
fn enqueue_then_get_pending_returns_the_job_in_progress() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();

    let id = queue.enqueue(job(42)).unwrap();
    let item = queue.get_pending(1_000.0).unwrap().expect("one item ready");

    assert_eq!(item.id, id);
    assert_eq!(item.status, QueueItemStatus::InProgress);
    assert_eq!(item.payload.scene_id, 42);
}

#[test]
fn get_pending_returns_none_when_empty() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();
    assert!(queue.get_pending(1_000.0).unwrap().is_none());
}

#[test]
fn get_pending_is_fifo_by_enqueue_order() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();

    let first = queue.enqueue(job(1)).unwrap();
    let _second = queue.enqueue(job(2)).unwrap();

    let dequeued = queue.get_pending(1_000.0).unwrap().unwrap();
    assert_eq!(dequeued.id, first);
}

#[test]
fn get_pending_skips_a_not_yet_due_retry_and_reaches_the_next_ready_row() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();

    let original_id = queue.enqueue(job(1)).unwrap();
    let mut retried = job(1);
    retried.prepare_for_retry(ErrorKind::NotFound, 10_000.0);
    queue.requeue_with_metadata(&original_id, retried).unwrap();

    let later_id = queue.enqueue(job(2)).unwrap();

    // The retried row is older (enqueued first) but not due until 10_000.0;
    // "now" is well before that, so it must be skipped in favor of the
    // younger row that is already due.
    let dequeued = queue.get_pending(1_500.0).unwrap().unwrap();
    assert_eq!(dequeued.id, later_id);
}

#[test]
fn ack_marks_item_completed_and_clears_pending_counts() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();
    let id = queue.enqueue(job(7)).unwrap();
    queue.get_pending(1_000.0).unwrap();

    queue.ack(&id).unwrap();
    let stats = queue.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.in_progress, 0);
}

#[test]
fn nack_returns_item_to_ready_for_redelivery() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();
    let id = queue.enqueue(job(9)).unwrap();
    queue.get_pending(1_000.0).unwrap();

    queue.nack(&id).unwrap();
    assert_eq!(queue.stats().pending, 1);

    let redelivered = queue.get_pending(1_000.0).unwrap().unwrap();
    assert_eq!(redelivered.id, id);
}

#[test]
fn ack_failed_marks_item_failed_and_excludes_from_active_scene_ids() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();
    let id = queue.enqueue(job(3)).unwrap();
    queue.get_pending(1_000.0).unwrap();
    queue.ack_failed(&id).unwrap();

    assert_eq!(queue.stats().failed, 1);
    assert!(!queue.active_scene_ids(2_000.0, 3600.0).contains(&3));
}

#[test]
fn requeue_with_metadata_acks_old_row_and_enqueues_a_fresh_one() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();
    let id = queue.enqueue(job(5)).unwrap();

    let mut retried = job(5);
    retried.prepare_for_retry(ErrorKind::Transient, 2_000.0);
    let new_id = queue.requeue_with_metadata(&id, retried).unwrap();

    assert_ne!(id, new_id);
    let stats = queue.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pending, 1);
}

#[test]
fn active_scene_ids_includes_recently_completed_within_window() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();
    let id = queue.enqueue(job(11)).unwrap();
    queue.get_pending(1_000.0).unwrap();
    queue.ack(&id).unwrap();

    let now = 1_000.0 + 5.0;
    assert!(queue.active_scene_ids(now, 3600.0).contains(&11));
    assert!(!queue.active_scene_ids(now + 4_000.0, 3600.0).contains(&11));
}

#[test]
fn has_active_job_for_scene_is_true_only_while_unterminated() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();
    let id = queue.enqueue(job(21)).unwrap();

    assert!(queue.has_active_job_for_scene(21));
    queue.get_pending(1_000.0).unwrap();
    queue.ack(&id).unwrap();
    assert!(!queue.has_active_job_for_scene(21));
}

#[test]
fn prune_pending_removes_ready_and_in_progress_rows_only() {
    let dir = tempdir().unwrap();
    let queue = Queue::open(dir.path()).unwrap();
    let first_id = queue.enqueue(job(1)).unwrap();
    let _second_id = queue.enqueue(job(2)).unwrap();
    let third_id = queue.enqueue(job(3)).unwrap();

    // FIFO: the first row enqueued is the one dequeued into InProgress.
    let dequeued = queue.get_pending(1_000.0).unwrap().unwrap();
    assert_eq!(dequeued.id, first_id);

    // ack() doesn't require a prior dequeue; third_id goes Ready -> Completed directly.
    queue.ack(&third_id).unwrap();

    let pruned = queue.prune_pending().unwrap();
    assert_eq!(pruned, 2); // first_id (InProgress) and _second_id (still Ready)
    assert_eq!(queue.stats().pending, 0);
    assert_eq!(queue.stats().completed, 1);
}

#[test]
fn prune_pending_survives_a_reopen() {
    let dir = tempdir().unwrap();
    {
        let queue = Queue::open(dir.path()).unwrap();
        queue.enqueue(job(1)).unwrap();
        queue.prune_pending().unwrap();
    }
    let reopened = Queue::open(dir.path()).unwrap();
    assert_eq!(reopened.stats().pending, 0);
}

#[test]
fn reopening_queue_after_checkpoint_preserves_state() {
    let dir = tempdir().unwrap();
    {
        let queue = Queue::open(dir.path()).unwrap();
        queue.enqueue(job(99)).unwrap();
        queue.checkpoint().unwrap();
    }

    let reopened = Queue::open(dir.path()).unwrap();
    assert!(reopened.has_active_job_for_scene(99));
    assert_eq!(reopened.stats().pending, 1);
}

#[test]
fn reopening_queue_replays_wal_entries_written_after_checkpoint() {
    let dir = tempdir().unwrap();
    {
        let queue = Queue::open(dir.path()).unwrap();
        queue.enqueue(job(1)).unwrap();
        queue.checkpoint().unwrap();
        queue.enqueue(job(2)).unwrap();
    }

    let reopened = Queue::open(dir.path()).unwrap();
    assert_eq!(reopened.stats().pending, 2);
}
