use outpost_sync::ChangeTracker;
use outpost_types::UnixMillis;
use serde_json::json;

// ── Compaction ───────────────────────────────────────────────────

#[test]
fn first_change_gets_version_one() {
    let mut tracker = ChangeTracker::new();
    let item = tracker.add_change("note:1", json!({"title": "a"}));
    assert_eq!(item.version, 1);
    assert_eq!(tracker.pending_count(), 1);
}

#[test]
fn repeat_change_compacts_into_one_item() {
    let mut tracker = ChangeTracker::new();
    let first = tracker.add_change("note:1", json!({"title": "a"}));
    let second = tracker.add_change("note:1", json!({"title": "b"}));

    // One pending item, latest payload, version bumped by exactly one.
    assert_eq!(tracker.pending_count(), 1);
    let pending = tracker.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload, json!({"title": "b"}));
    assert_eq!(second.version, first.version + 1);
    assert!(second.timestamp >= first.timestamp);
}

#[test]
fn distinct_keys_do_not_compact() {
    let mut tracker = ChangeTracker::new();
    tracker.add_change("note:1", json!({"a": 1}));
    tracker.add_change("note:2", json!({"b": 2}));
    assert_eq!(tracker.pending_count(), 2);
}

#[test]
fn versions_stay_monotonic_across_syncs() {
    let mut tracker = ChangeTracker::new();
    tracker.add_change("note:1", json!({"a": 1}));
    tracker.mark_synced("note:1");
    let item = tracker.add_change("note:1", json!({"a": 2}));
    assert_eq!(item.version, 2);
}

// ── Ordering ─────────────────────────────────────────────────────

#[test]
fn pending_preserves_first_insertion_order() {
    let mut tracker = ChangeTracker::new();
    tracker.add_change("b", json!(1));
    tracker.add_change("a", json!(2));
    tracker.add_change("b", json!(3)); // compaction keeps b's slot

    let keys: Vec<String> = tracker.pending().into_iter().map(|i| i.key).collect();
    assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
}

// ── Batch ────────────────────────────────────────────────────────

#[test]
fn batch_applies_in_order_with_compaction() {
    let mut tracker = ChangeTracker::new();
    let items = tracker.add_batch(vec![
        ("k".to_string(), json!({"n": 1})),
        ("k".to_string(), json!({"n": 2})),
        ("other".to_string(), json!({"n": 3})),
    ]);
    assert_eq!(items.len(), 3);
    assert_eq!(tracker.pending_count(), 2);
    assert_eq!(tracker.pending()[0].payload, json!({"n": 2}));
}

// ── Sync bookkeeping ─────────────────────────────────────────────

#[test]
fn mark_synced_drops_pending_item() {
    let mut tracker = ChangeTracker::new();
    tracker.add_change("k", json!(1));
    assert!(tracker.mark_synced("k"));
    assert_eq!(tracker.pending_count(), 0);
    assert!(!tracker.mark_synced("k"));
}

#[test]
fn state_reports_progress() {
    let mut tracker = ChangeTracker::new();
    assert_eq!(tracker.state().pending_changes, 0);
    assert!(tracker.state().last_sync_time.is_none());

    tracker.add_change("k", json!(1));
    tracker.set_last_sync_time(UnixMillis::from_millis(42));

    let state = tracker.state();
    assert_eq!(state.pending_changes, 1);
    assert_eq!(state.last_sync_time, Some(UnixMillis::from_millis(42)));
}

#[test]
fn clear_drops_everything_pending() {
    let mut tracker = ChangeTracker::new();
    tracker.add_change("a", json!(1));
    tracker.add_change("b", json!(2));
    tracker.clear();
    assert_eq!(tracker.pending_count(), 0);
}

// ── Restore ──────────────────────────────────────────────────────

#[test]
fn restore_rebuilds_pending_and_version_counters() {
    let mut tracker = ChangeTracker::new();
    tracker.add_change("k", json!(1));
    tracker.add_change("k", json!(2));
    let items = tracker.pending();

    let mut restored = ChangeTracker::new();
    restored.restore(items, Some(UnixMillis::from_millis(9)));

    assert_eq!(restored.pending_count(), 1);
    assert_eq!(restored.last_sync_time(), Some(UnixMillis::from_millis(9)));

    // Versions continue from the restored counter, not from 1.
    let next = restored.add_change("k", json!(3));
    assert_eq!(next.version, 3);
}
