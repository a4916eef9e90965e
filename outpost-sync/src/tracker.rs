//! Incremental change tracking with compaction.
//!
//! Keeps at most one pending `SyncItem` per logical key. A new change
//! to a key that already has a pending item replaces the payload, bumps
//! the version and refreshes the timestamp; no history is retained for
//! uncommitted changes. Versions are monotonic per key across syncs.

use outpost_types::{SyncItem, UnixMillis};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Summary of the tracker's progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerState {
    /// When the pending changes were last flushed.
    pub last_sync_time: Option<UnixMillis>,
    /// Number of keys with a pending change.
    pub pending_changes: usize,
}

/// Per-key versioned change log with compaction.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    pending: HashMap<String, SyncItem>,
    /// Insertion order of keys with a pending change.
    order: Vec<String>,
    /// Highest version ever assigned per key; survives successful syncs
    /// so versions stay monotonic.
    versions: HashMap<String, u64>,
    last_sync_time: Option<UnixMillis>,
}

impl ChangeTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a change. A change to a key with a pending item compacts
    /// into it. Returns the stored item.
    pub fn add_change(&mut self, key: impl Into<String>, payload: Value) -> SyncItem {
        let key = key.into();
        let version = self
            .versions
            .entry(key.clone())
            .and_modify(|v| *v += 1)
            .or_insert(1);
        let item = SyncItem::new(key.clone(), payload, UnixMillis::now(), *version);

        if self.pending.insert(key.clone(), item.clone()).is_none() {
            self.order.push(key.clone());
        } else {
            debug!(key = %key, version = item.version, "change compacted");
        }
        item
    }

    /// Records a batch of changes in order.
    pub fn add_batch(&mut self, changes: Vec<(String, Value)>) -> Vec<SyncItem> {
        changes
            .into_iter()
            .map(|(key, payload)| self.add_change(key, payload))
            .collect()
    }

    /// Pending items in insertion order.
    #[must_use]
    pub fn pending(&self) -> Vec<SyncItem> {
        self.order
            .iter()
            .filter_map(|key| self.pending.get(key).cloned())
            .collect()
    }

    /// Number of keys with a pending change.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Marks one key as synced, dropping its pending item. The version
    /// counter is retained so future changes keep increasing it.
    pub fn mark_synced(&mut self, key: &str) -> bool {
        if self.pending.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    /// Drops every pending change.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.order.clear();
    }

    /// Progress summary.
    #[must_use]
    pub fn state(&self) -> TrackerState {
        TrackerState {
            last_sync_time: self.last_sync_time,
            pending_changes: self.pending.len(),
        }
    }

    /// Records when the last flush finished.
    pub fn set_last_sync_time(&mut self, time: UnixMillis) {
        self.last_sync_time = Some(time);
    }

    /// When the last flush finished.
    #[must_use]
    pub fn last_sync_time(&self) -> Option<UnixMillis> {
        self.last_sync_time
    }

    /// Rebuilds the tracker from persisted items, restoring version
    /// counters from the items themselves.
    pub fn restore(&mut self, items: Vec<SyncItem>, last_sync_time: Option<UnixMillis>) {
        self.clear();
        self.last_sync_time = last_sync_time;
        for item in items {
            let counter = self.versions.entry(item.key.clone()).or_insert(0);
            *counter = (*counter).max(item.version);
            self.order.push(item.key.clone());
            self.pending.insert(item.key.clone(), item);
        }
    }
}
