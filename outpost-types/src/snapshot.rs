//! Persisted queue snapshot.
//!
//! The snapshot is the single source of truth across process restarts:
//! the in-memory queue and change tracker are rebuilt from it on
//! `initialize`. It must round-trip losslessly through save/load.

use crate::{SyncItem, SyncTask, UnixMillis};
use serde::{Deserialize, Serialize};

/// Durable image of all pending work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Pending tasks in insertion order.
    #[serde(default)]
    pub tasks: Vec<SyncTask>,
    /// Pending compacted changes in insertion order.
    #[serde(default)]
    pub changes: Vec<SyncItem>,
    /// When the last drain finished.
    #[serde(default)]
    pub last_sync_time: Option<UnixMillis>,
}

impl QueueSnapshot {
    /// Whether the snapshot holds no pending work.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.changes.is_empty()
    }
}
