//! Engine status and counters.

use crate::UnixMillis;
use serde::{Deserialize, Serialize};

/// The scheduler-level state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// No pending work, not currently syncing.
    Idle,
    /// A drain is in flight.
    Syncing,
    /// The network monitor reports disconnected.
    Offline,
    /// The last drain failed at the scheduler level (e.g. a persistence
    /// fault). Requires an explicit `start_sync` to resume.
    Error,
}

/// Aggregate counters surfaced to adapters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Tasks currently waiting in the queue.
    pub pending_tasks: usize,
    /// Tasks delivered successfully since the engine started.
    pub completed: u64,
    /// Tasks dead-lettered since the engine started.
    pub failed: u64,
    /// When the last drain finished.
    pub last_sync_time: Option<UnixMillis>,
}
