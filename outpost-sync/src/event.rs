//! Engine notifications.
//!
//! Adapters (hooks, CLIs, test harnesses) subscribe via
//! `SyncEngine::subscribe` and receive these over a broadcast channel.
//! Dead-letter events are emitted exactly once per dead-lettered task
//! and are never suppressed; progress events honor
//! `SyncConfig::notify_on_update`.

use outpost_types::{ConflictResolution, SyncStatus, SyncTask, TaskId};

/// One drain pass, summarized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainReport {
    /// Tasks the drain attempted to deliver.
    pub attempted: usize,
    /// Tasks delivered successfully.
    pub completed: usize,
    /// Tasks whose final attempt failed (dead-lettered or change-flush
    /// failures).
    pub failed: usize,
    /// Tasks that exhausted their retry budget.
    pub dead_lettered: usize,
    /// Conflicts routed through the resolver.
    pub conflicts_resolved: usize,
    /// Compacted changes flushed successfully.
    pub changes_flushed: usize,
    /// The drain did not run because the engine was offline.
    pub offline: bool,
    /// A scheduler-level fault aborted the drain (e.g. persistence).
    pub fatal_error: Option<String>,
}

/// Events surfaced to subscribers.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Connectivity came up.
    Online,
    /// Connectivity went down.
    Offline,
    /// The scheduler state changed.
    StatusChanged(SyncStatus),
    /// A task was delivered successfully.
    TaskCompleted(TaskId),
    /// A task exhausted its retry budget. Emitted exactly once per
    /// task; the task has already left the active queue.
    TaskDeadLettered {
        /// The dead-lettered task, for manual re-submission.
        task: SyncTask,
        /// Total delivery attempts made.
        attempts: u32,
    },
    /// A conflict was resolved (or rejected) during a drain.
    ConflictResolved {
        /// The task whose delivery conflicted.
        task_id: TaskId,
        /// The resolution record.
        resolution: ConflictResolution,
    },
    /// A drain finished.
    DrainFinished(DrainReport),
}
