//! The pending-task queue.
//!
//! An in-memory ordered collection of `SyncTask`s with single-writer
//! discipline: the engine serializes all mutations relative to an
//! in-flight drain. A drain iterates a snapshot of task ids taken up
//! front (`drain_order`), so tasks added mid-drain wait for the next
//! drain rather than being injected into the current one.

use outpost_types::{Priority, SyncTask, TaskDraft, TaskId, TaskKind, TaskStatus, UnixMillis};
use std::collections::HashMap;
use tracing::debug;

/// Per-dimension task counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQueueStats {
    /// Counts by task kind.
    pub by_kind: HashMap<TaskKind, usize>,
    /// Counts by priority.
    pub by_priority: HashMap<Priority, usize>,
    /// Counts by lifecycle status.
    pub by_status: HashMap<TaskStatus, usize>,
}

/// Ordered collection of pending sync tasks.
///
/// Drain order is priority (`high` before `medium` before `low`), then
/// insertion order within a priority level. This ordering is
/// deterministic: ties on creation time preserve insertion order.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: HashMap<TaskId, SyncTask>,
    /// Insertion order of live task ids.
    order: Vec<TaskId>,
}

impl TaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a draft, assigning id, creation time and a zeroed retry
    /// counter. Returns the assigned id.
    pub fn insert(&mut self, draft: TaskDraft) -> TaskId {
        let id = TaskId::new();
        let task = draft.into_task(id, UnixMillis::now());
        debug!(task_id = %id, priority = ?task.priority, "task queued");
        self.tasks.insert(id, task);
        self.order.push(id);
        id
    }

    /// Inserts a batch of drafts in order. Returns the assigned ids.
    pub fn insert_many(&mut self, drafts: Vec<TaskDraft>) -> Vec<TaskId> {
        drafts.into_iter().map(|d| self.insert(d)).collect()
    }

    /// Removes a task. Returns `false` if the id is unknown.
    pub fn remove(&mut self, id: &TaskId) -> bool {
        if self.tasks.remove(id).is_some() {
            self.order.retain(|t| t != id);
            true
        } else {
            false
        }
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&SyncTask> {
        self.tasks.get(id)
    }

    /// Looks up a task by id, mutably.
    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut SyncTask> {
        self.tasks.get_mut(id)
    }

    /// Removes every task.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.order.clear();
    }

    /// Number of live tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Snapshot of task ids in drain order: priority rank ascending,
    /// insertion order within a rank (stable sort).
    #[must_use]
    pub fn drain_order(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .order
            .iter()
            .filter(|id| {
                self.tasks
                    .get(id)
                    .is_some_and(|t| t.status == TaskStatus::Pending)
            })
            .copied()
            .collect();
        ids.sort_by_key(|id| self.tasks[id].priority.rank());
        ids
    }

    /// Per-dimension counts for the live queue.
    #[must_use]
    pub fn stats(&self) -> TaskQueueStats {
        let mut stats = TaskQueueStats::default();
        for task in self.tasks.values() {
            *stats.by_kind.entry(task.kind).or_insert(0) += 1;
            *stats.by_priority.entry(task.priority).or_insert(0) += 1;
            *stats.by_status.entry(task.status).or_insert(0) += 1;
        }
        stats
    }

    /// Removes tasks queued longer than `max_age_ms` as of `now`.
    /// Returns how many were removed.
    pub fn cleanup_expired(&mut self, now: UnixMillis, max_age_ms: u64) -> usize {
        let expired: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.is_expired(now, max_age_ms))
            .map(|t| t.id)
            .collect();
        for id in &expired {
            self.remove(id);
        }
        expired.len()
    }

    /// All live tasks in insertion order, for persistence.
    #[must_use]
    pub fn snapshot_tasks(&self) -> Vec<SyncTask> {
        self.order
            .iter()
            .filter_map(|id| self.tasks.get(id).cloned())
            .collect()
    }

    /// Rebuilds the queue from a persisted snapshot, preserving ids,
    /// creation times and retry counts. Tasks persisted mid-drain come
    /// back as pending; a crash must not strand them in-flight.
    pub fn restore(&mut self, tasks: Vec<SyncTask>) {
        self.clear();
        for mut task in tasks {
            if task.status == TaskStatus::InFlight {
                task.status = TaskStatus::Pending;
            }
            self.order.push(task.id);
            self.tasks.insert(task.id, task);
        }
    }
}
