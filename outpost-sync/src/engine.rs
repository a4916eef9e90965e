//! The sync engine — owns the scheduler state machine and composes the
//! queue, change tracker, resolver, monitor, store and transport.
//!
//! One engine instance per storage namespace. Everything is injected:
//! no module-level state, so tests run isolated engines side by side.
//!
//! # Drain discipline
//!
//! At most one drain is active at a time. `start_sync` while a drain is
//! in flight joins that drain and returns its report instead of
//! starting a second one. A drain iterates a snapshot of task ids taken
//! up front, so tasks added mid-drain wait for the next drain. Requests
//! are issued in priority-then-FIFO order with at most
//! `max_concurrent_requests` in flight.

use crate::error::{SyncError, SyncResult};
use crate::event::{DrainReport, SyncEvent};
use crate::network::NetworkMonitor;
use crate::persist::SnapshotStore;
use crate::queue::{TaskQueue, TaskQueueStats};
use crate::resolver::{ConflictResolver, CustomResolverFn};
use crate::retry::RetryPolicy;
use crate::tracker::{ChangeTracker, TrackerState};
use crate::transport::{SyncTransport, TaskReply};
use futures::stream::{self, StreamExt};
use outpost_types::{
    ConflictOutcome, ConflictResolution, ConflictStrategy, QueueSnapshot, SyncConfig, SyncItem,
    SyncStats, SyncStatus, SyncTask, TaskDraft, TaskId, TaskStatus, UnixMillis,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Broadcast capacity for engine events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Outcome of processing one task during a drain.
enum TaskOutcome {
    /// Delivered; remove from the queue.
    Completed { id: TaskId, conflicts: usize },
    /// Retry budget exhausted; remove and report once.
    DeadLettered {
        task: SyncTask,
        attempts: u32,
        conflicts: usize,
    },
    /// Went offline before the task started; stays queued with its
    /// retry progress written back.
    Skipped { id: TaskId, retry_count: u32 },
}

/// Outcome of flushing one compacted change.
enum ChangeOutcome {
    Flushed { conflicts: usize },
    Failed { conflicts: usize },
}

/// The offline-first background synchronization engine.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: RwLock<SyncConfig>,
    queue: RwLock<TaskQueue>,
    tracker: RwLock<ChangeTracker>,
    resolver: ConflictResolver,
    monitor: Arc<dyn NetworkMonitor>,
    store: Arc<dyn SnapshotStore>,
    transport: Arc<dyn SyncTransport>,
    status: RwLock<SyncStatus>,
    completed: AtomicU64,
    failed: AtomicU64,
    last_sync_time: RwLock<Option<UnixMillis>>,
    last_error: RwLock<Option<String>>,
    /// Join handle for the in-flight drain's report. `Some` while a
    /// drain is active; joiners clone the receiver and await it.
    drain_slot: Mutex<Option<watch::Receiver<Option<DrainReport>>>>,
    events: broadcast::Sender<SyncEvent>,
    /// Wakes the auto-sync loop when work arrives.
    kick: Notify,
    auto_enabled: AtomicBool,
    auto_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    /// Creates an engine from injected collaborators. Call
    /// [`SyncEngine::initialize`] to rebuild state from the snapshot
    /// store, then [`SyncEngine::start`] to begin auto-sync.
    #[must_use]
    pub fn new(
        config: SyncConfig,
        monitor: Arc<dyn NetworkMonitor>,
        store: Arc<dyn SnapshotStore>,
        transport: Arc<dyn SyncTransport>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(EngineInner {
                config: RwLock::new(config),
                queue: RwLock::new(TaskQueue::new()),
                tracker: RwLock::new(ChangeTracker::new()),
                resolver: ConflictResolver::new(),
                monitor,
                store,
                transport,
                status: RwLock::new(SyncStatus::Idle),
                completed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                last_sync_time: RwLock::new(None),
                last_error: RwLock::new(None),
                drain_slot: Mutex::new(None),
                events,
                kick: Notify::new(),
                auto_enabled: AtomicBool::new(true),
                auto_handle: Mutex::new(None),
            }),
        }
    }

    /// Rebuilds the queue and change tracker from the persisted
    /// snapshot. The snapshot is the source of truth across restarts.
    pub async fn initialize(&self) -> SyncResult<()> {
        if let Some(snapshot) = self.inner.store.load().await? {
            info!(
                tasks = snapshot.tasks.len(),
                changes = snapshot.changes.len(),
                "restoring persisted snapshot"
            );
            self.inner.queue.write().await.restore(snapshot.tasks);
            self.inner
                .tracker
                .write()
                .await
                .restore(snapshot.changes, snapshot.last_sync_time);
            *self.inner.last_sync_time.write().await = snapshot.last_sync_time;
        }
        let status = if self.inner.monitor.is_online() {
            SyncStatus::Idle
        } else {
            SyncStatus::Offline
        };
        self.inner.set_status(status).await;
        Ok(())
    }

    /// Starts the network monitor and the auto-sync loop (interval
    /// timer plus online-edge triggers, gated by `auto_sync`).
    pub async fn start(&self) -> SyncResult<()> {
        self.inner.monitor.start().await?;
        let mut handle = self.inner.auto_handle.lock().await;
        if handle.is_none() {
            let inner = self.inner.clone();
            *handle = Some(tokio::spawn(async move {
                EngineInner::auto_loop(inner).await;
            }));
        }
        Ok(())
    }

    /// Disables timer- and online-triggered drains. Does not cancel an
    /// in-flight drain; active tasks run to completion or exhaust their
    /// retries.
    pub fn stop_auto_sync(&self) {
        self.inner.auto_enabled.store(false, Ordering::SeqCst);
        debug!("auto-sync disabled");
    }

    /// Re-enables timer- and online-triggered drains.
    pub fn resume_auto_sync(&self) {
        self.inner.auto_enabled.store(true, Ordering::SeqCst);
        self.inner.kick.notify_one();
    }

    /// Stops the auto-sync loop and the network monitor.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.inner.auto_handle.lock().await.take() {
            handle.abort();
        }
        self.inner.monitor.stop().await;
    }

    // ── Task queue operations ────────────────────────────────────

    /// Queues a task. Assigns the id and creation time, persists the
    /// snapshot before returning, and (when auto-sync applies) kicks a
    /// drain.
    pub async fn add_task(&self, draft: TaskDraft) -> SyncResult<TaskId> {
        let id = self.inner.queue.write().await.insert(draft);
        self.inner.persist_or_flag().await?;
        self.inner.kick.notify_one();
        Ok(id)
    }

    /// Queues a batch of tasks in order.
    pub async fn add_tasks(&self, drafts: Vec<TaskDraft>) -> SyncResult<Vec<TaskId>> {
        let ids = self.inner.queue.write().await.insert_many(drafts);
        self.inner.persist_or_flag().await?;
        self.inner.kick.notify_one();
        Ok(ids)
    }

    /// Removes a task. Returns `Ok(false)` if the id is unknown.
    pub async fn remove_task(&self, id: &TaskId) -> SyncResult<bool> {
        let removed = self.inner.queue.write().await.remove(id);
        if removed {
            self.inner.persist_or_flag().await?;
        }
        Ok(removed)
    }

    /// Looks up a task by id.
    pub async fn get_task(&self, id: &TaskId) -> Option<SyncTask> {
        self.inner.queue.read().await.get(id).cloned()
    }

    /// Empties the queue. The queue is empty as soon as this returns;
    /// the persistence flush is confirmed asynchronously and a failure
    /// there surfaces as engine `error` status.
    pub async fn clear_tasks(&self) {
        self.inner.queue.write().await.clear();
        if let Err(e) = self.inner.persist_or_flag().await {
            warn!("failed to persist cleared queue: {}", e);
        }
    }

    /// Per-dimension counts for the live queue.
    pub async fn task_stats(&self) -> TaskQueueStats {
        self.inner.queue.read().await.stats()
    }

    /// Removes tasks queued longer than `max_age_ms`. Returns how many
    /// were removed.
    pub async fn cleanup_expired_tasks(&self, max_age_ms: u64) -> SyncResult<usize> {
        let removed = self
            .inner
            .queue
            .write()
            .await
            .cleanup_expired(UnixMillis::now(), max_age_ms);
        if removed > 0 {
            info!(removed, "expired tasks cleaned up");
            self.inner.persist_or_flag().await?;
        }
        Ok(removed)
    }

    // ── Conflict resolution ──────────────────────────────────────

    /// Registers a custom resolver function under `key`.
    pub async fn add_custom_resolver(&self, key: impl Into<String>, resolver: CustomResolverFn) {
        self.inner.resolver.add_custom_resolver(key, resolver).await;
    }

    /// Removes a custom resolver. Returns `false` if unknown.
    pub async fn remove_custom_resolver(&self, key: &str) -> bool {
        self.inner.resolver.remove_custom_resolver(key).await
    }

    /// Sets the conflict strategy for a queued task. Returns `false`
    /// if the task id is unknown.
    pub async fn set_conflict_strategy(&self, id: &TaskId, strategy: ConflictStrategy) -> bool {
        let updated = match self.inner.queue.write().await.get_mut(id) {
            Some(task) => {
                task.conflict_strategy = Some(strategy);
                true
            }
            None => false,
        };
        if updated {
            if let Err(e) = self.inner.persist_or_flag().await {
                warn!(task_id = %id, "failed to persist strategy change: {}", e);
            }
        }
        updated
    }

    /// Side-effect-free strategy evaluation for previews and tests.
    /// Never touches the queue or persisted state.
    pub async fn test_conflict_resolution(
        &self,
        client: &Value,
        server: &Value,
        strategy: &ConflictStrategy,
    ) -> ConflictResolution {
        self.inner
            .resolver
            .test_resolution(client, server, strategy)
            .await
    }

    // ── Incremental changes ──────────────────────────────────────

    /// Records a change to a keyed resource. Repeat changes to the same
    /// key before a sync compact into one pending item.
    pub async fn add_change(&self, key: impl Into<String>, payload: Value) -> SyncResult<SyncItem> {
        let item = self.inner.tracker.write().await.add_change(key, payload);
        self.inner.persist_or_flag().await?;
        self.inner.kick.notify_one();
        Ok(item)
    }

    /// Records a batch of changes in order.
    pub async fn add_batch_changes(
        &self,
        changes: Vec<(String, Value)>,
    ) -> SyncResult<Vec<SyncItem>> {
        let items = self.inner.tracker.write().await.add_batch(changes);
        self.inner.persist_or_flag().await?;
        self.inner.kick.notify_one();
        Ok(items)
    }

    /// Tracker progress: last sync time and pending change count.
    pub async fn sync_state(&self) -> TrackerState {
        self.inner.tracker.read().await.state()
    }

    /// Immediately attempts a drain, bypassing `auto_sync` and timer
    /// gating. With nothing pending this is a no-op: no requests are
    /// issued and `last_sync_time` is unchanged. If a drain is already
    /// running it is joined, not doubled.
    pub async fn force_sync(&self) -> DrainReport {
        let has_tasks = !self.inner.queue.read().await.is_empty();
        let has_changes = self.inner.tracker.read().await.pending_count() > 0;
        if !has_tasks && !has_changes {
            debug!("force_sync with nothing pending, skipping");
            return DrainReport::default();
        }
        self.inner.clone().sync_now().await
    }

    // ── Scheduler ────────────────────────────────────────────────

    /// Starts a drain, or joins the drain already in flight. Both
    /// callers receive the same drain's report; the queue is never
    /// double-drained.
    pub async fn start_sync(&self) -> DrainReport {
        self.inner.clone().sync_now().await
    }

    /// Current scheduler state.
    pub async fn status(&self) -> SyncStatus {
        *self.inner.status.read().await
    }

    /// Aggregate counters.
    pub async fn stats(&self) -> SyncStats {
        SyncStats {
            pending_tasks: self.inner.queue.read().await.len(),
            completed: self.inner.completed.load(Ordering::SeqCst),
            failed: self.inner.failed.load(Ordering::SeqCst),
            last_sync_time: *self.inner.last_sync_time.read().await,
        }
    }

    /// Message for the last scheduler-level error, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.last_error.read().await.clone()
    }

    /// Replaces the runtime configuration.
    pub async fn update_config(&self, config: SyncConfig) {
        *self.inner.config.write().await = config;
        self.inner.kick.notify_one();
    }

    /// Current configuration.
    pub async fn config(&self) -> SyncConfig {
        self.inner.config.read().await.clone()
    }

    /// Subscribes to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }
}

impl EngineInner {
    /// The auto-sync loop: drains on online edges, explicit kicks and
    /// the configured interval, gated by `auto_sync` and the enable
    /// flag. A scheduler-level `error` status suspends auto drains
    /// until a manual `start_sync`.
    async fn auto_loop(inner: Arc<Self>) {
        let mut connectivity = inner.monitor.subscribe();
        loop {
            let interval_ms = inner.config.read().await.sync_interval_ms;
            tokio::select! {
                changed = connectivity.changed() => {
                    if changed.is_err() {
                        debug!("network monitor dropped, stopping auto-sync loop");
                        break;
                    }
                    let online = *connectivity.borrow_and_update();
                    if online {
                        inner.emit(SyncEvent::Online);
                        if inner.auto_allowed().await && inner.has_pending().await {
                            inner.clone().sync_now().await;
                        } else if *inner.status.read().await == SyncStatus::Offline {
                            inner.set_status(SyncStatus::Idle).await;
                        }
                    } else {
                        inner.emit(SyncEvent::Offline);
                        inner.set_status(SyncStatus::Offline).await;
                    }
                }
                _ = inner.kick.notified() => {
                    if inner.auto_allowed().await
                        && inner.monitor.is_online()
                        && inner.has_pending().await
                    {
                        inner.clone().sync_now().await;
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(interval_ms)) => {
                    if inner.auto_allowed().await
                        && inner.monitor.is_online()
                        && inner.has_pending().await
                    {
                        inner.clone().sync_now().await;
                    }
                }
            }
        }
    }

    async fn auto_allowed(&self) -> bool {
        self.auto_enabled.load(Ordering::SeqCst)
            && self.config.read().await.auto_sync
            && *self.status.read().await != SyncStatus::Error
    }

    async fn has_pending(&self) -> bool {
        !self.queue.read().await.is_empty() || self.tracker.read().await.pending_count() > 0
    }

    /// Runs a drain, or joins the one already in flight.
    ///
    /// The drain itself runs in a spawned task, so a caller dropping
    /// this future (timeout, shutdown) cannot orphan the drain or the
    /// slot that enforces the single-in-flight invariant.
    async fn sync_now(self: Arc<Self>) -> DrainReport {
        loop {
            let mut rx = {
                let mut slot = self.drain_slot.lock().await;
                if let Some(rx) = slot.as_ref() {
                    rx.clone()
                } else {
                    let (tx, rx) = watch::channel(None::<DrainReport>);
                    *slot = Some(rx.clone());
                    let inner = Arc::clone(&self);
                    tokio::spawn(async move {
                        let report = inner.run_drain().await;
                        *inner.drain_slot.lock().await = None;
                        let _ = tx.send(Some(report));
                    });
                    rx
                }
            };

            loop {
                if let Some(report) = rx.borrow_and_update().clone() {
                    return report;
                }
                if rx.changed().await.is_err() {
                    if let Some(report) = rx.borrow().clone() {
                        return report;
                    }
                    // The drainer died without reporting. Clear the
                    // stale slot, but only if it is still this drain's,
                    // then start over.
                    let mut slot = self.drain_slot.lock().await;
                    if slot.as_ref().is_some_and(|s| s.same_channel(&rx)) {
                        *slot = None;
                    }
                    drop(slot);
                    break;
                }
            }
        }
    }

    /// One full drain pass: queued tasks in priority-then-FIFO order
    /// with bounded concurrency, then compacted changes sequentially.
    async fn run_drain(&self) -> DrainReport {
        let mut report = DrainReport::default();

        if !self.monitor.is_online() {
            self.set_status(SyncStatus::Offline).await;
            report.offline = true;
            return report;
        }
        self.set_status(SyncStatus::Syncing).await;

        // Snapshot the task ids up front; tasks added mid-drain wait
        // for the next drain.
        let snapshot: Vec<SyncTask> = {
            let queue = self.queue.read().await;
            queue
                .drain_order()
                .iter()
                .filter_map(|id| queue.get(id).cloned())
                .collect()
        };
        report.attempted = snapshot.len();
        {
            let mut queue = self.queue.write().await;
            for task in &snapshot {
                if let Some(entry) = queue.get_mut(&task.id) {
                    entry.status = TaskStatus::InFlight;
                }
            }
        }
        let max_concurrent = self.config.read().await.max_concurrent_requests.max(1);
        info!(
            tasks = snapshot.len(),
            max_concurrent, "drain started"
        );

        let mut outcomes = stream::iter(snapshot.into_iter().map(|task| self.process_task(task)))
            .buffered(max_concurrent);
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                TaskOutcome::Completed { id, conflicts } => {
                    self.queue.write().await.remove(&id);
                    self.completed.fetch_add(1, Ordering::SeqCst);
                    report.completed += 1;
                    report.conflicts_resolved += conflicts;
                    self.emit_progress(SyncEvent::TaskCompleted(id)).await;
                }
                TaskOutcome::DeadLettered {
                    task,
                    attempts,
                    conflicts,
                } => {
                    self.queue.write().await.remove(&task.id);
                    self.failed.fetch_add(1, Ordering::SeqCst);
                    report.failed += 1;
                    report.dead_lettered += 1;
                    report.conflicts_resolved += conflicts;
                    warn!(task_id = %task.id, attempts, "task dead-lettered");
                    self.emit(SyncEvent::TaskDeadLettered { task, attempts });
                }
                TaskOutcome::Skipped { id, retry_count } => {
                    if let Some(task) = self.queue.write().await.get_mut(&id) {
                        task.retry_count = retry_count;
                        task.status = TaskStatus::Pending;
                    }
                }
            }
        }
        drop(outcomes);

        self.flush_changes(&mut report).await;

        let finished_at = UnixMillis::now();
        *self.last_sync_time.write().await = Some(finished_at);
        self.tracker.write().await.set_last_sync_time(finished_at);

        match self.persist().await {
            Ok(()) => {
                let next = if self.monitor.is_online() {
                    SyncStatus::Idle
                } else {
                    SyncStatus::Offline
                };
                self.set_status(next).await;
            }
            Err(e) => {
                warn!("drain persistence failed: {}", e);
                report.fatal_error = Some(e.to_string());
                *self.last_error.write().await = Some(e.to_string());
                self.set_status(SyncStatus::Error).await;
            }
        }

        info!(
            completed = report.completed,
            failed = report.failed,
            dead_lettered = report.dead_lettered,
            changes_flushed = report.changes_flushed,
            "drain finished"
        );
        self.emit(SyncEvent::DrainFinished(report.clone()));
        report
    }

    /// Delivers one task through its retry budget. Per-task failures
    /// never abort the drain; the caller aggregates them.
    async fn process_task(&self, mut task: SyncTask) -> TaskOutcome {
        let mut conflicts = 0;
        loop {
            // Going offline mid-drain prevents starting new attempts.
            if !self.monitor.is_online() {
                return TaskOutcome::Skipped {
                    id: task.id,
                    retry_count: task.retry_count,
                };
            }

            let failure = match self.transport.deliver(&task).await {
                Ok(TaskReply::Success) => {
                    return TaskOutcome::Completed {
                        id: task.id,
                        conflicts,
                    };
                }
                Ok(TaskReply::Conflict {
                    client_data,
                    server_data,
                }) => {
                    conflicts += 1;
                    match self
                        .handle_conflict(&task, &client_data, &server_data)
                        .await
                    {
                        ConflictStep::Done => {
                            return TaskOutcome::Completed {
                                id: task.id,
                                conflicts,
                            };
                        }
                        ConflictStep::Rejected => {
                            task.status = TaskStatus::DeadLettered;
                            return TaskOutcome::DeadLettered {
                                attempts: task.retry_count + 1,
                                task,
                                conflicts,
                            };
                        }
                        ConflictStep::ResubmitFailed(message) => message,
                    }
                }
                Ok(TaskReply::Failure { status, message }) => {
                    debug!(task_id = %task.id, ?status, "attempt failed: {}", message);
                    message
                }
                Err(e) => {
                    warn!(task_id = %task.id, "delivery error: {}", e);
                    e.to_string()
                }
            };

            if RetryPolicy::should_retry(task.retry_count, task.max_retries) {
                let delay = RetryPolicy::next_delay(task.retry_count, task.retry_delay_ms);
                task.retry_count += 1;
                debug!(
                    task_id = %task.id,
                    retry = task.retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "backing off: {}", failure
                );
                tokio::time::sleep(delay).await;
            } else {
                task.status = TaskStatus::DeadLettered;
                return TaskOutcome::DeadLettered {
                    attempts: task.retry_count + 1,
                    task,
                    conflicts,
                };
            }
        }
    }

    /// Resolves a conflict and re-submits the resolved value once. The
    /// conflict branch consumes no retry budget; a resubmission failure
    /// is charged to the surrounding attempt.
    async fn handle_conflict(
        &self,
        task: &SyncTask,
        client_data: &Value,
        server_data: &Value,
    ) -> ConflictStep {
        let strategy = task
            .conflict_strategy
            .clone()
            .unwrap_or_else(|| self.resolver.default_strategy().clone());
        let resolution = self
            .resolver
            .resolve(client_data, server_data, &strategy)
            .await;
        self.emit(SyncEvent::ConflictResolved {
            task_id: task.id,
            resolution: resolution.clone(),
        });

        if resolution.outcome == ConflictOutcome::Rejected {
            return ConflictStep::Rejected;
        }

        let mut resubmit = task.clone();
        resubmit.body = Some(resolution.resolved_value);
        match self.transport.deliver(&resubmit).await {
            Ok(TaskReply::Success) => ConflictStep::Done,
            Ok(TaskReply::Conflict { .. }) => {
                ConflictStep::ResubmitFailed("conflict persisted after resolution".to_string())
            }
            Ok(TaskReply::Failure { message, .. }) => ConflictStep::ResubmitFailed(message),
            Err(e) => ConflictStep::ResubmitFailed(e.to_string()),
        }
    }

    /// Flushes compacted changes sequentially through the transport.
    /// Failed items stay pending for the next drain.
    async fn flush_changes(&self, report: &mut DrainReport) {
        let pending = self.tracker.read().await.pending();
        if pending.is_empty() {
            return;
        }
        let Some(url) = self.config.read().await.changes_url.clone() else {
            warn!(
                pending = pending.len(),
                "pending changes but no changes endpoint configured"
            );
            return;
        };

        for item in pending {
            if !self.monitor.is_online() {
                break;
            }
            match self.push_change(&url, &item).await {
                ChangeOutcome::Flushed { conflicts } => {
                    self.tracker.write().await.mark_synced(&item.key);
                    report.changes_flushed += 1;
                    report.conflicts_resolved += conflicts;
                }
                ChangeOutcome::Failed { conflicts } => {
                    report.failed += 1;
                    report.conflicts_resolved += conflicts;
                }
            }
        }
    }

    /// Delivers one compacted change as an ephemeral data task.
    async fn push_change(&self, url: &str, item: &SyncItem) -> ChangeOutcome {
        let body = json!({
            "key": item.key,
            "payload": item.payload,
            "version": item.version,
            "timestamp": item.timestamp,
        });
        let task = TaskDraft::data(url)
            .body(body)
            .into_task(TaskId::new(), UnixMillis::now());

        match self.transport.deliver(&task).await {
            Ok(TaskReply::Success) => ChangeOutcome::Flushed { conflicts: 0 },
            Ok(TaskReply::Conflict {
                client_data,
                server_data,
            }) => {
                match self
                    .handle_conflict(&task, &client_data, &server_data)
                    .await
                {
                    ConflictStep::Done => ChangeOutcome::Flushed { conflicts: 1 },
                    _ => ChangeOutcome::Failed { conflicts: 1 },
                }
            }
            Ok(TaskReply::Failure { message, .. }) => {
                debug!(key = %item.key, "change flush failed: {}", message);
                ChangeOutcome::Failed { conflicts: 0 }
            }
            Err(e) => {
                warn!(key = %item.key, "change flush error: {}", e);
                ChangeOutcome::Failed { conflicts: 0 }
            }
        }
    }

    // ── Persistence ──────────────────────────────────────────────

    async fn persist(&self) -> SyncResult<()> {
        let snapshot = {
            let queue = self.queue.read().await;
            let tracker = self.tracker.read().await;
            QueueSnapshot {
                tasks: queue.snapshot_tasks(),
                changes: tracker.pending(),
                last_sync_time: *self.last_sync_time.read().await,
            }
        };
        self.store.save(&snapshot).await
    }

    /// Persists, flagging scheduler-level `error` status on failure.
    /// The in-memory queue is left intact as the last known good state.
    async fn persist_or_flag(&self) -> SyncResult<()> {
        match self.persist().await {
            Ok(()) => Ok(()),
            Err(e) => {
                *self.last_error.write().await = Some(e.to_string());
                self.set_status(SyncStatus::Error).await;
                Err(SyncError::Persistence(e.to_string()))
            }
        }
    }

    // ── Status and events ────────────────────────────────────────

    async fn set_status(&self, status: SyncStatus) {
        let changed = {
            let mut current = self.status.write().await;
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        };
        if changed {
            debug!(?status, "status changed");
            self.emit_progress(SyncEvent::StatusChanged(status)).await;
        }
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event);
    }

    async fn emit_progress(&self, event: SyncEvent) {
        if self.config.read().await.notify_on_update {
            self.emit(event);
        }
    }
}

enum ConflictStep {
    /// The resolved value was accepted by the server.
    Done,
    /// The resolver rejected the conflict; manual intervention needed.
    Rejected,
    /// The resolved value could not be delivered.
    ResubmitFailed(String),
}
