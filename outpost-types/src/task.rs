//! Queued sync tasks.
//!
//! A `SyncTask` is one HTTP-bound mutation waiting for delivery. Tasks
//! are immutable once queued except for their retry count and terminal
//! status; the queue assigns the id and creation time on insert.

use crate::{ConflictStrategy, TaskId, UnixMillis};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The category of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Generic REST call.
    Api,
    /// Data mutation against a resource endpoint.
    Data,
    /// File upload; carries `fileName`/`fileSize` metadata and is sent
    /// as multipart.
    File,
    /// Notification delivery.
    Notification,
}

/// Drain priority. `High` tasks are delivered before `Medium`, `Medium`
/// before `Low`; within a level, insertion order (FIFO) applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Drain rank; lower drains first.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

/// HTTP method for the task's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// The method name as it appears on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Lifecycle status of a task. Successful delivery removes the task
/// from the queue outright, so there is no terminal success status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Waiting in the queue for the next drain.
    Pending,
    /// A drain is delivering the task right now.
    InFlight,
    /// Exhausted its retry budget (terminal); carried on the
    /// dead-letter event after the task leaves the queue.
    DeadLettered,
}

/// A queued unit of work representing one HTTP-bound mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncTask {
    /// Unique id, assigned by the queue on insert.
    pub id: TaskId,
    /// What category of work this is.
    pub kind: TaskKind,
    /// Target URL.
    pub url: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Extra request headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// JSON body, if any.
    #[serde(default)]
    pub body: Option<Value>,
    /// Drain priority.
    pub priority: Priority,
    /// Retry budget; the task is dead-lettered after this many retries.
    pub max_retries: u32,
    /// Base backoff delay in milliseconds.
    pub retry_delay_ms: u64,
    /// Failed attempts so far. Monotonically increasing, never exceeds
    /// `max_retries`.
    pub retry_count: u32,
    /// When the task was queued; assigned on insert.
    pub created_at: UnixMillis,
    /// Caller-supplied metadata (e.g. `fileName`/`fileSize` for files).
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Strategy to apply if the server reports a conflict.
    #[serde(default)]
    pub conflict_strategy: Option<ConflictStrategy>,
    /// Lifecycle status.
    pub status: TaskStatus,
}

impl SyncTask {
    /// Whether the task has been queued longer than `max_age_ms` as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: UnixMillis, max_age_ms: u64) -> bool {
        now.millis_since(self.created_at) > max_age_ms
    }
}

/// A task as submitted by the caller, before the queue assigns its id,
/// creation time and retry counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub kind: TaskKind,
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
    pub priority: Priority,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub conflict_strategy: Option<ConflictStrategy>,
}

impl TaskDraft {
    /// Creates a draft with default priority and retry settings.
    #[must_use]
    pub fn new(kind: TaskKind, url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            kind,
            url: url.into(),
            method,
            headers: HashMap::new(),
            body: None,
            priority: Priority::Medium,
            max_retries: 3,
            retry_delay_ms: 1_000,
            metadata: HashMap::new(),
            conflict_strategy: None,
        }
    }

    /// Convenience constructor for a generic API call.
    #[must_use]
    pub fn api(url: impl Into<String>, method: HttpMethod) -> Self {
        Self::new(TaskKind::Api, url, method)
    }

    /// Convenience constructor for a data mutation (POST by default).
    #[must_use]
    pub fn data(url: impl Into<String>) -> Self {
        Self::new(TaskKind::Data, url, HttpMethod::Post)
    }

    /// Convenience constructor for a file upload. Records the file name
    /// and size in metadata for the multipart endpoint.
    #[must_use]
    pub fn file(url: impl Into<String>, file_name: impl Into<String>, file_size: u64) -> Self {
        let mut draft = Self::new(TaskKind::File, url, HttpMethod::Post);
        draft
            .metadata
            .insert("fileName".to_string(), Value::String(file_name.into()));
        draft
            .metadata
            .insert("fileSize".to_string(), Value::from(file_size));
        draft
    }

    /// Convenience constructor for a notification (low priority).
    #[must_use]
    pub fn notification(url: impl Into<String>) -> Self {
        let mut draft = Self::new(TaskKind::Notification, url, HttpMethod::Post);
        draft.priority = Priority::Low;
        draft
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the drain priority.
    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base backoff delay in milliseconds.
    #[must_use]
    pub fn retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Sets the conflict strategy.
    #[must_use]
    pub fn conflict_strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.conflict_strategy = Some(strategy);
        self
    }

    /// Finalizes the draft into a queued task.
    #[must_use]
    pub fn into_task(self, id: TaskId, created_at: UnixMillis) -> SyncTask {
        SyncTask {
            id,
            kind: self.kind,
            url: self.url,
            method: self.method,
            headers: self.headers,
            body: self.body,
            priority: self.priority,
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
            retry_count: 0,
            created_at,
            metadata: self.metadata,
            conflict_strategy: self.conflict_strategy,
            status: TaskStatus::Pending,
        }
    }
}
