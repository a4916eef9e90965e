//! Offline-first background synchronization engine.
//!
//! Outpost queues client-side mutations made while disconnected (or
//! simply to decouple UI latency from network latency), replays them
//! against a remote REST service when connectivity allows, and
//! reconciles divergent client/server state through pluggable
//! conflict-resolution strategies.
//!
//! # Architecture
//!
//! - **TaskQueue**: ordered pending mutations with priority-then-FIFO
//!   drain order
//! - **ChangeTracker**: per-key versioned changes with compaction
//! - **RetryPolicy**: exponential backoff with bounded jitter
//! - **ConflictResolver**: built-in strategies plus a custom registry
//! - **NetworkMonitor**: edge-triggered online/offline signal
//! - **SnapshotStore**: durable snapshot the queue is rebuilt from
//! - **SyncTransport**: one HTTP request per task
//! - **SyncEngine**: the scheduler composing all of the above
//!
//! # Guarantees
//!
//! - At most one drain in flight; concurrent `start_sync` calls join it
//! - Deterministic drain order: priority, then insertion order
//! - Bounded retry with backoff; exhausted tasks are dead-lettered and
//!   reported exactly once, never silently dropped
//! - Deterministic conflict outcomes for a given strategy
//!
//! The remote API must be idempotent per request; the engine guarantees
//! client-side queue integrity, not exactly-once server effects.
//!
//! # Example
//!
//! ```no_run
//! use outpost_sync::{HttpConfig, HttpTransport, JsonFileStore, ManualMonitor, SyncEngine};
//! use outpost_types::{SyncConfig, TaskDraft};
//! use std::sync::Arc;
//!
//! # async fn demo() -> outpost_sync::SyncResult<()> {
//! let engine = SyncEngine::new(
//!     SyncConfig::default(),
//!     Arc::new(ManualMonitor::new(true)),
//!     Arc::new(JsonFileStore::new("outpost-queue.json")),
//!     Arc::new(HttpTransport::new(HttpConfig::default())?),
//! );
//! engine.initialize().await?;
//! engine.start().await?;
//!
//! let draft = TaskDraft::data("https://api.example.com/notes");
//! engine.add_task(draft).await?;
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod event;
mod network;
mod persist;
mod queue;
mod resolver;
mod retry;
mod tracker;
mod transport;

pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use event::{DrainReport, SyncEvent};
pub use network::{ManualMonitor, NetworkMonitor, ProbeMonitor};
pub use persist::{JsonFileStore, MemoryStore, SnapshotStore};
pub use queue::{TaskQueue, TaskQueueStats};
pub use resolver::{ConflictResolver, CustomResolverFn};
pub use retry::RetryPolicy;
pub use tracker::{ChangeTracker, TrackerState};
pub use transport::{HttpConfig, HttpTransport, SyncTransport, TaskReply};
