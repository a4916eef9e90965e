//! Core type definitions for Outpost.
//!
//! This crate defines the fundamental, transport-agnostic types used
//! throughout the sync engine:
//! - Task identifiers (UUID v7)
//! - Millisecond wall-clock timestamps
//! - Queued sync tasks and incremental change items
//! - Conflict-resolution strategies and outcomes
//! - Engine configuration, status and counters
//!
//! Everything here is plain data: no I/O, no runtime dependencies. The
//! engine crate (`outpost-sync`) owns all behavior.

mod change;
mod config;
mod conflict;
mod ids;
mod snapshot;
mod status;
mod task;
mod timestamp;

pub use change::SyncItem;
pub use config::SyncConfig;
pub use conflict::{ConflictOutcome, ConflictResolution, ConflictStrategy};
pub use ids::TaskId;
pub use snapshot::QueueSnapshot;
pub use status::{SyncStats, SyncStatus};
pub use task::{HttpMethod, Priority, SyncTask, TaskDraft, TaskKind, TaskStatus};
pub use timestamp::UnixMillis;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
