//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport-level HTTP error.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistence error. Fatal at the scheduler level.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// I/O error from the snapshot store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
