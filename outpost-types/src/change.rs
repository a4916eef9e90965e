//! Incremental change items.
//!
//! A `SyncItem` is one pending versioned change to a keyed resource.
//! The change tracker guarantees at most one pending item per key:
//! repeat edits before a sync compact into a single item with a bumped
//! version and fresh timestamp.

use crate::UnixMillis;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pending change to one logical resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncItem {
    /// Logical resource identity.
    pub key: String,
    /// The latest payload for the key.
    pub payload: Value,
    /// Client clock at the most recent mutation.
    pub timestamp: UnixMillis,
    /// Monotonically increasing per key; assigned by the tracker.
    pub version: u64,
}

impl SyncItem {
    /// Creates a change item.
    #[must_use]
    pub fn new(key: impl Into<String>, payload: Value, timestamp: UnixMillis, version: u64) -> Self {
        Self {
            key: key.into(),
            payload,
            timestamp,
            version,
        }
    }
}
