//! Transport layer abstraction.
//!
//! Each queued task maps to exactly one request against the remote
//! service. The transport reports one of three protocol branches:
//! success, conflict (with the divergent value pair), or a retriable
//! failure. Delivery errors below the protocol level (timeouts,
//! connection resets) surface as retriable failures too, so the retry
//! policy governs them uniformly.

mod http;

pub use http::{HttpConfig, HttpTransport};

use crate::error::SyncResult;
use async_trait::async_trait;
use outpost_types::SyncTask;
use serde_json::Value;

/// Outcome of delivering one task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskReply {
    /// 2xx; the task is done and leaves the queue.
    Success,
    /// Conflict response carrying both copies for resolution.
    Conflict {
        /// The value the client attempted to write.
        client_data: Value,
        /// The value currently held by the server.
        server_data: Value,
    },
    /// Retriable failure (error status, timeout, connection error).
    Failure {
        /// HTTP status, when the request got that far.
        status: Option<u16>,
        /// Human-readable description for logs and dead-letter reports.
        message: String,
    },
}

/// A transport that can deliver queued tasks to the remote service.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Delivers one task and classifies the response.
    ///
    /// `Err` is reserved for local faults (e.g. the request could not
    /// be constructed); anything that reached the network comes back as
    /// a [`TaskReply`].
    async fn deliver(&self, task: &SyncTask) -> SyncResult<TaskReply>;
}
