//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Runtime configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whether the engine drains automatically on timers and online
    /// transitions. When false, only explicit `start_sync`/`force_sync`
    /// calls drain the queue.
    pub auto_sync: bool,
    /// Interval between automatic drains (ms).
    pub sync_interval_ms: u64,
    /// Maximum requests in flight during one drain.
    pub max_concurrent_requests: usize,
    /// Whether non-terminal progress events (completions, status
    /// changes) are emitted to subscribers. Dead-letter events are
    /// always emitted.
    pub notify_on_update: bool,
    /// Endpoint that receives compacted incremental changes. When
    /// absent, pending changes stay queued.
    #[serde(default)]
    pub changes_url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_interval_ms: 30_000,
            max_concurrent_requests: 4,
            notify_on_update: true,
            changes_url: None,
        }
    }
}
