//! Durable snapshot storage.
//!
//! The persisted snapshot is the single source of truth across process
//! restarts; the in-memory queue is rebuilt from it on `initialize`. A
//! save failure is a scheduler-level fault (the engine enters `error`
//! status), never a per-task failure.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use outpost_types::QueueSnapshot;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Durable storage for the pending-work snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Loads the last saved snapshot, or `None` if nothing was saved.
    async fn load(&self) -> SyncResult<Option<QueueSnapshot>>;

    /// Persists a snapshot, replacing any previous one.
    async fn save(&self, snapshot: &QueueSnapshot) -> SyncResult<()>;
}

/// Snapshot store backed by a JSON file.
///
/// Saves write a sibling temp file and rename it into place so a crash
/// mid-save leaves the previous snapshot intact.
///
/// Callers must not point two live engines at the same file: the
/// single-instance-per-storage-namespace invariant is an operational
/// constraint, not enforced by locking.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> SyncResult<Option<QueueSnapshot>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::Io(e)),
        };
        let snapshot = serde_json::from_slice(&bytes)?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &QueueSnapshot) -> SyncResult<()> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), tasks = snapshot.tasks.len(), "snapshot saved");
        Ok(())
    }
}

/// In-memory snapshot store for tests and ephemeral engines. Supports
/// injected save failures to exercise the scheduler-level error path.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Option<QueueSnapshot>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self) -> SyncResult<Option<QueueSnapshot>> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, snapshot: &QueueSnapshot) -> SyncResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(SyncError::Persistence("injected save failure".to_string()));
        }
        *self.inner.lock().await = Some(snapshot.clone());
        Ok(())
    }
}
