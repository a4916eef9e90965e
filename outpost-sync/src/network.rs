//! Connectivity monitoring.
//!
//! The engine reacts to online/offline *edges*, not just a polled
//! getter, so monitors expose a `watch` channel alongside the current
//! state. The core engine never touches a runtime's global connectivity
//! events directly; platform adapters wrap them behind this trait
//! (typically by driving a [`ManualMonitor`]).

use crate::error::SyncResult;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Binary online/offline signal with transition events.
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Current connectivity.
    fn is_online(&self) -> bool;

    /// Subscribes to connectivity transitions.
    fn subscribe(&self) -> watch::Receiver<bool>;

    /// Starts the monitor (begins observing, if it observes anything).
    async fn start(&self) -> SyncResult<()> {
        Ok(())
    }

    /// Stops the monitor.
    async fn stop(&self) {}
}

/// A monitor driven by explicit `set_online` calls. Used by platform
/// adapters that receive connectivity events elsewhere, and by tests.
pub struct ManualMonitor {
    tx: watch::Sender<bool>,
}

impl ManualMonitor {
    /// Creates a monitor with an initial state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Reports a connectivity transition. No-op if the state is
    /// unchanged (subscribers only see edges).
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }
}

#[async_trait]
impl NetworkMonitor for ManualMonitor {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// A monitor that probes an HTTP endpoint on an interval. Any response
/// counts as online (the probe checks reachability, not status); a
/// request error counts as offline.
pub struct ProbeMonitor {
    client: Client,
    probe_url: String,
    interval: Duration,
    tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProbeMonitor {
    /// Creates a probe monitor. Starts pessimistic (offline) until the
    /// first successful probe.
    pub fn new(probe_url: impl Into<String>, interval: Duration) -> SyncResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        let (tx, _rx) = watch::channel(false);
        Ok(Self {
            client,
            probe_url: probe_url.into(),
            interval,
            tx,
            handle: Mutex::new(None),
        })
    }
}

#[async_trait]
impl NetworkMonitor for ProbeMonitor {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    async fn start(&self) -> SyncResult<()> {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return Ok(());
        }

        let client = self.client.clone();
        let url = self.probe_url.clone();
        let interval = self.interval;
        let tx = self.tx.clone();

        *handle = Some(tokio::spawn(async move {
            loop {
                let online = match client.head(&url).send().await {
                    Ok(_) => true,
                    Err(e) => {
                        debug!("connectivity probe failed: {}", e);
                        false
                    }
                };
                tx.send_if_modified(|current| {
                    if *current == online {
                        false
                    } else {
                        *current = online;
                        true
                    }
                });
                tokio::time::sleep(interval).await;
            }
        }));
        Ok(())
    }

    async fn stop(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
        } else {
            warn!("probe monitor stopped without being started");
        }
    }
}
