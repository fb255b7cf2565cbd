//! Network reachability and the reconnect trigger for automatic sync.
//!
//! [`ConnectivityMonitor`] is a two-state machine (Offline, Online). Every
//! Offline to Online transition fires exactly one global auto-sync; the sync
//! slot inside [`SyncService`] drops firings that arrive while a run is active.
//! The monitor starts Offline, so the first online observation after startup
//! also triggers a run.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::constants::PROBE_TIMEOUT_SECS;
use crate::error::{AppError, Result};
use crate::sync::{AutoSyncOutcome, SyncService};

/// Snapshot of the device's connectivity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkState {
    /// A network interface is up
    pub is_connected: bool,
    /// The server could actually be reached over it
    pub is_internet_reachable: bool,
}

impl NetworkState {
    pub fn online() -> Self {
        Self {
            is_connected: true,
            is_internet_reachable: true,
        }
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn is_online(&self) -> bool {
        self.is_connected && self.is_internet_reachable
    }
}

#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn check(&self) -> NetworkState;
}

/// Probes reachability with a short HEAD request against the server.
///
/// Any HTTP answer, whatever its status, counts as reachable. A refused or
/// unresolvable connection means offline; a timeout means a link exists but
/// the server cannot be reached through it.
#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
    endpoint: String,
}

impl HttpProbe {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(PROBE_TIMEOUT_SECS))
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Http(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl NetworkProbe for HttpProbe {
    async fn check(&self) -> NetworkState {
        match self.client.head(&self.endpoint).send().await {
            Ok(_) => NetworkState::online(),
            Err(e) if e.is_connect() => {
                debug!("📡 Probe could not connect: {}", e);
                NetworkState::offline()
            }
            Err(e) => {
                debug!("📡 Probe failed: {}", e);
                NetworkState {
                    is_connected: true,
                    is_internet_reachable: false,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Offline,
    Online,
}

/// Watches connectivity and starts an auto-sync on every reconnection.
pub struct ConnectivityMonitor {
    sync: SyncService,
    online: AtomicBool,
    auto_sync: bool,
}

impl ConnectivityMonitor {
    pub fn new(sync: SyncService) -> Self {
        Self {
            sync,
            online: AtomicBool::new(false),
            auto_sync: true,
        }
    }

    /// Turn the reconnect trigger on or off. State is still tracked when off.
    pub fn with_auto_sync(mut self, enabled: bool) -> Self {
        self.auto_sync = enabled;
        self
    }

    pub fn state(&self) -> LinkState {
        if self.online.load(Ordering::SeqCst) {
            LinkState::Online
        } else {
            LinkState::Offline
        }
    }

    /// Feed one observation into the state machine.
    ///
    /// Returns the handle of the auto-sync task when this observation was an
    /// Offline to Online transition.
    pub fn observe(&self, state: NetworkState) -> Option<JoinHandle<AutoSyncOutcome>> {
        let now_online = state.is_online();
        let was_online = self.online.swap(now_online, Ordering::SeqCst);

        match (was_online, now_online) {
            (false, true) => {
                info!("📶 Back online");
                if !self.auto_sync {
                    return None;
                }
                let sync = self.sync.clone();
                Some(tokio::spawn(async move {
                    let outcome = sync.auto_sync().await;
                    match &outcome {
                        AutoSyncOutcome::Completed(summary) => info!("✅ Auto-sync: {}", summary),
                        AutoSyncOutcome::Failed { message } => warn!("⚠️ Auto-sync failed: {}", message),
                        other => debug!("🔄 Auto-sync: {:?}", other),
                    }
                    outcome
                }))
            }
            (true, false) => {
                info!("📴 Connection lost, captures will be kept locally");
                None
            }
            _ => None,
        }
    }

    /// Poll `probe` every `interval` and feed the results to [`observe`](Self::observe).
    ///
    /// Runs until the surrounding task is cancelled.
    pub async fn watch(&self, probe: Arc<dyn NetworkProbe>, interval: Duration) {
        loop {
            let state = probe.check().await;
            self.observe(state);
            tokio::time::sleep(interval).await;
        }
    }
}
