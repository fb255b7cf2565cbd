//! Synchronization engine for captured attendance.
//!
//! This module provides the [`SyncService`] struct, which pushes pending
//! attendance events to the server. It is built from smaller parts that can
//! also be used on their own:
//! - [`PendingTracker`] reads what is still waiting for upload
//! - [`BatchUploader`] sends events in sequential batches and marks them uploaded
//! - [`BulkRefresh`] replaces the reference tables from a server snapshot
//! - [`RetentionSweep`] prunes old uploaded events
//! - [`TaskSlot`] keeps a logical job from running twice at once

pub mod guard;
pub mod pending;
pub mod refresh;
pub mod retention;
pub mod uploader;

use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::api::AttendanceApi;
use crate::config::SyncConfig;
use crate::connectivity::NetworkProbe;
use crate::entities::{attendance_event, session};
use crate::error::{AppError, Result};
use crate::repositories::SessionRepository;
use crate::storage::LocalStorage;
use crate::utils::datetime;

pub use guard::{SlotGuard, TaskSlot};
pub use pending::PendingTracker;
pub use refresh::{BulkRefresh, RefreshReport};
pub use retention::RetentionSweep;
pub use uploader::{BatchUploader, UploadSummary};

/// What an automatic sync run did.
///
/// Automatic runs never return an error: failures are logged and reported
/// here so the caller can show a passive status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoSyncOutcome {
    /// Another global sync held the slot; this run did nothing
    AlreadyRunning,
    NotAuthenticated,
    NothingPending,
    Completed(UploadSummary),
    Failed {
        /// Human-readable error message describing what went wrong
        message: String,
    },
}

/// Service that moves pending attendance from local storage to the server.
///
/// The `SyncService` is cheap to clone; clones share the storage handle, the
/// API client and the global sync slot. There are three ways to upload:
///
/// - [`auto_sync`](Self::auto_sync): the global run fired by the connectivity
///   monitor. Guarded by the slot; a second firing while one is running is
///   dropped, not queued. Errors are logged and swallowed.
/// - [`sync_all`](Self::sync_all): the same global run started by the user. It
///   shares the slot with automatic runs and surfaces every error.
/// - [`sync_activity`](Self::sync_activity): uploads one activity. It does not
///   take the slot, so it may overlap a global run; the server upserts on
///   (student, activity, date) and each record carries a client UUID, so a
///   record sent twice is stored once.
///
/// # Example
/// ```rust,no_run
/// use rollsync::api::HttpApi;
/// use rollsync::config::Config;
/// use rollsync::connectivity::HttpProbe;
/// use rollsync::storage::{StoreHandle, StoreLocation};
/// use rollsync::sync::SyncService;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::default();
/// let storage = StoreHandle::new(StoreLocation::Memory).open().await?;
/// let api = Arc::new(HttpApi::from_config(&config.server)?);
/// let probe = Arc::new(HttpProbe::new(&config.server.endpoint)?);
/// let sync = SyncService::new(storage, api, probe, &config.sync);
///
/// let summary = sync.sync_all().await?;
/// println!("{summary}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SyncService {
    storage: LocalStorage,
    probe: Arc<dyn NetworkProbe>,
    uploader: BatchUploader,
    global_slot: TaskSlot,
    retention_days: u32,
}

impl SyncService {
    pub fn new(
        storage: LocalStorage,
        api: Arc<dyn AttendanceApi>,
        probe: Arc<dyn NetworkProbe>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            uploader: BatchUploader::from_config(storage.clone(), api, config),
            storage,
            probe,
            global_slot: TaskSlot::new(),
            retention_days: config.retention_days,
        }
    }

    /// Replace the uploader, e.g. to change batching.
    pub fn with_uploader(mut self, uploader: BatchUploader) -> Self {
        self.uploader = uploader;
        self
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn pending(&self) -> PendingTracker {
        PendingTracker::new(self.storage.clone())
    }

    /// Checks whether a global sync is currently running.
    pub fn is_syncing(&self) -> bool {
        self.global_slot.is_busy()
    }

    /// Global sync fired by a reconnection.
    pub async fn auto_sync(&self) -> AutoSyncOutcome {
        let Some(_slot) = self.global_slot.try_acquire() else {
            debug!("🔄 Auto-sync skipped, a global sync is already running");
            return AutoSyncOutcome::AlreadyRunning;
        };

        match self.current_session().await {
            Ok(Some(_)) => {}
            Ok(None) => return AutoSyncOutcome::NotAuthenticated,
            Err(e) => {
                warn!("⚠️ Auto-sync could not read the session: {}", e);
                return AutoSyncOutcome::Failed { message: e.to_string() };
            }
        }

        info!("🔄 Connection restored, uploading pending attendance...");
        match self.upload_all_pending().await {
            Ok(summary) if summary.is_empty() => AutoSyncOutcome::NothingPending,
            Ok(summary) => AutoSyncOutcome::Completed(summary),
            Err(e) => {
                error!("❌ Auto-sync failed: {}", e);
                AutoSyncOutcome::Failed {
                    message: e.user_message(),
                }
            }
        }
    }

    /// Global sync started by the user.
    ///
    /// # Errors
    /// [`AppError::SyncInProgress`] when another global run holds the slot,
    /// [`AppError::NotAuthenticated`] without a session,
    /// [`AppError::NetworkUnreachable`] when the probe reports offline, and any
    /// upload error.
    pub async fn sync_all(&self) -> Result<UploadSummary> {
        let _slot = self.global_slot.try_acquire().ok_or(AppError::SyncInProgress)?;
        self.require_session().await?;
        self.require_online().await?;
        self.upload_all_pending().await
    }

    /// Upload the pending events of one activity.
    pub async fn sync_activity(&self, activity_id: i64) -> Result<UploadSummary> {
        self.require_session().await?;
        self.require_online().await?;
        let events = self.pending().list_pending_for_activity(activity_id).await?;
        info!("🔄 Uploading {} pending records of activity {}", events.len(), activity_id);
        self.uploader.upload(&events).await
    }

    /// Best-effort upload right after capture.
    ///
    /// Does nothing when offline; failures are logged and the events simply
    /// stay pending for the next sync.
    pub async fn upload_now(&self, events: Vec<attendance_event::Model>) -> Option<UploadSummary> {
        if events.is_empty() || !self.probe.check().await.is_online() {
            return None;
        }
        match self.uploader.upload(&events).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("⚠️ Immediate upload failed, records stay pending: {}", e);
                None
            }
        }
    }

    async fn upload_all_pending(&self) -> Result<UploadSummary> {
        let events = self.pending().list_all_pending().await?;
        if events.is_empty() {
            debug!("✅ Nothing pending");
            return Ok(UploadSummary::default());
        }

        let summary = self.uploader.upload(&events).await?;
        if let Err(e) = RetentionSweep::run(self.storage.connection(), datetime::today(), self.retention_days).await {
            warn!("⚠️ Retention sweep failed: {}", e);
        }
        Ok(summary)
    }

    async fn current_session(&self) -> Result<Option<session::Model>> {
        SessionRepository::current(self.storage.connection()).await
    }

    async fn require_session(&self) -> Result<session::Model> {
        self.current_session().await?.ok_or(AppError::NotAuthenticated)
    }

    async fn require_online(&self) -> Result<()> {
        if self.probe.check().await.is_online() {
            Ok(())
        } else {
            Err(AppError::NetworkUnreachable)
        }
    }
}
