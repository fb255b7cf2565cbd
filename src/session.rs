//! Login, refresh and the guarded logout.

use log::{info, warn};
use std::sync::Arc;

use crate::api::AttendanceApi;
use crate::connectivity::NetworkProbe;
use crate::entities::session;
use crate::error::{AppError, Result};
use crate::repositories::{AttendanceRepository, SessionRepository};
use crate::storage::db::wipe_tables;
use crate::storage::LocalStorage;
use crate::sync::{BulkRefresh, RefreshReport};

/// Owns the session lifecycle.
///
/// A stored session is the only authentication gate. Logging out wipes every
/// local table, so it is refused while any record is still pending or while
/// the server cannot be reached to upload them.
#[derive(Clone)]
pub struct SessionGate {
    storage: LocalStorage,
    probe: Arc<dyn NetworkProbe>,
    refresh: BulkRefresh,
}

impl SessionGate {
    pub fn new(storage: LocalStorage, api: Arc<dyn AttendanceApi>, probe: Arc<dyn NetworkProbe>) -> Self {
        Self {
            refresh: BulkRefresh::new(storage.clone(), api),
            storage,
            probe,
        }
    }

    pub async fn current(&self) -> Result<Option<session::Model>> {
        SessionRepository::current(self.storage.connection()).await
    }

    /// The current session, or [`AppError::NotAuthenticated`].
    pub async fn require(&self) -> Result<session::Model> {
        self.current().await?.ok_or(AppError::NotAuthenticated)
    }

    /// Download the data for `identity` and open a session for it.
    pub async fn login(&self, identity: &str) -> Result<RefreshReport> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(AppError::InvalidInput("identity is required".to_string()));
        }
        self.require_online().await?;

        let report = self.refresh.run(identity).await?;
        info!("✅ Logged in as {} ({})", report.display_name, identity);
        Ok(report)
    }

    /// Re-download the reference data of the current session.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let session = self.require().await?;
        self.require_online().await?;
        self.refresh.run(&session.identity).await
    }

    /// Check whether logging out is allowed right now.
    pub async fn check_logout(&self) -> Result<()> {
        self.require_online().await?;
        let count = AttendanceRepository::count_pending(self.storage.connection()).await?;
        if count > 0 {
            warn!("⚠️ Logout refused, {} records pending", count);
            return Err(AppError::PendingUploads { count });
        }
        Ok(())
    }

    /// Close the session and wipe all local data.
    ///
    /// The pending count is checked again inside the wipe transaction, so a
    /// record captured after [`check_logout`](Self::check_logout) is never lost.
    pub async fn logout(&self) -> Result<()> {
        self.check_logout().await?;
        self.storage
            .transaction(|txn| {
                Box::pin(async move {
                    let count = AttendanceRepository::count_pending(txn).await?;
                    if count > 0 {
                        return Err(AppError::PendingUploads { count });
                    }
                    wipe_tables(txn).await
                })
            })
            .await?;
        info!("♻️ Logged out, local data wiped");
        Ok(())
    }

    async fn require_online(&self) -> Result<()> {
        if self.probe.check().await.is_online() {
            Ok(())
        } else {
            Err(AppError::NetworkUnreachable)
        }
    }
}
