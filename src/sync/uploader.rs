//! Batched upload of pending attendance events.

use log::{error, info};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{AttendanceApi, Participation};
use crate::config::SyncConfig;
use crate::constants::{DEFAULT_BATCH_PAUSE_MS, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use crate::entities::attendance_event;
use crate::error::{AppError, Result};
use crate::repositories::AttendanceRepository;
use crate::storage::LocalStorage;

/// Outcome of a completed upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub total: usize,
    pub batches: usize,
}

impl UploadSummary {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} uploaded", self.uploaded, self.total)
    }
}

/// Sends events to the server in fixed-size, strictly sequential batches.
///
/// Each acknowledged batch is marked `Uploaded` in its own local transaction
/// before the next one is sent. The first failing batch stops the run: earlier
/// batches stay uploaded, that batch and everything after it stay pending, and
/// the error reports how far the run got.
#[derive(Clone)]
pub struct BatchUploader {
    storage: LocalStorage,
    api: Arc<dyn AttendanceApi>,
    batch_size: usize,
    pause: Duration,
}

impl BatchUploader {
    pub fn new(storage: LocalStorage, api: Arc<dyn AttendanceApi>) -> Self {
        Self {
            storage,
            api,
            batch_size: DEFAULT_BATCH_SIZE,
            pause: Duration::from_millis(DEFAULT_BATCH_PAUSE_MS),
        }
    }

    pub fn from_config(storage: LocalStorage, api: Arc<dyn AttendanceApi>, config: &SyncConfig) -> Self {
        Self::new(storage, api)
            .with_batch_size(config.batch_size)
            .with_pause(config.batch_pause())
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Delay between two consecutive batches.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Upload `events` in order. An empty list succeeds without touching the network.
    pub async fn upload(&self, events: &[attendance_event::Model]) -> Result<UploadSummary> {
        let total = events.len();
        if total == 0 {
            return Ok(UploadSummary::default());
        }

        let total_batches = total.div_ceil(self.batch_size);
        let mut uploaded = 0;

        for (index, batch) in events.chunks(self.batch_size).enumerate() {
            let number = index + 1;
            if index > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            info!("🚚 Sending batch {}/{} ({} records)", number, total_batches, batch.len());
            if let Err(cause) = self.send_batch(batch).await {
                error!(
                    "❌ Batch {}/{} failed, {} of {} records uploaded: {}",
                    number, total_batches, uploaded, total, cause
                );
                return Err(AppError::PartialUploadFailure {
                    uploaded,
                    total,
                    failed_batch: number,
                    total_batches,
                    cause: Box::new(cause),
                });
            }
            uploaded += batch.len();
        }

        let summary = UploadSummary {
            uploaded,
            total,
            batches: total_batches,
        };
        info!("✅ Upload finished: {}", summary);
        Ok(summary)
    }

    async fn send_batch(&self, batch: &[attendance_event::Model]) -> Result<()> {
        let participations: Vec<Participation> = batch.iter().map(Participation::from).collect();
        self.api.submit_batch(&participations).await?;

        let ids: Vec<i32> = batch.iter().map(|event| event.id).collect();
        self.storage
            .transaction(move |txn| Box::pin(async move { AttendanceRepository::mark_uploaded(txn, &ids).await }))
            .await?;
        Ok(())
    }
}
