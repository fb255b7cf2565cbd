//! Signed attendance capture.
//!
//! Location and signature processing are injected behind traits so a device
//! integration can provide real GPS and image handling, while the library
//! falls back to the `"Sin GPS"` sentinel and a pass-through compressor.

use async_trait::async_trait;
use log::{debug, info, warn};
use sea_orm::ActiveValue;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::constants::{
    DEFAULT_LOCATION_TIMEOUT_SECS, DEFAULT_SIGNATURE_MIME, NO_GPS, NO_PERIOD_LABEL, SIGNATURE_DATA_URI_PREFIX,
};
use crate::entities::attendance_event::{self, UploadStatus};
use crate::error::{AppError, Result};
use crate::repositories::{AttendanceRepository, SessionRepository};
use crate::storage::LocalStorage;
use crate::utils::datetime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Source of the device position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// `Ok(None)` when no fix is available.
    async fn locate(&self) -> Result<Option<Coordinates>>;
}

/// Provider for devices without positioning.
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn locate(&self) -> Result<Option<Coordinates>> {
        Ok(None)
    }
}

/// Always reports the same position.
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Option<Coordinates>> {
        Ok(Some(self.0))
    }
}

/// Turns a raw signature into what gets stored and uploaded.
#[async_trait]
pub trait SignatureCompressor: Send + Sync {
    async fn compress(&self, raw: &str) -> Result<String>;
}

/// Makes sure the signature is a `data:image/...;base64,` URI.
pub struct DataUriCompressor;

#[async_trait]
impl SignatureCompressor for DataUriCompressor {
    async fn compress(&self, raw: &str) -> Result<String> {
        let raw = raw.trim();
        if raw.starts_with(SIGNATURE_DATA_URI_PREFIX) {
            Ok(raw.to_string())
        } else {
            Ok(format!("data:{};base64,{}", DEFAULT_SIGNATURE_MIME, raw))
        }
    }
}

/// One signature to record.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub student_id: String,
    pub activity_id: i64,
    pub period_label: Option<String>,
    pub signature: String,
    /// YYYY-MM-DD
    pub event_date: String,
    pub captured_at: String,
}

impl CaptureRequest {
    /// A request dated today and stamped with the current local time.
    pub fn now(
        student_id: impl Into<String>,
        activity_id: i64,
        period_label: Option<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            activity_id,
            period_label,
            signature: signature.into(),
            event_date: datetime::format_today(),
            captured_at: datetime::format_timestamp(datetime::now_local()),
        }
    }
}

/// Records at most one attendance event per (student, activity, date).
#[derive(Clone)]
pub struct AttendanceRecorder {
    storage: LocalStorage,
    location: Arc<dyn LocationProvider>,
    compressor: Arc<dyn SignatureCompressor>,
    location_timeout: Duration,
}

impl AttendanceRecorder {
    pub fn new(storage: LocalStorage) -> Self {
        Self {
            storage,
            location: Arc::new(NoLocation),
            compressor: Arc::new(DataUriCompressor),
            location_timeout: Duration::from_secs(DEFAULT_LOCATION_TIMEOUT_SECS),
        }
    }

    pub fn with_location(mut self, location: Arc<dyn LocationProvider>) -> Self {
        self.location = location;
        self
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn SignatureCompressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    /// Store a new pending event.
    ///
    /// The duplicate check runs twice: once before the location wait, so a
    /// repeated tap fails fast, and again in the insert transaction.
    ///
    /// # Errors
    /// [`AppError::AlreadyCaptured`] when the triple already has an event,
    /// [`AppError::NotAuthenticated`] without a session and
    /// [`AppError::InvalidInput`] for an empty student id or signature.
    pub async fn record(&self, request: CaptureRequest) -> Result<attendance_event::Model> {
        let student_id = request.student_id.trim().to_string();
        if student_id.is_empty() {
            return Err(AppError::InvalidInput("student id is required".to_string()));
        }
        if request.signature.trim().is_empty() {
            return Err(AppError::InvalidInput("signature is empty".to_string()));
        }
        let event_date = normalize_date(&request.event_date)?;
        SessionRepository::current(self.storage.connection())
            .await?
            .ok_or(AppError::NotAuthenticated)?;

        let existing = AttendanceRepository::find_for(
            self.storage.connection(),
            request.activity_id,
            &student_id,
            &event_date,
        )
        .await?;
        if existing.is_some() {
            return Err(already_captured(&student_id, request.activity_id, &event_date));
        }

        let coordinates = self.locate().await;
        let signature = match self.compressor.compress(&request.signature).await {
            Ok(compressed) => compressed,
            Err(e) => {
                warn!("⚠️ Signature compression failed, keeping the raw signature: {}", e);
                request.signature.clone()
            }
        };
        let period_label = request
            .period_label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(NO_PERIOD_LABEL)
            .to_string();

        let activity_id = request.activity_id;
        let event = attendance_event::ActiveModel {
            id: ActiveValue::NotSet,
            client_ref: ActiveValue::Set(Uuid::new_v4()),
            activity_id: ActiveValue::Set(activity_id),
            student_id: ActiveValue::Set(student_id.clone()),
            event_date: ActiveValue::Set(event_date.clone()),
            period_label: ActiveValue::Set(period_label),
            signature: ActiveValue::Set(signature),
            captured_at: ActiveValue::Set(request.captured_at),
            coordinates: ActiveValue::Set(coordinates),
            status: ActiveValue::Set(UploadStatus::Pending),
        };

        let stored = self
            .storage
            .transaction(move |txn| {
                Box::pin(async move {
                    if AttendanceRepository::find_for(txn, activity_id, &student_id, &event_date)
                        .await?
                        .is_some()
                    {
                        return Err(already_captured(&student_id, activity_id, &event_date));
                    }
                    AttendanceRepository::insert(txn, event).await
                })
            })
            .await?;

        info!(
            "✅ Attendance saved for student {} in activity {} ({})",
            stored.student_id, stored.activity_id, stored.coordinates
        );
        Ok(stored)
    }

    /// Remove today's event of a student in an activity. Returns whether anything was deleted.
    ///
    /// Events of earlier days are never touched, whatever their upload status.
    pub async fn undo(&self, student_id: &str, activity_id: i64) -> Result<bool> {
        let today = datetime::format_today();
        let deleted =
            AttendanceRepository::delete_for(self.storage.connection(), activity_id, student_id.trim(), &today)
                .await?;
        if deleted > 0 {
            info!("↩️ Attendance removed for student {} in activity {}", student_id, activity_id);
        }
        Ok(deleted > 0)
    }

    /// Students that already signed for `activity_id` on `event_date`.
    pub async fn attended_on(&self, activity_id: i64, event_date: &str) -> Result<HashSet<String>> {
        let event_date = normalize_date(event_date)?;
        let ids = AttendanceRepository::attended_on(self.storage.connection(), activity_id, &event_date).await?;
        Ok(ids.into_iter().collect())
    }

    async fn locate(&self) -> String {
        match tokio::time::timeout(self.location_timeout, self.location.locate()).await {
            Ok(Ok(Some(coordinates))) => coordinates.to_string(),
            Ok(Ok(None)) => NO_GPS.to_string(),
            Ok(Err(e)) => {
                warn!("⚠️ Location unavailable: {}", e);
                NO_GPS.to_string()
            }
            Err(_) => {
                debug!("📍 No location fix within {:?}", self.location_timeout);
                NO_GPS.to_string()
            }
        }
    }
}

/// Canonical `YYYY-MM-DD` form, so lookups and the retention cutoff compare equal strings.
fn normalize_date(raw: &str) -> Result<String> {
    datetime::parse_date(raw.trim())
        .map(datetime::format_ymd)
        .map_err(|_| AppError::InvalidInput(format!("invalid date {}", raw)))
}

fn already_captured(student_id: &str, activity_id: i64, event_date: &str) -> AppError {
    AppError::AlreadyCaptured {
        student_id: student_id.to_string(),
        activity_id,
        date: event_date.to_string(),
    }
}
