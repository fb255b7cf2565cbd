//! Error taxonomy shared by the local store, the HTTP client and the sync engine.
//!
//! Every failure a user can run into is one of these variants. Flows catch them
//! at their boundary and show [`AppError::user_message`] instead of the raw
//! `Display` text, which is meant for logs.

use thiserror::Error;

use crate::constants::{
    ERROR_ALREADY_CAPTURED, ERROR_INVALID_SNAPSHOT, ERROR_MALFORMED_RESPONSE, ERROR_NETWORK_UNREACHABLE,
    ERROR_NOT_AUTHENTICATED, ERROR_PARTIAL_UPLOAD, ERROR_PENDING_UPLOADS, ERROR_SERVER_REJECTED, ERROR_STORE,
    ERROR_STORE_UNAVAILABLE, ERROR_SYNC_IN_PROGRESS, ERROR_TIMEOUT,
};

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// The local database file could not be created or opened.
    #[error("local store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store error: {0}")]
    Store(#[from] sea_orm::DbErr),

    /// No connectivity at call time; the request was never attempted.
    #[error("no internet connection")]
    NetworkUnreachable,

    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The server answered with an explicit error payload or a non-2xx status.
    #[error("server rejected the request: {0}")]
    ServerRejected(String),

    /// A non-JSON body arrived where JSON was expected.
    #[error("unexpected non-JSON response: {excerpt}")]
    MalformedResponse { excerpt: String },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("http error: {0}")]
    Http(String),

    #[error(
        "batch {failed_batch} of {total_batches} failed after {uploaded} of {total} records were uploaded: {cause}"
    )]
    PartialUploadFailure {
        uploaded: usize,
        total: usize,
        failed_batch: usize,
        total_batches: usize,
        #[source]
        cause: Box<AppError>,
    },

    #[error("no active session")]
    NotAuthenticated,

    #[error("{count} attendance records are still waiting to be uploaded")]
    PendingUploads { count: u64 },

    #[error("attendance already captured for student {student_id} in activity {activity_id} on {date}")]
    AlreadyCaptured {
        student_id: String,
        activity_id: i64,
        date: String,
    },

    #[error("a synchronization is already running")]
    SyncInProgress,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Short text suitable for showing to the person holding the device.
    pub fn user_message(&self) -> String {
        match self {
            AppError::StoreUnavailable(_) => ERROR_STORE_UNAVAILABLE.to_string(),
            AppError::Store(_) => ERROR_STORE.to_string(),
            AppError::NetworkUnreachable => ERROR_NETWORK_UNREACHABLE.to_string(),
            AppError::Timeout(secs) => format!("{ERROR_TIMEOUT} ({secs}s)"),
            AppError::ServerRejected(message) => format!("{ERROR_SERVER_REJECTED}: {message}"),
            AppError::MalformedResponse { excerpt } => format!("{ERROR_MALFORMED_RESPONSE}:\n{excerpt}..."),
            AppError::InvalidSnapshot(reason) => format!("{ERROR_INVALID_SNAPSHOT}: {reason}"),
            AppError::Http(message) => format!("{ERROR_NETWORK_UNREACHABLE} ({message})"),
            AppError::PartialUploadFailure {
                uploaded,
                total,
                failed_batch,
                cause,
                ..
            } => format!(
                "{ERROR_PARTIAL_UPLOAD} {failed_batch}. {uploaded} of {total} uploaded. {}",
                cause.user_message()
            ),
            AppError::NotAuthenticated => ERROR_NOT_AUTHENTICATED.to_string(),
            AppError::PendingUploads { count } => format!("{ERROR_PENDING_UPLOADS} ({count})"),
            AppError::AlreadyCaptured { .. } => ERROR_ALREADY_CAPTURED.to_string(),
            AppError::SyncInProgress => ERROR_SYNC_IN_PROGRESS.to_string(),
            AppError::InvalidInput(reason) => format!("❌ {reason}"),
        }
    }

    /// Whether the failure came from the transport rather than from the server's answer.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            AppError::NetworkUnreachable | AppError::Timeout(_) | AppError::Http(_)
        )
    }
}
