use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{ACCEPT, CACHE_CONTROL, EXPIRES, PRAGMA};
use reqwest::Client;
use std::time::Duration;

use super::wire::{self, Participation, Snapshot, UploadBatch};
use super::AttendanceApi;
use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::utils::datetime;

/// Attendance server reached over HTTP(S).
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpApi {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Http(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, error: reqwest::Error) -> AppError {
        if error.is_timeout() {
            AppError::Timeout(self.timeout.as_secs())
        } else if error.is_connect() {
            AppError::NetworkUnreachable
        } else {
            AppError::Http(error.to_string())
        }
    }
}

#[async_trait]
impl AttendanceApi for HttpApi {
    async fn fetch_snapshot(&self, identity: &str) -> Result<Snapshot> {
        info!("📡 Downloading reference data for {}", identity);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("identidad", identity.to_string()), ("_t", datetime::cache_buster())])
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .header(EXPIRES, "0")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        if !status.is_success() {
            warn!("❌ Download answered HTTP {}", status.as_u16());
            return Err(AppError::ServerRejected(format!("HTTP {}", status.as_u16())));
        }

        let snapshot = wire::parse_snapshot(&body)?;
        debug!(
            "📡 Snapshot: {} assignments, {} students, {} periods",
            snapshot.assignments.len(),
            snapshot.students.len(),
            snapshot.periods.len()
        );
        Ok(snapshot)
    }

    async fn submit_batch(&self, participations: &[Participation]) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .json(&UploadBatch { participations })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        let reply = wire::parse_upload_reply(&body)?;
        if !status.is_success() {
            return Err(AppError::ServerRejected(
                reply.message.unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            ));
        }
        Ok(())
    }
}
