//! Client side of the attendance server protocol.
//!
//! [`AttendanceApi`] is the seam the sync engine talks to. [`HttpApi`] is the
//! production implementation; tests substitute a mock server or a fake.

pub mod http;
pub mod wire;

use async_trait::async_trait;

use crate::error::Result;

pub use http::HttpApi;
pub use wire::{Participation, Snapshot};

#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// Download the roster and calendar snapshot for `identity`.
    async fn fetch_snapshot(&self, identity: &str) -> Result<Snapshot>;

    /// Upload one batch. Returns once the server acknowledged the whole batch.
    async fn submit_batch(&self, participations: &[Participation]) -> Result<()>;
}
