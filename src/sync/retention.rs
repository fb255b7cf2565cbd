use chrono::NaiveDate;
use log::info;
use sea_orm::ConnectionTrait;

use crate::error::Result;
use crate::repositories::AttendanceRepository;
use crate::utils::datetime;

/// Deletes uploaded events older than the retention window. Pending events are never touched.
pub struct RetentionSweep;

impl RetentionSweep {
    /// Returns the number of deleted events.
    pub async fn run<C>(conn: &C, today: NaiveDate, retention_days: u32) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let cutoff = datetime::format_ymd(datetime::retention_cutoff(today, retention_days));
        let deleted = AttendanceRepository::delete_uploaded_before(conn, &cutoff).await?;
        if deleted > 0 {
            info!("🧹 Removed {} uploaded records dated before {}", deleted, cutoff);
        }
        Ok(deleted)
    }
}
