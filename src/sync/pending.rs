//! Read-only view of attendance events the server has not acknowledged yet.

use crate::entities::attendance_event;
use crate::error::Result;
use crate::repositories::{ActivityPending, AttendanceRepository};
use crate::storage::LocalStorage;

#[derive(Clone)]
pub struct PendingTracker {
    storage: LocalStorage,
}

impl PendingTracker {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Pending counts for every activity of a period.
    pub async fn count_pending_by_activity(&self, period_id: i64) -> Result<Vec<ActivityPending>> {
        AttendanceRepository::pending_by_activity(self.storage.connection(), period_id).await
    }

    /// Every pending event, across all activities, in capture order.
    pub async fn list_all_pending(&self) -> Result<Vec<attendance_event::Model>> {
        AttendanceRepository::pending_all(self.storage.connection()).await
    }

    pub async fn list_pending_for_activity(&self, activity_id: i64) -> Result<Vec<attendance_event::Model>> {
        AttendanceRepository::pending_for_activity(self.storage.connection(), activity_id).await
    }

    pub async fn count_pending(&self) -> Result<u64> {
        AttendanceRepository::count_pending(self.storage.connection()).await
    }
}
