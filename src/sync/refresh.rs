//! Bulk replacement of the reference tables from a server snapshot.

use log::{info, warn};
use sea_orm::ActiveValue;
use std::sync::Arc;

use crate::api::wire::Snapshot;
use crate::api::AttendanceApi;
use crate::constants::{ERROR_DEFAULT_SERVER_MESSAGE, MISSING_FIELD, SESSION_LOCATION_LABEL};
use crate::entities::{activity, class_assignment, period, student};
use crate::error::{AppError, Result};
use crate::repositories::{
    ActivityRepository, ClassAssignmentRepository, PeriodRepository, SessionRepository, StudentRepository,
};
use crate::storage::LocalStorage;
use crate::utils::datetime;

/// Row counts written by a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub display_name: String,
    pub assignments: usize,
    pub students: usize,
    pub periods: usize,
    pub activities: usize,
}

/// Reference rows built from a snapshot, ready to insert.
struct ReferenceRows {
    display_name: String,
    assignments: Vec<class_assignment::ActiveModel>,
    students: Vec<student::ActiveModel>,
    periods: Vec<period::ActiveModel>,
    activities: Vec<activity::ActiveModel>,
}

impl ReferenceRows {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let display_name = snapshot
            .teacher
            .as_ref()
            .map(|teacher| field(&teacher.name))
            .unwrap_or_else(|| MISSING_FIELD.to_string());

        let assignments = snapshot
            .assignments
            .iter()
            .map(|a| class_assignment::ActiveModel {
                id: ActiveValue::NotSet,
                municipality: ActiveValue::Set(field(&a.municipality)),
                center: ActiveValue::Set(field(&a.center)),
                grade: ActiveValue::Set(field(&a.grade)),
            })
            .collect();

        let students = snapshot
            .students
            .iter()
            .map(|s| student::ActiveModel {
                student_id: ActiveValue::Set(s.student_id.clone()),
                full_name: ActiveValue::Set(field(&s.full_name)),
                gender: ActiveValue::Set(field(&s.gender)),
                grade: ActiveValue::Set(field(&s.grade)),
                center: ActiveValue::Set(field(&s.center)),
                municipality: ActiveValue::Set(field(&s.municipality)),
            })
            .collect();

        let mut periods = Vec::with_capacity(snapshot.periods.len());
        let mut activities = Vec::new();
        for p in &snapshot.periods {
            periods.push(period::ActiveModel {
                id: ActiveValue::Set(p.id),
                name: ActiveValue::Set(field(&p.name)),
                start_date: ActiveValue::Set(field(&p.start_date)),
                end_date: ActiveValue::Set(field(&p.end_date)),
            });
            for a in &p.activities {
                activities.push(activity::ActiveModel {
                    id: ActiveValue::Set(a.id),
                    period_id: ActiveValue::Set(p.id),
                    name: ActiveValue::Set(field(&a.name)),
                    activity_type: ActiveValue::Set(field(&a.activity_type)),
                    logframe_tag: ActiveValue::Set(field(&a.logframe_tag)),
                });
            }
        }

        Self {
            display_name,
            assignments,
            students,
            periods,
            activities,
        }
    }

    fn report(&self) -> RefreshReport {
        RefreshReport {
            display_name: self.display_name.clone(),
            assignments: self.assignments.len(),
            students: self.students.len(),
            periods: self.periods.len(),
            activities: self.activities.len(),
        }
    }
}

/// Trimmed text, or the placeholder when the server sent nothing usable.
fn field(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING_FIELD)
        .to_string()
}

/// Downloads a snapshot and swaps it in for the current reference data.
///
/// The session row and the four reference tables are replaced together in a
/// single transaction. Attendance events are never touched. Any failure once
/// the transaction has started leaves the previous data in place.
#[derive(Clone)]
pub struct BulkRefresh {
    storage: LocalStorage,
    api: Arc<dyn AttendanceApi>,
}

impl BulkRefresh {
    pub fn new(storage: LocalStorage, api: Arc<dyn AttendanceApi>) -> Self {
        Self { storage, api }
    }

    /// Download the snapshot for `identity` and apply it.
    pub async fn run(&self, identity: &str) -> Result<RefreshReport> {
        info!("🔄 Refreshing reference data...");
        let snapshot = self.api.fetch_snapshot(identity).await?;
        self.apply(identity, snapshot).await
    }

    /// Replace the session and reference tables with the content of `snapshot`.
    pub async fn apply(&self, identity: &str, snapshot: Snapshot) -> Result<RefreshReport> {
        if snapshot.status.as_deref() == Some("error") {
            let message = snapshot
                .message
                .unwrap_or_else(|| ERROR_DEFAULT_SERVER_MESSAGE.to_string());
            warn!("⚠️ Snapshot rejected by the server: {}", message);
            return Err(AppError::ServerRejected(message));
        }

        let rows = ReferenceRows::from_snapshot(snapshot);
        let report = rows.report();
        let identity = identity.trim().to_string();
        let now = datetime::utc_now_rfc3339();

        self.storage
            .transaction(move |txn| {
                Box::pin(async move {
                    let logged_in_at = SessionRepository::current(txn)
                        .await?
                        .filter(|session| session.identity == identity)
                        .map(|session| session.logged_in_at)
                        .unwrap_or_else(|| now.clone());
                    SessionRepository::replace(
                        txn,
                        &identity,
                        &rows.display_name,
                        SESSION_LOCATION_LABEL,
                        &logged_in_at,
                        &now,
                    )
                    .await?;

                    ActivityRepository::delete_all(txn).await?;
                    PeriodRepository::delete_all(txn).await?;
                    StudentRepository::delete_all(txn).await?;
                    ClassAssignmentRepository::delete_all(txn).await?;

                    ClassAssignmentRepository::insert_all(txn, rows.assignments).await?;
                    StudentRepository::insert_all(txn, rows.students).await?;
                    PeriodRepository::insert_all(txn, rows.periods).await?;
                    ActivityRepository::insert_all(txn, rows.activities).await?;
                    Ok(())
                })
            })
            .await?;

        info!(
            "✅ Stored {} assignments, {} students, {} periods, {} activities",
            report.assignments, report.students, report.periods, report.activities
        );
        Ok(report)
    }
}
