//! Attendance event repository for database operations.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
};

use crate::entities::attendance_event::{self, UploadStatus};
use crate::error::Result;

/// Pending count for one activity of a period.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ActivityPending {
    pub activity_id: i64,
    pub name: String,
    pub activity_type: String,
    pub pending: i64,
}

/// Repository for attendance event database operations.
pub struct AttendanceRepository;

impl AttendanceRepository {
    /// Get every stored event, oldest capture first.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<attendance_event::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(attendance_event::Entity::find()
            .order_by_asc(attendance_event::Column::Id)
            .all(conn)
            .await?)
    }

    /// Find the event for a (student, activity, date) triple.
    pub async fn find_for<C>(
        conn: &C,
        activity_id: i64,
        student_id: &str,
        event_date: &str,
    ) -> Result<Option<attendance_event::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(attendance_event::Entity::find()
            .filter(attendance_event::Column::ActivityId.eq(activity_id))
            .filter(attendance_event::Column::StudentId.eq(student_id))
            .filter(attendance_event::Column::EventDate.eq(event_date))
            .one(conn)
            .await?)
    }

    pub async fn insert<C>(conn: &C, event: attendance_event::ActiveModel) -> Result<attendance_event::Model>
    where
        C: ConnectionTrait,
    {
        Ok(event.insert(conn).await?)
    }

    /// Student ids that already signed for an activity on a date.
    pub async fn attended_on<C>(conn: &C, activity_id: i64, event_date: &str) -> Result<Vec<String>>
    where
        C: ConnectionTrait,
    {
        Ok(attendance_event::Entity::find()
            .select_only()
            .column(attendance_event::Column::StudentId)
            .filter(attendance_event::Column::ActivityId.eq(activity_id))
            .filter(attendance_event::Column::EventDate.eq(event_date))
            .order_by_asc(attendance_event::Column::StudentId)
            .into_tuple::<String>()
            .all(conn)
            .await?)
    }

    /// Delete the event of a (student, activity, date) triple.
    pub async fn delete_for<C>(conn: &C, activity_id: i64, student_id: &str, event_date: &str) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(attendance_event::Entity::delete_many()
            .filter(attendance_event::Column::ActivityId.eq(activity_id))
            .filter(attendance_event::Column::StudentId.eq(student_id))
            .filter(attendance_event::Column::EventDate.eq(event_date))
            .exec(conn)
            .await?
            .rows_affected)
    }

    /// All pending events in capture order.
    pub async fn pending_all<C>(conn: &C) -> Result<Vec<attendance_event::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(attendance_event::Entity::find()
            .filter(attendance_event::Column::Status.eq(UploadStatus::Pending))
            .order_by_asc(attendance_event::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn pending_for_activity<C>(conn: &C, activity_id: i64) -> Result<Vec<attendance_event::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(attendance_event::Entity::find()
            .filter(attendance_event::Column::ActivityId.eq(activity_id))
            .filter(attendance_event::Column::Status.eq(UploadStatus::Pending))
            .order_by_asc(attendance_event::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn count_pending<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(attendance_event::Entity::find()
            .filter(attendance_event::Column::Status.eq(UploadStatus::Pending))
            .count(conn)
            .await?)
    }

    /// Pending counts for every activity of a period, computed in one query.
    pub async fn pending_by_activity<C>(conn: &C, period_id: i64) -> Result<Vec<ActivityPending>>
    where
        C: ConnectionTrait,
    {
        let statement = Statement::from_sql_and_values(
            DbBackend::Sqlite,
            r#"SELECT a.id AS activity_id, a.name, a.activity_type,
                      (SELECT COUNT(*) FROM attendance_events e
                        WHERE e.activity_id = a.id AND e.status = ?) AS pending
               FROM activities a
               WHERE a.period_id = ?
               ORDER BY a.id"#,
            [UploadStatus::Pending.to_value().into(), period_id.into()],
        );
        Ok(ActivityPending::find_by_statement(statement).all(conn).await?)
    }

    /// Flip the given events to `Uploaded`. Already uploaded rows are left untouched.
    pub async fn mark_uploaded<C>(conn: &C, ids: &[i32]) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        if ids.is_empty() {
            return Ok(0);
        }
        Ok(attendance_event::Entity::update_many()
            .col_expr(
                attendance_event::Column::Status,
                Expr::value(UploadStatus::Uploaded.to_value()),
            )
            .filter(attendance_event::Column::Id.is_in(ids.iter().copied()))
            .filter(attendance_event::Column::Status.eq(UploadStatus::Pending))
            .exec(conn)
            .await?
            .rows_affected)
    }

    /// Delete uploaded events dated strictly before `cutoff` (YYYY-MM-DD).
    pub async fn delete_uploaded_before<C>(conn: &C, cutoff: &str) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(attendance_event::Entity::delete_many()
            .filter(attendance_event::Column::Status.eq(UploadStatus::Uploaded))
            .filter(attendance_event::Column::EventDate.lt(cutoff))
            .exec(conn)
            .await?
            .rows_affected)
    }
}
