//! Activity repository for database operations.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::constants::INSERT_CHUNK_SIZE;
use crate::entities::activity;
use crate::error::Result;

/// Repository for activities.
pub struct ActivityRepository;

impl ActivityRepository {
    /// Get all activities of one period.
    pub async fn get_for_period<C>(conn: &C, period_id: i64) -> Result<Vec<activity::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(activity::Entity::find()
            .filter(activity::Column::PeriodId.eq(period_id))
            .order_by_asc(activity::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn get_by_id<C>(conn: &C, id: i64) -> Result<Option<activity::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(activity::Entity::find_by_id(id).one(conn).await?)
    }

    pub async fn delete_all<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(activity::Entity::delete_many().exec(conn).await?.rows_affected)
    }

    pub async fn insert_all<C>(conn: &C, rows: Vec<activity::ActiveModel>) -> Result<()>
    where
        C: ConnectionTrait,
    {
        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            activity::Entity::insert_many(chunk.to_vec()).exec(conn).await?;
        }
        Ok(())
    }
}
