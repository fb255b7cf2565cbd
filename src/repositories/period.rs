//! Period repository for database operations.

use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder};

use crate::constants::INSERT_CHUNK_SIZE;
use crate::entities::period;
use crate::error::Result;

/// Repository for reporting periods.
pub struct PeriodRepository;

impl PeriodRepository {
    /// Get all periods, newest first.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<period::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(period::Entity::find().order_by_desc(period::Column::Id).all(conn).await?)
    }

    pub async fn get_by_id<C>(conn: &C, id: i64) -> Result<Option<period::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(period::Entity::find_by_id(id).one(conn).await?)
    }

    pub async fn delete_all<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(period::Entity::delete_many().exec(conn).await?.rows_affected)
    }

    pub async fn insert_all<C>(conn: &C, rows: Vec<period::ActiveModel>) -> Result<()>
    where
        C: ConnectionTrait,
    {
        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            period::Entity::insert_many(chunk.to_vec()).exec(conn).await?;
        }
        Ok(())
    }
}
