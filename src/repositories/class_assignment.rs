//! Class assignment repository for database operations.

use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder};

use crate::constants::INSERT_CHUNK_SIZE;
use crate::entities::class_assignment;
use crate::error::Result;

/// Repository for the roster groups the current user manages.
pub struct ClassAssignmentRepository;

impl ClassAssignmentRepository {
    /// Get all assignments ordered by municipality, center and grade.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<class_assignment::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(class_assignment::Entity::find()
            .order_by_asc(class_assignment::Column::Municipality)
            .order_by_asc(class_assignment::Column::Center)
            .order_by_asc(class_assignment::Column::Grade)
            .all(conn)
            .await?)
    }

    pub async fn delete_all<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(class_assignment::Entity::delete_many().exec(conn).await?.rows_affected)
    }

    pub async fn insert_all<C>(conn: &C, rows: Vec<class_assignment::ActiveModel>) -> Result<()>
    where
        C: ConnectionTrait,
    {
        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            class_assignment::Entity::insert_many(chunk.to_vec()).exec(conn).await?;
        }
        Ok(())
    }
}
