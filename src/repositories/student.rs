//! Student repository for database operations.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

use crate::constants::INSERT_CHUNK_SIZE;
use crate::entities::student;
use crate::error::Result;

/// Repository for student-related database operations.
pub struct StudentRepository;

impl StudentRepository {
    /// Get all students ordered by name.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<student::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(student::Entity::find()
            .order_by_asc(student::Column::FullName)
            .all(conn)
            .await?)
    }

    /// Get a single student by external identifier.
    pub async fn get_by_id<C>(conn: &C, student_id: &str) -> Result<Option<student::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(student::Entity::find_by_id(student_id.to_string()).one(conn).await?)
    }

    /// Get the roster of one class.
    ///
    /// Center and grade come from different server tables and only agree after
    /// trimming and upper-casing, so the match is done on the normalized form.
    pub async fn get_for_class<C>(conn: &C, center: &str, grade: &str) -> Result<Vec<student::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(student::Entity::find()
            .filter(Expr::cust_with_values(
                "TRIM(UPPER(\"center\")) = TRIM(UPPER(?))",
                [center.to_string()],
            ))
            .filter(Expr::cust_with_values(
                "TRIM(UPPER(\"grade\")) = TRIM(UPPER(?))",
                [grade.to_string()],
            ))
            .order_by_asc(student::Column::FullName)
            .all(conn)
            .await?)
    }

    /// Search students by a fragment of their name.
    pub async fn search<C>(conn: &C, query: &str) -> Result<Vec<student::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(student::Entity::find()
            .filter(student::Column::FullName.contains(query.trim()))
            .order_by_asc(student::Column::FullName)
            .all(conn)
            .await?)
    }

    pub async fn count<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(student::Entity::find().count(conn).await?)
    }

    pub async fn delete_all<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(student::Entity::delete_many().exec(conn).await?.rows_affected)
    }

    pub async fn insert_all<C>(conn: &C, rows: Vec<student::ActiveModel>) -> Result<()>
    where
        C: ConnectionTrait,
    {
        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            student::Entity::insert_many(chunk.to_vec()).exec(conn).await?;
        }
        Ok(())
    }
}
