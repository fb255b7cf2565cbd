//! Signed attendance records, the only data the device produces.
//!
//! `activity_id` and `student_id` are logical references: reference tables are
//! replaced wholesale by a refresh while captured events must survive it, so no
//! foreign key is declared at the storage level.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Upload state. Only ever moves from `Pending` to `Uploaded`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum UploadStatus {
    #[sea_orm(num_value = 0)]
    Pending,
    #[sea_orm(num_value = 1)]
    Uploaded,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Client-generated key sent with every upload so retries can be deduplicated
    #[sea_orm(unique)]
    pub client_ref: Uuid,
    pub activity_id: i64,
    pub student_id: String,
    pub event_date: String,
    pub period_label: String,
    #[sea_orm(column_type = "Text")]
    pub signature: String,
    pub captured_at: String,
    pub coordinates: String,
    pub status: UploadStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
