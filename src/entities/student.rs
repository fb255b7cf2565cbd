use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// External identifier assigned by the program (`id_nnaj` on the wire)
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: String,
    pub full_name: String,
    pub gender: String,
    pub grade: String,
    pub center: String,
    pub municipality: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
