//! `SeaORM` Entity for the allocation_summaries table.
//!
//! One row per unique (subproject, request type, date) combination inside an
//! upload window. Rows are deleted and regenerated per upload date range,
//! never patched incrementally.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "allocation_summaries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub geography_id: Uuid,
    pub client_id: Uuid,
    pub project_id: Uuid,
    pub subproject_id: Uuid,
    pub geography_name: String,
    pub client_name: String,
    pub project_name: String,
    pub subproject_name: String,
    pub request_type: String,
    pub allocation_date: Date,
    pub day: i32,
    pub month: i32,
    pub year: i32,
    pub count: i64,
    /// Deduplicated resource names as a JSON array of strings.
    pub resource_names: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subprojects::Entity",
        from = "Column::SubprojectId",
        to = "super::subprojects::Column::Id"
    )]
    Subprojects,
}

impl Related<super::subprojects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subprojects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
