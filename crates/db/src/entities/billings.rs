//! `SeaORM` Entity for the billings table.
//!
//! Unique per (resource, subproject, request type, month, year); all write
//! paths upsert against this key, never blind-insert.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "billings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub geography_id: Uuid,
    pub client_id: Uuid,
    pub project_id: Uuid,
    pub subproject_id: Uuid,
    pub resource_id: Uuid,
    pub request_type: String,
    pub month: i32,
    pub year: i32,
    pub hours: Decimal,
    pub rate: Decimal,
    pub flatrate: Decimal,
    pub costing: Decimal,
    pub total_amount: Decimal,
    pub billable_status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resources::Entity",
        from = "Column::ResourceId",
        to = "super::resources::Column::Id"
    )]
    Resources,
    #[sea_orm(
        belongs_to = "super::subprojects::Entity",
        from = "Column::SubprojectId",
        to = "super::subprojects::Column::Id"
    )]
    Subprojects,
}

impl Related<super::resources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resources.def()
    }
}

impl Related<super::subprojects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subprojects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
