//! `SeaORM` Entity for the clients table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub geography_id: Uuid,
    pub geography_name: String,
    pub status: String,
    pub generation: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::geographies::Entity",
        from = "Column::GeographyId",
        to = "super::geographies::Column::Id"
    )]
    Geographies,
    #[sea_orm(has_many = "super::projects::Entity")]
    Projects,
}

impl Related<super::geographies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Geographies.def()
    }
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
