//! `SeaORM` Entity for the subprojects (locations) table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "subprojects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub project_id: Uuid,
    pub client_id: Uuid,
    pub geography_id: Uuid,
    pub project_name: String,
    pub client_name: String,
    pub geography_name: String,
    pub flatrate: Decimal,
    pub status: String,
    pub generation: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Projects,
    #[sea_orm(has_many = "super::request_type_rates::Entity")]
    RequestTypeRates,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::request_type_rates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestTypeRates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
