//! `SeaORM` Entity for the productivity_tiers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "productivity_tiers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub subproject_id: Uuid,
    pub level: String,
    pub base_rate: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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
