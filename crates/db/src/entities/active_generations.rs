//! `SeaORM` Entity for the active_generations table.
//!
//! Full-replace imports write a fresh generation of hierarchy rows, then flip
//! the pointer here; readers only see the active generation, which closes the
//! delete-then-insert crash window.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "active_generations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub scope: String,
    pub generation: Uuid,
    pub activated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
