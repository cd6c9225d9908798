//! `SeaORM` Entity for the invoices table.
//!
//! An invoice is an immutable snapshot of billing records for one period.
//! Later edits create new invoices; rows are never mutated in place.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub month: i32,
    pub year: i32,
    /// Embedded billing-shaped records as a JSON array.
    pub lines: Json,
    pub total_hours: Decimal,
    pub total_amount: Decimal,
    pub generated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
