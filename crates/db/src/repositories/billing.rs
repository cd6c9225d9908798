//! Billing repository: upserts on the compound business key.
//!
//! A billing row is unique per (resource, subproject, request type, month,
//! year). Re-importing a month's data updates the existing rows in place
//! instead of stacking duplicates.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;
use worktally_shared::types::PageRequest;

use super::hierarchy::FailedRecord;
use crate::entities::billings;

/// Error types for billing operations.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for upserting a billing record.
#[derive(Debug, Clone)]
pub struct UpsertBillingInput {
    /// Geography ID.
    pub geography_id: Uuid,
    /// Client ID.
    pub client_id: Uuid,
    /// Project ID.
    pub project_id: Uuid,
    /// Subproject ID.
    pub subproject_id: Uuid,
    /// Resource ID.
    pub resource_id: Uuid,
    /// Request-type label.
    pub request_type: String,
    /// Billing month (1-12).
    pub month: i32,
    /// Billing year.
    pub year: i32,
    /// Hours worked.
    pub hours: Decimal,
    /// Per-unit rate applied.
    pub rate: Decimal,
    /// Flat rate applied, zero when none.
    pub flatrate: Decimal,
    /// Internal cost.
    pub costing: Decimal,
    /// Total billed amount.
    pub total_amount: Decimal,
    /// Billable status label.
    pub billable_status: String,
}

/// Outcome of a billing batch write.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillingWriteCounts {
    /// Rows newly created.
    pub created: u64,
    /// Existing rows updated.
    pub updated: u64,
}

/// Billing repository over the billings table.
#[derive(Debug)]
pub struct BillingRepository {
    db: DatabaseConnection,
}

impl BillingRepository {
    /// Creates a new billing repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Upserts one billing record on the compound key.
    ///
    /// Returns `true` when a new row was created.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn upsert(&self, input: UpsertBillingInput) -> Result<bool, BillingError> {
        let existing = billings::Entity::find()
            .filter(billings::Column::ResourceId.eq(input.resource_id))
            .filter(billings::Column::SubprojectId.eq(input.subproject_id))
            .filter(billings::Column::RequestType.eq(&input.request_type))
            .filter(billings::Column::Month.eq(input.month))
            .filter(billings::Column::Year.eq(input.year))
            .one(&self.db)
            .await?;
        let now = Utc::now().into();

        match existing {
            Some(model) => {
                let mut active: billings::ActiveModel = model.into();
                active.hours = Set(input.hours);
                active.rate = Set(input.rate);
                active.flatrate = Set(input.flatrate);
                active.costing = Set(input.costing);
                active.total_amount = Set(input.total_amount);
                active.billable_status = Set(input.billable_status);
                active.updated_at = Set(now);
                active.update(&self.db).await?;
                Ok(false)
            }
            None => {
                let model = billings::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    geography_id: Set(input.geography_id),
                    client_id: Set(input.client_id),
                    project_id: Set(input.project_id),
                    subproject_id: Set(input.subproject_id),
                    resource_id: Set(input.resource_id),
                    request_type: Set(input.request_type),
                    month: Set(input.month),
                    year: Set(input.year),
                    hours: Set(input.hours),
                    rate: Set(input.rate),
                    flatrate: Set(input.flatrate),
                    costing: Set(input.costing),
                    total_amount: Set(input.total_amount),
                    billable_status: Set(input.billable_status),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&self.db).await?;
                Ok(true)
            }
        }
    }

    /// Upserts a batch of billing records, counting creates and updates.
    ///
    /// Each input is tagged with the source row that produced it. A failing
    /// record is reported and does not abort the rest of the batch; earlier
    /// writes stay committed.
    pub async fn upsert_many(
        &self,
        inputs: Vec<(usize, UpsertBillingInput)>,
    ) -> (BillingWriteCounts, Vec<FailedRecord>) {
        let mut counts = BillingWriteCounts::default();
        let mut failed = Vec::new();
        for (row_number, input) in inputs {
            match self.upsert(input).await {
                Ok(true) => counts.created += 1,
                Ok(false) => counts.updated += 1,
                Err(err) => failed.push(FailedRecord {
                    row_number,
                    reason: err.to_string(),
                }),
            }
        }
        (counts, failed)
    }

    /// Lists billing records for a period, paginated.
    ///
    /// Returns the page of rows and the total match count.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_period(
        &self,
        month: Option<i32>,
        year: Option<i32>,
        page: &PageRequest,
    ) -> Result<(Vec<billings::Model>, u64), BillingError> {
        let mut query = billings::Entity::find();
        if let Some(month) = month {
            query = query.filter(billings::Column::Month.eq(month));
        }
        if let Some(year) = year {
            query = query.filter(billings::Column::Year.eq(year));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(billings::Column::Year)
            .order_by_desc(billings::Column::Month)
            .order_by_asc(billings::Column::RequestType)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Loads every billing record for one (month, year), unpaginated.
    ///
    /// Used for invoice generation, which needs the full period.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn find_period(
        &self,
        month: i32,
        year: i32,
    ) -> Result<Vec<billings::Model>, BillingError> {
        Ok(billings::Entity::find()
            .filter(billings::Column::Month.eq(month))
            .filter(billings::Column::Year.eq(year))
            .order_by_asc(billings::Column::RequestType)
            .all(&self.db)
            .await?)
    }
}

#[cfg(test)]
#[path = "billing_tests.rs"]
mod tests;
