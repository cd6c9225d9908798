//! Invoice repository: append-only period snapshots.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;
use worktally_shared::types::PageRequest;

use crate::entities::{billings, invoices};

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    NotFound(Uuid),

    /// No billing records exist for the requested period.
    #[error("No billing records for {month}/{year}")]
    EmptyPeriod {
        /// Requested month.
        month: i32,
        /// Requested year.
        year: i32,
    },

    /// Billing lines could not be serialized.
    #[error("Failed to serialize invoice lines: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Invoice repository over the invoices table.
#[derive(Debug)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Generates an invoice snapshot for one (month, year).
    ///
    /// Takes the period's billing rows as loaded by
    /// `BillingRepository::find_period`, embeds them as invoice lines, and
    /// totals them. The snapshot is immutable afterwards; regenerating the
    /// same period creates a new invoice rather than editing the old one.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceError::EmptyPeriod`] when the period has no billing
    /// records, or an error if a database operation fails.
    pub async fn generate(
        &self,
        month: i32,
        year: i32,
        lines: Vec<billings::Model>,
    ) -> Result<invoices::Model, InvoiceError> {
        if lines.is_empty() {
            return Err(InvoiceError::EmptyPeriod { month, year });
        }

        let total_hours: Decimal = lines.iter().map(|l| l.hours).sum();
        let total_amount: Decimal = lines.iter().map(|l| l.total_amount).sum();
        let lines_json = serde_json::to_value(&lines)?;

        let model = invoices::ActiveModel {
            id: Set(Uuid::new_v4()),
            month: Set(month),
            year: Set(year),
            lines: Set(lines_json),
            total_hours: Set(total_hours),
            total_amount: Set(total_amount),
            generated_at: Set(Utc::now().into()),
        };
        let invoice = model.insert(&self.db).await?;

        tracing::info!(
            invoice_id = %invoice.id,
            month,
            year,
            lines = lines.len(),
            %total_amount,
            "invoice generated"
        );
        Ok(invoice)
    }

    /// Gets an invoice by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is not found or the query fails.
    pub async fn get(&self, id: Uuid) -> Result<invoices::Model, InvoiceError> {
        invoices::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))
    }

    /// Lists invoices, newest generation first, paginated.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list(
        &self,
        page: &PageRequest,
    ) -> Result<(Vec<invoices::Model>, u64), InvoiceError> {
        let query = invoices::Entity::find();

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(invoices::Column::GeneratedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }
}
