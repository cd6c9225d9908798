//! Invoice routes: snapshot generation and listing.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use super::{error_response, internal_error};
use crate::AppState;
use worktally_db::entities::invoices;
use worktally_db::repositories::invoice::InvoiceError;
use worktally_db::{BillingRepository, InvoiceRepository};
use worktally_shared::AppError;
use worktally_shared::types::{PageRequest, PageResponse};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", post(generate_invoice))
        .route("/invoices", get(list_invoices))
        .route("/invoices/{id}", get(get_invoice))
}

/// Request body for generating an invoice.
#[derive(Debug, Deserialize)]
pub struct GenerateInvoiceRequest {
    /// Billing month (1-12).
    pub month: i32,
    /// Billing year.
    pub year: i32,
}

/// Query parameters for the invoice listing.
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceParams {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Invoice representation in responses.
#[derive(Debug, Serialize)]
pub struct InvoiceItem {
    /// Invoice ID.
    pub id: Uuid,
    /// Billing month.
    pub month: i32,
    /// Billing year.
    pub year: i32,
    /// Total hours across lines.
    pub total_hours: String,
    /// Total billed amount across lines.
    pub total_amount: String,
    /// Generation timestamp.
    pub generated_at: String,
}

impl From<invoices::Model> for InvoiceItem {
    fn from(model: invoices::Model) -> Self {
        Self {
            id: model.id,
            month: model.month,
            year: model.year,
            total_hours: model.total_hours.to_string(),
            total_amount: model.total_amount.to_string(),
            generated_at: model.generated_at.to_rfc3339(),
        }
    }
}

/// POST `/invoices` - Generate an invoice snapshot for one period.
async fn generate_invoice(
    State(state): State<AppState>,
    Json(payload): Json<GenerateInvoiceRequest>,
) -> impl IntoResponse {
    if !(1..=12).contains(&payload.month) {
        return error_response(&AppError::Validation(
            "Month must be between 1 and 12".to_string(),
        ));
    }

    let billing_repo = BillingRepository::new((*state.db).clone());
    let lines = match billing_repo.find_period(payload.month, payload.year).await {
        Ok(lines) => lines,
        Err(e) => {
            error!(error = %e, "Failed to load billing period");
            return internal_error();
        }
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    match repo.generate(payload.month, payload.year, lines).await {
        Ok(invoice) => {
            info!(invoice_id = %invoice.id, month = payload.month, year = payload.year, "invoice generated");
            (
                StatusCode::CREATED,
                Json(json!({ "invoice": InvoiceItem::from(invoice) })),
            )
                .into_response()
        }
        Err(InvoiceError::EmptyPeriod { month, year }) => error_response(
            &AppError::BusinessRule(format!("No billing records for {month}/{year}")),
        ),
        Err(e) => {
            error!(error = %e, "Invoice generation failed");
            internal_error()
        }
    }
}

/// GET `/invoices` - List invoices, newest first.
async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<InvoiceParams>,
) -> impl IntoResponse {
    let page = PageRequest {
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(50),
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    match repo.list(&page).await {
        Ok((rows, total)) => {
            let items: Vec<InvoiceItem> = rows.into_iter().map(InvoiceItem::from).collect();
            let response = PageResponse::new(items, &page, total);
            (
                StatusCode::OK,
                Json(json!({ "data": response.data, "meta": response.meta })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list invoices");
            internal_error()
        }
    }
}

/// GET `/invoices/{id}` - Fetch one invoice with its embedded lines.
async fn get_invoice(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());
    match repo.get(id).await {
        Ok(invoice) => (
            StatusCode::OK,
            Json(json!({
                "invoice": InvoiceItem::from(invoice.clone()),
                "lines": invoice.lines,
            })),
        )
            .into_response(),
        Err(InvoiceError::NotFound(id)) => {
            error_response(&AppError::NotFound(format!("Invoice {id}")))
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch invoice");
            internal_error()
        }
    }
}
