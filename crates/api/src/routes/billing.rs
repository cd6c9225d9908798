//! Billing read routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::internal_error;
use crate::AppState;
use worktally_db::BillingRepository;
use worktally_shared::types::{PageRequest, PageResponse};

/// Creates the billing routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/billing", get(list_billing))
}

/// Query parameters for the billing listing.
#[derive(Debug, Default, Deserialize)]
pub struct BillingParams {
    /// Restrict to one month (1-12).
    pub month: Option<i32>,
    /// Restrict to one year.
    pub year: Option<i32>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// One billing record in the response.
#[derive(Debug, Serialize)]
pub struct BillingItem {
    /// Billing record ID.
    pub id: Uuid,
    /// Resource ID.
    pub resource_id: Uuid,
    /// Subproject ID.
    pub subproject_id: Uuid,
    /// Request-type label.
    pub request_type: String,
    /// Billing month.
    pub month: i32,
    /// Billing year.
    pub year: i32,
    /// Hours worked.
    pub hours: String,
    /// Per-unit rate applied.
    pub rate: String,
    /// Flat rate applied.
    pub flatrate: String,
    /// Internal cost.
    pub costing: String,
    /// Total billed amount.
    pub total_amount: String,
    /// Billable status label.
    pub billable_status: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// GET `/billing` - Period listing of billing records.
async fn list_billing(
    State(state): State<AppState>,
    Query(params): Query<BillingParams>,
) -> impl IntoResponse {
    let page = PageRequest {
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(50),
    };

    let repo = BillingRepository::new((*state.db).clone());
    match repo.list_period(params.month, params.year, &page).await {
        Ok((rows, total)) => {
            let items: Vec<BillingItem> = rows
                .into_iter()
                .map(|row| BillingItem {
                    id: row.id,
                    resource_id: row.resource_id,
                    subproject_id: row.subproject_id,
                    request_type: row.request_type,
                    month: row.month,
                    year: row.year,
                    hours: row.hours.to_string(),
                    rate: row.rate.to_string(),
                    flatrate: row.flatrate.to_string(),
                    costing: row.costing.to_string(),
                    total_amount: row.total_amount.to_string(),
                    billable_status: row.billable_status,
                    updated_at: row.updated_at.to_rfc3339(),
                })
                .collect();

            let response = PageResponse::new(items, &page, total);
            (
                StatusCode::OK,
                Json(json!({ "data": response.data, "meta": response.meta })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list billing records");
            internal_error()
        }
    }
}
