//! Allocation summary read routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::{error_response, internal_error};
use crate::AppState;
use worktally_core::rates::RateSelector;
use worktally_core::vocab::RequestType;
use worktally_db::repositories::SummaryFilter;
use worktally_db::{AllocationRepository, RateRepository};
use worktally_shared::AppError;
use worktally_shared::types::{PageRequest, PageResponse};

/// Creates the allocation summary routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/allocations/summary", get(summary))
}

/// Query parameters for the summary listing.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    /// Restrict to one geography.
    pub geography_id: Option<Uuid>,
    /// Restrict to one client.
    pub client_id: Option<Uuid>,
    /// Restrict to one project.
    pub project_id: Option<Uuid>,
    /// Restrict to one subproject.
    pub subproject_id: Option<Uuid>,
    /// Restrict to one request-type label, case-insensitive.
    pub request_type: Option<String>,
    /// Earliest date (inclusive).
    pub from: Option<NaiveDate>,
    /// Latest date (inclusive).
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// One summary row in the response.
#[derive(Debug, Serialize)]
pub struct SummaryItem {
    /// Summary row ID.
    pub id: Uuid,
    /// Geography name.
    pub geography: String,
    /// Client name.
    pub client: String,
    /// Project name.
    pub project: String,
    /// Subproject name.
    pub subproject: String,
    /// Subproject ID, for drill-down filters.
    pub subproject_id: Uuid,
    /// Request-type label.
    pub request_type: String,
    /// Allocation date.
    pub date: NaiveDate,
    /// Allocation count.
    pub count: i64,
    /// Resource names in this group.
    pub resource_names: serde_json::Value,
    /// Rate applied to this group.
    pub rate: String,
    /// `count x rate`.
    pub total_billing: String,
}

/// GET `/allocations/summary` - Filtered, paginated summary listing.
///
/// Page totals cover the returned page; grand totals cover the whole filter
/// match regardless of pagination, and the two agree when pages are summed.
async fn summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> impl IntoResponse {
    let request_type = match params.request_type.as_deref() {
        None => None,
        Some(label) => match RequestType::parse(label) {
            Some(rt) => Some(rt),
            None => {
                return error_response(&AppError::Validation(format!(
                    "Unknown request type: {label}"
                )));
            }
        },
    };
    let filter = SummaryFilter {
        geography_id: params.geography_id,
        client_id: params.client_id,
        project_id: params.project_id,
        subproject_id: params.subproject_id,
        request_type,
        from: params.from,
        to: params.to,
    };
    let page = PageRequest {
        page: params.page.unwrap_or(1),
        per_page: params.per_page.unwrap_or(50),
    };

    let allocation_repo = AllocationRepository::new((*state.db).clone());
    let rate_repo = RateRepository::new((*state.db).clone());

    let (rows, total) = match allocation_repo.list(filter, &page).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Failed to list allocation summaries");
            return internal_error();
        }
    };
    let subproject_ids = match allocation_repo.subproject_ids(filter).await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "Failed to collect summary subprojects");
            return internal_error();
        }
    };
    let rate_table = match rate_repo.load_table(&subproject_ids).await {
        Ok(table) => table,
        Err(e) => {
            error!(error = %e, "Failed to load rate table");
            return internal_error();
        }
    };

    // Rates are resolved at read time so a rate correction re-prices history
    // without rewriting the stored summaries.
    let mut page_count = 0i64;
    let mut page_billing = Decimal::ZERO;
    let items: Vec<SummaryItem> = rows
        .into_iter()
        .map(|row| {
            let rate = RequestType::parse(&row.request_type).map_or(Decimal::ZERO, |rt| {
                rate_table.resolve(row.subproject_id, RateSelector::Request(rt))
            });
            let billing = Decimal::from(row.count) * rate;
            page_count += row.count;
            page_billing += billing;
            SummaryItem {
                id: row.id,
                geography: row.geography_name,
                client: row.client_name,
                project: row.project_name,
                subproject: row.subproject_name,
                subproject_id: row.subproject_id,
                request_type: row.request_type,
                date: row.allocation_date,
                count: row.count,
                resource_names: row.resource_names,
                rate: rate.to_string(),
                total_billing: billing.to_string(),
            }
        })
        .collect();

    let group_counts = match allocation_repo.group_counts(filter).await {
        Ok(counts) => counts,
        Err(e) => {
            error!(error = %e, "Failed to compute grand totals");
            return internal_error();
        }
    };
    let mut grand_count = 0i64;
    let mut grand_billing = Decimal::ZERO;
    for group in group_counts {
        let rate = RequestType::parse(&group.request_type).map_or(Decimal::ZERO, |rt| {
            rate_table.resolve(group.subproject_id, RateSelector::Request(rt))
        });
        grand_count += group.count;
        grand_billing += Decimal::from(group.count) * rate;
    }

    let response = PageResponse::new(items, &page, total);
    (
        StatusCode::OK,
        Json(json!({
            "data": response.data,
            "meta": response.meta,
            "pageTotals": {
                "count": page_count,
                "billing": page_billing.to_string(),
            },
            "grandTotals": {
                "count": grand_count,
                "billing": grand_billing.to_string(),
            }
        })),
    )
        .into_response()
}
