//! Bulk import routes for rate cards and allocation feeds.
//!
//! Both endpoints share one contract: shape problems (validation or
//! resolution) reject the whole file with a downloadable CSV error report,
//! write-phase problems are per-record and surface as HTTP 207 with a
//! `failedRecords` list, and a clean run returns plain JSON counts.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use super::{error_response, internal_error};
use crate::AppState;
use worktally_core::allocation::{AllocationEvent, aggregate};
use worktally_core::hierarchy::{
    ClientSource, HierarchyCache, HierarchyResolver, ResolvedChain, normalize_key,
};
use worktally_core::ingest::{
    RawRow, RowError, RowParser, field, validate_allocations, validate_rate_card,
};
use worktally_core::rates::{RateSelector, RateTable};
use worktally_core::vocab::{ProcessType, RequestType};
use worktally_db::repositories::hierarchy::stage_rows;
use worktally_db::{
    AllocationRepository, BillingRepository, FailedRecord, HierarchyRepository, ImportOutcome,
    RateRepository, ResourceRepository, UpsertBillingInput,
};
use worktally_shared::{AppError, AppResult};

/// Columns a rate-card upload must carry.
const RATE_CARD_COLUMNS: &[&str] = &[
    field::GEOGRAPHY,
    field::CLIENT,
    field::PROJECT,
    field::SUBPROJECT,
    field::REQUEST_TYPE,
    field::RATE,
];

/// Columns an allocation upload must carry.
const ALLOCATION_COLUMNS: &[&str] = &[
    field::GEOGRAPHY,
    field::PROJECT,
    field::SUBPROJECT,
    field::REQUEST_TYPE,
    field::ALLOCATION_DATE,
    field::RESOURCE_NAME,
    field::RESOURCE_EMAIL,
];

/// Creates the import routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/imports/rate-card", post(import_rate_card))
        .route("/imports/allocations", post(import_allocations))
}

// ============================================================================
// Request Types
// ============================================================================

/// How a rate-card import applies to the stored hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Stage a fresh generation and swap it in, replacing everything.
    #[default]
    Replace,
    /// Create missing entities and update rates; leave the rest untouched.
    Incremental,
}

/// Query parameters for the rate-card import.
#[derive(Debug, Default, Deserialize)]
pub struct RateCardParams {
    /// Import mode, `replace` by default.
    #[serde(default)]
    pub mode: ImportMode,
    /// When true, report the write plan without touching the database.
    #[serde(default)]
    pub dry_run: bool,
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Reads the uploaded file bytes out of the multipart body.
async fn read_upload(multipart: &mut Multipart, limit: usize) -> Result<Vec<u8>, Response> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_multipart",
                "message": e.to_string()
            })),
        )
            .into_response()
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "unreadable_upload",
                    "message": e.to_string()
                })),
            )
                .into_response()
        })?;
        if bytes.len() > limit {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "error": "upload_too_large",
                    "message": format!("Upload exceeds the {limit} byte limit")
                })),
            )
                .into_response());
        }
        return Ok(bytes.to_vec());
    }

    Err((
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "missing_file",
            "message": "Multipart body must contain a 'file' field"
        })),
    )
        .into_response())
}

/// Parses upload bytes into canonical columns and rows, checking that the
/// required columns for the feed were recognized in the header row.
fn parse_rows(bytes: &[u8], required: &[&'static str]) -> AppResult<(Vec<String>, Vec<RawRow>)> {
    let parser = RowParser::new(bytes).map_err(|e| AppError::Validation(e.to_string()))?;
    parser
        .require_columns(required)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let columns = parser.columns().to_vec();

    let mut rows = Vec::new();
    for row in parser {
        rows.push(row.map_err(|e| AppError::Validation(e.to_string()))?);
    }

    Ok((columns, rows))
}

/// Builds the rejection response carrying the downloadable CSV error report.
/// The status comes from the upload-rejected error contract.
fn report_response(columns: &[String], rows: &[RawRow], errors: &[RowError]) -> Response {
    let rejection = AppError::UploadRejected(errors.len());
    match worktally_core::ingest::error_report(columns, rows, errors) {
        Ok(body) => (
            StatusCode::from_u16(rejection.status_code()).unwrap_or(StatusCode::BAD_REQUEST),
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"error-report.csv\"",
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build error report");
            internal_error()
        }
    }
}

fn failed_records_json(failed: &[FailedRecord]) -> serde_json::Value {
    json!(
        failed
            .iter()
            .map(|f| {
                json!({
                    "rowNumber": f.row_number,
                    "reason": f.reason
                })
            })
            .collect::<Vec<_>>()
    )
}

fn outcome_response(mode: &str, outcome: &ImportOutcome) -> Response {
    let counts = json!({
        "geographies": outcome.counts.geographies,
        "clients": outcome.counts.clients,
        "projects": outcome.counts.projects,
        "subprojects": outcome.counts.subprojects,
        "rates": outcome.counts.rates,
        "tiers": outcome.counts.tiers,
    });

    if outcome.failed.is_empty() {
        (
            StatusCode::OK,
            Json(json!({
                "status": "completed",
                "mode": mode,
                "counts": counts
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::MULTI_STATUS,
            Json(json!({
                "status": "partial",
                "mode": mode,
                "counts": counts,
                "failedRecords": failed_records_json(&outcome.failed)
            })),
        )
            .into_response()
    }
}

/// Matches the process-type portion at the front of a combined process
/// string such as `Intake_Client_3`.
fn process_label(combined: &str) -> Option<&'static str> {
    let key = normalize_key(combined);
    ProcessType::ALL
        .into_iter()
        .map(ProcessType::label)
        .find(|label| key.starts_with(&normalize_key(label)))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/imports/rate-card` - Upload the hierarchy + pricing feed.
async fn import_rate_card(
    State(state): State<AppState>,
    Query(params): Query<RateCardParams>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let bytes = match read_upload(&mut multipart, state.import.max_upload_bytes).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };
    let (columns, rows) = match parse_rows(&bytes, RATE_CARD_COLUMNS) {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&e),
    };

    let validated = validate_rate_card(&rows);
    if !validated.is_clean() {
        info!(
            rows = rows.len(),
            invalid = validated.errors.len(),
            "rate card rejected by validation"
        );
        return report_response(&columns, &rows, &validated.errors);
    }

    if params.dry_run {
        let staged = stage_rows(&validated.rows);
        return (
            StatusCode::OK,
            Json(json!({
                "status": "dry_run",
                "mode": match params.mode {
                    ImportMode::Replace => "replace",
                    ImportMode::Incremental => "incremental",
                },
                "plan": {
                    "geographies": staged.geographies.len(),
                    "clients": staged.clients.len(),
                    "projects": staged.projects.len(),
                    "subprojects": staged.subprojects.len(),
                    "rates": staged.rates.len(),
                    "tiers": staged.tiers.len(),
                }
            })),
        )
            .into_response();
    }

    let repo = HierarchyRepository::new((*state.db).clone());
    let result = match params.mode {
        ImportMode::Replace => {
            repo.full_replace(&validated.rows, state.import.batch_size)
                .await
        }
        ImportMode::Incremental => repo.apply_incremental(&validated.rows).await,
    };

    match result {
        Ok(outcome) => {
            let mode = match params.mode {
                ImportMode::Replace => "replace",
                ImportMode::Incremental => "incremental",
            };
            outcome_response(mode, &outcome)
        }
        Err(e) => {
            error!(error = %e, "Rate card import failed");
            internal_error()
        }
    }
}

/// One pending billing row, accumulated per resource and billing key.
struct BillingAccum {
    resource_name: String,
    chain: ResolvedChain,
    request_type: RequestType,
    month: i32,
    year: i32,
    count: u64,
    first_row: usize,
}

/// POST `/imports/allocations` - Upload the allocation feed.
#[allow(clippy::too_many_lines)]
async fn import_allocations(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let bytes = match read_upload(&mut multipart, state.import.max_upload_bytes).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };
    let (columns, rows) = match parse_rows(&bytes, ALLOCATION_COLUMNS) {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&e),
    };

    let validated = validate_allocations(&rows);
    if !validated.is_clean() {
        info!(
            rows = rows.len(),
            invalid = validated.errors.len(),
            "allocation feed rejected by validation"
        );
        return report_response(&columns, &rows, &validated.errors);
    }

    // Resolve every row against a cache built once for this upload. Any miss
    // fails the whole file before a single write happens.
    let hierarchy_repo = HierarchyRepository::new((*state.db).clone());
    let snapshot = match hierarchy_repo.load_active_snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, "Failed to load hierarchy snapshot");
            return internal_error();
        }
    };
    let cache = HierarchyCache::from_snapshot(&snapshot);
    let resolver = HierarchyResolver::new(&cache);

    let mut resolved: Vec<(&worktally_core::ingest::AllocationFeedRow, ResolvedChain)> =
        Vec::with_capacity(validated.rows.len());
    let mut misses: Vec<RowError> = Vec::new();
    for row in &validated.rows {
        let Some(project_name) = process_label(&row.process) else {
            misses.push(RowError {
                row_number: row.row_number,
                messages: vec![format!("No process type recognized in '{}'", row.process)],
            });
            continue;
        };
        match resolver.resolve(
            row.row_number,
            &row.geography,
            ClientSource::Embedded(&row.process),
            project_name,
            &row.subproject,
        ) {
            Ok(chain) => resolved.push((row, chain)),
            Err(miss) => misses.push(RowError {
                row_number: miss.row_number,
                messages: vec![miss.reason],
            }),
        }
    }
    if !misses.is_empty() {
        info!(
            rows = validated.rows.len(),
            unresolved = misses.len(),
            "allocation feed rejected by resolution"
        );
        return report_response(&columns, &rows, &misses);
    }

    // Aggregate into summary groups priced through the rate table.
    let subproject_ids: Vec<Uuid> = {
        let mut ids: Vec<Uuid> = resolved.iter().map(|(_, c)| c.subproject.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    };
    let rate_repo = RateRepository::new((*state.db).clone());
    let rate_table: RateTable = match rate_repo.load_table(&subproject_ids).await {
        Ok(table) => table,
        Err(e) => {
            error!(error = %e, "Failed to load rate table");
            return internal_error();
        }
    };

    let events: Vec<AllocationEvent> = resolved
        .iter()
        .map(|(row, chain)| AllocationEvent {
            geography_id: chain.geography.id,
            client_id: chain.client.id,
            project_id: chain.project.id,
            subproject_id: chain.subproject.id,
            geography_name: chain.geography.name.clone(),
            client_name: chain.client.name.clone(),
            project_name: chain.project.name.clone(),
            subproject_name: chain.subproject.name.clone(),
            request_type: row.request_type,
            date: row.date,
            resource_name: row.resource_name.clone(),
        })
        .collect();
    let groups = aggregate(events, &rate_table);

    let (start, end) = match date_range(&validated.rows) {
        Some(range) => range,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "empty_file",
                    "message": "No data rows in upload"
                })),
            )
                .into_response();
        }
    };

    let allocation_repo = AllocationRepository::new((*state.db).clone());
    let summaries = match allocation_repo
        .replace_window(&groups, start, end, state.import.batch_size)
        .await
    {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Failed to write allocation summaries");
            return internal_error();
        }
    };

    // Billing rolls up per (resource, subproject, request type, month, year).
    let mut billing: HashMap<(String, Uuid, RequestType, i32, i32), BillingAccum> = HashMap::new();
    for (row, chain) in &resolved {
        let email = row.resource_email.trim().to_lowercase();
        let key = (
            email,
            chain.subproject.id,
            row.request_type,
            row.date.month().cast_signed(),
            row.date.year(),
        );
        billing
            .entry(key)
            .and_modify(|accum| {
                accum.count += 1;
                accum.first_row = accum.first_row.min(row.row_number);
            })
            .or_insert_with(|| BillingAccum {
                resource_name: row.resource_name.clone(),
                chain: chain.clone(),
                request_type: row.request_type,
                month: row.date.month().cast_signed(),
                year: row.date.year(),
                count: 1,
                first_row: row.row_number,
            });
    }

    let resource_repo = ResourceRepository::new((*state.db).clone());
    let billing_repo = BillingRepository::new((*state.db).clone());
    let mut failed: Vec<FailedRecord> = Vec::new();
    let mut pending: Vec<(usize, UpsertBillingInput)> = Vec::with_capacity(billing.len());

    let mut ordered: Vec<(&(String, Uuid, RequestType, i32, i32), &BillingAccum)> =
        billing.iter().collect();
    ordered.sort_by_key(|(_, accum)| accum.first_row);

    for ((email, _, _, _, _), accum) in ordered {
        let resource = match resource_repo
            .upsert_by_email(&accum.resource_name, email)
            .await
        {
            Ok(resource) => resource,
            Err(e) => {
                failed.push(FailedRecord {
                    row_number: accum.first_row,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if let Err(e) = resource_repo
            .ensure_assignment(
                resource.id,
                accum.chain.geography.id,
                accum.chain.client.id,
                accum.chain.project.id,
                accum.chain.subproject.id,
            )
            .await
        {
            failed.push(FailedRecord {
                row_number: accum.first_row,
                reason: e.to_string(),
            });
            continue;
        }

        let rate = rate_table.resolve(
            accum.chain.subproject.id,
            RateSelector::Request(accum.request_type),
        );
        let flatrate = if accum.chain.subproject.flatrate == Decimal::ZERO {
            accum.chain.project.flatrate
        } else {
            accum.chain.subproject.flatrate
        };
        let hours = Decimal::from(accum.count);
        let costing = hours * rate;

        pending.push((
            accum.first_row,
            UpsertBillingInput {
                geography_id: accum.chain.geography.id,
                client_id: accum.chain.client.id,
                project_id: accum.chain.project.id,
                subproject_id: accum.chain.subproject.id,
                resource_id: resource.id,
                request_type: accum.request_type.label().to_string(),
                month: accum.month,
                year: accum.year,
                hours,
                rate,
                flatrate,
                costing,
                total_amount: costing + flatrate,
                billable_status: "billable".to_string(),
            },
        ));
    }

    let (billing_counts, billing_failed) = billing_repo.upsert_many(pending).await;
    failed.extend(billing_failed);
    let billing_created = billing_counts.created;
    let billing_updated = billing_counts.updated;

    info!(
        rows = validated.rows.len(),
        summaries,
        billing_created,
        billing_updated,
        failed = failed.len(),
        "allocation import complete"
    );

    let counts = json!({
        "rows": validated.rows.len(),
        "summaries": summaries,
        "billingCreated": billing_created,
        "billingUpdated": billing_updated,
    });
    if failed.is_empty() {
        (
            StatusCode::OK,
            Json(json!({ "status": "completed", "counts": counts })),
        )
            .into_response()
    } else {
        (
            StatusCode::MULTI_STATUS,
            Json(json!({
                "status": "partial",
                "counts": counts,
                "failedRecords": failed_records_json(&failed)
            })),
        )
            .into_response()
    }
}

/// The inclusive date range covered by an upload.
fn date_range(rows: &[worktally_core::ingest::AllocationFeedRow]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = rows.iter().map(|row| row.date);
    let first = dates.next()?;
    let (start, end) = dates.fold((first, first), |(min, max), date| {
        (min.min(date), max.max(date))
    });
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::process_label;

    #[rstest]
    #[case("Intake_Client_3", Some("Intake"))]
    #[case("quality control_Client_12", Some("Quality Control"))]
    #[case("INDEXING-Client-4", Some("Indexing"))]
    #[case("Shipping_Client_1", None)]
    fn recognizes_process_prefix(#[case] combined: &str, #[case] expected: Option<&str>) {
        assert_eq!(process_label(combined), expected);
    }
}
