//! Fixed-order row validation.
//!
//! Rules run in a fixed order per row: required-field presence, numeric
//! parseability, vocabulary membership, then the per-file duplicate-key
//! check. Every violated rule appends a message; rows with one or more
//! messages land in the error set and are excluded from further processing.
//! Any invalid row fails the whole file (fail-closed on data shape).

use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::headers::field;
use super::row::RawRow;
use crate::hierarchy::normalize_key;
use crate::vocab::{ProcessType, ProductivityLevel, RequestType};

/// Accumulated messages for one invalid row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-indexed data row number.
    pub row_number: usize,
    /// Human-readable rule violations, in rule order.
    pub messages: Vec<String>,
}

/// Validation outcome: typed rows plus the error set.
#[derive(Debug)]
pub struct Validated<T> {
    /// Rows that passed every rule.
    pub rows: Vec<T>,
    /// Rows that violated at least one rule.
    pub errors: Vec<RowError>,
}

impl<T> Validated<T> {
    /// True when the file passed validation and may proceed to resolution.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A validated rate-card row (hierarchy + pricing feed).
#[derive(Debug, Clone)]
pub struct RateCardRow {
    /// 1-indexed data row number.
    pub row_number: usize,
    /// Geography name as supplied.
    pub geography: String,
    /// Client name as supplied.
    pub client: String,
    /// Process type (becomes the project name).
    pub process: ProcessType,
    /// Subproject (location) name as supplied.
    pub subproject: String,
    /// Request category.
    pub request_type: RequestType,
    /// Per-unit rate.
    pub rate: Decimal,
    /// Optional flat rate.
    pub flatrate: Option<Decimal>,
    /// Optional productivity tier (level, base rate).
    pub productivity: Option<(ProductivityLevel, Decimal)>,
}

/// A validated allocation-feed row.
#[derive(Debug, Clone)]
pub struct AllocationFeedRow {
    /// 1-indexed data row number.
    pub row_number: usize,
    /// Geography name as supplied.
    pub geography: String,
    /// Combined process string; carries the embedded client token.
    pub process: String,
    /// Subproject (location) name as supplied.
    pub subproject: String,
    /// Request category.
    pub request_type: RequestType,
    /// Calendar date of the allocation.
    pub date: NaiveDate,
    /// Resource display name.
    pub resource_name: String,
    /// Resource email.
    pub resource_email: String,
}

/// Validates a parsed rate-card file.
#[must_use]
pub fn validate_rate_card(rows: &[RawRow]) -> Validated<RateCardRow> {
    let mut out = Validated {
        rows: Vec::with_capacity(rows.len()),
        errors: Vec::new(),
    };
    let mut seen_keys: HashSet<String> = HashSet::with_capacity(rows.len());

    for row in rows {
        let mut messages = Vec::new();

        let geography = require(row, field::GEOGRAPHY, "Geography", &mut messages);
        let client = require(row, field::CLIENT, "Client", &mut messages);
        let process_raw = require(row, field::PROJECT, "Process Type", &mut messages);
        let subproject = require(row, field::SUBPROJECT, "Location", &mut messages);
        let request_raw = require(row, field::REQUEST_TYPE, "Request Type", &mut messages);
        let rate_raw = require(row, field::RATE, "Rate", &mut messages);

        let rate = rate_raw.and_then(|raw| parse_decimal(raw, "Rate", &mut messages));
        let flatrate = row
            .get(field::FLATRATE)
            .and_then(|raw| parse_decimal(raw, "Flat Rate", &mut messages));

        let process = process_raw.and_then(|raw| {
            ProcessType::parse(raw).or_else(|| {
                messages.push(format!("Unknown process type '{raw}'"));
                None
            })
        });
        let request_type = request_raw.and_then(|raw| {
            RequestType::parse(raw).or_else(|| {
                messages.push(format!("Unknown request type '{raw}'"));
                None
            })
        });

        let productivity = validate_productivity(row, &mut messages);

        // Per-file duplicate detection on the normalized composite key.
        // Only rows that passed every other rule claim their key; an invalid
        // row must not make a later well-formed row look like the duplicate.
        if let (Some(geo), Some(cli), Some(proc_), Some(sub), Some(req)) =
            (geography, client, process, subproject, request_type)
        {
            let key = composite_key(geo, cli, proc_.label(), sub, req.label());
            if seen_keys.contains(&key) {
                messages.push(format!("Duplicate row for key '{key}'"));
            } else if messages.is_empty() {
                seen_keys.insert(key);
            }

            if messages.is_empty() {
                // rate is present whenever messages is empty
                if let Some(rate) = rate {
                    out.rows.push(RateCardRow {
                        row_number: row.number,
                        geography: geo.to_string(),
                        client: cli.to_string(),
                        process: proc_,
                        subproject: sub.to_string(),
                        request_type: req,
                        rate,
                        flatrate,
                        productivity,
                    });
                    continue;
                }
            }
        }

        out.errors.push(RowError {
            row_number: row.number,
            messages,
        });
    }

    out
}

/// Validates a parsed allocation file.
#[must_use]
pub fn validate_allocations(rows: &[RawRow]) -> Validated<AllocationFeedRow> {
    let mut out = Validated {
        rows: Vec::with_capacity(rows.len()),
        errors: Vec::new(),
    };

    for row in rows {
        let mut messages = Vec::new();

        let geography = require(row, field::GEOGRAPHY, "Geography", &mut messages);
        let process = require(row, field::PROJECT, "Process", &mut messages);
        let subproject = require(row, field::SUBPROJECT, "Location", &mut messages);
        let request_raw = require(row, field::REQUEST_TYPE, "Request Type", &mut messages);
        let date_raw = require(row, field::ALLOCATION_DATE, "Date", &mut messages);
        let resource_name = require(row, field::RESOURCE_NAME, "Resource Name", &mut messages);
        let resource_email = require(row, field::RESOURCE_EMAIL, "Resource Email", &mut messages);

        let request_type = request_raw.and_then(|raw| {
            RequestType::parse(raw).or_else(|| {
                messages.push(format!("Unknown request type '{raw}'"));
                None
            })
        });
        let date = date_raw.and_then(|raw| {
            parse_date(raw).or_else(|| {
                messages.push(format!("Unparseable date '{raw}'"));
                None
            })
        });

        if messages.is_empty() {
            if let (
                Some(geography),
                Some(process),
                Some(subproject),
                Some(request_type),
                Some(date),
                Some(resource_name),
                Some(resource_email),
            ) = (
                geography,
                process,
                subproject,
                request_type,
                date,
                resource_name,
                resource_email,
            ) {
                out.rows.push(AllocationFeedRow {
                    row_number: row.number,
                    geography: geography.to_string(),
                    process: process.to_string(),
                    subproject: subproject.to_string(),
                    request_type,
                    date,
                    resource_name: resource_name.to_string(),
                    resource_email: resource_email.to_string(),
                });
                continue;
            }
        }

        out.errors.push(RowError {
            row_number: row.number,
            messages,
        });
    }

    out
}

fn require<'r>(
    row: &'r RawRow,
    field_name: &str,
    display: &str,
    messages: &mut Vec<String>,
) -> Option<&'r str> {
    let value = row.get(field_name);
    if value.is_none() {
        messages.push(format!("Missing required field '{display}'"));
    }
    value
}

fn parse_decimal(raw: &str, display: &str, messages: &mut Vec<String>) -> Option<Decimal> {
    // Decimal has no NaN; any unparseable value (including "NaN") is rejected.
    match Decimal::from_str(raw) {
        Ok(value) => Some(value),
        Err(_) => {
            messages.push(format!("{display} '{raw}' is not a number"));
            None
        }
    }
}

fn validate_productivity(
    row: &RawRow,
    messages: &mut Vec<String>,
) -> Option<(ProductivityLevel, Decimal)> {
    let level_raw = row.get(field::PRODUCTIVITY_LEVEL);
    let base_raw = row.get(field::BASE_RATE);

    match (level_raw, base_raw) {
        (None, None) => None,
        (Some(level_raw), Some(base_raw)) => {
            let level = ProductivityLevel::parse(level_raw).or_else(|| {
                messages.push(format!("Unknown productivity level '{level_raw}'"));
                None
            })?;
            let base = parse_decimal(base_raw, "Base Rate", messages)?;
            Some((level, base))
        }
        (Some(_), None) => {
            messages.push("Productivity level given without a base rate".to_string());
            None
        }
        (None, Some(_)) => {
            messages.push("Base rate given without a productivity level".to_string());
            None
        }
    }
}

/// Accepted allocation date formats, most common first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%b-%Y"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Builds the normalized per-file duplicate key.
#[must_use]
pub fn composite_key(
    geography: &str,
    client: &str,
    project: &str,
    subproject: &str,
    request_type: &str,
) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        normalize_key(geography),
        normalize_key(client),
        normalize_key(project),
        normalize_key(subproject),
        normalize_key(request_type),
    )
}
