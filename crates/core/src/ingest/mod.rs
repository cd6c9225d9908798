//! Tabular ingestion: parsing, validation, and error reports.
//!
//! This module implements the front half of the upload pipeline:
//! - Header mapping from heterogeneous source columns to canonical fields
//! - Streaming row parsing with blank-row dropping
//! - Fixed-order field validation with accumulated per-row messages
//! - The downloadable delimited error report

pub mod error;
pub mod headers;
pub mod parser;
pub mod report;
pub mod row;
pub mod validate;

#[cfg(test)]
mod tests;

pub use error::IngestError;
pub use headers::{canonical_field, field};
pub use parser::RowParser;
pub use report::error_report;
pub use row::RawRow;
pub use validate::{
    AllocationFeedRow, RateCardRow, RowError, Validated, composite_key, validate_allocations,
    validate_rate_card,
};
