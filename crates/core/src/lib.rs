//! Core business logic for Worktally.
//!
//! This crate contains pure pipeline logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ingest` - Tabular row parsing, validation, and error reports
//! - `hierarchy` - Per-upload entity cache and resolver
//! - `rates` - Billing rate resolution
//! - `allocation` - Allocation aggregation and billing totals
//! - `vocab` - Closed vocabularies for request/process types and tiers

pub mod allocation;
pub mod hierarchy;
pub mod ingest;
pub mod rates;
pub mod vocab;
