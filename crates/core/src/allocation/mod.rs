//! Allocation aggregation and billing totals.
//!
//! Collapses raw allocation events into per-(subproject, request type, date)
//! summary groups, prices each group through the rate table, and rolls group
//! figures up into overall totals.

pub mod aggregator;
pub mod types;

#[cfg(test)]
mod tests;

pub use aggregator::{aggregate, totals};
pub use types::{AllocationEvent, AllocationGroup, AllocationTotals};
