//! Billing rate resolution.
//!
//! Rates come from two axes: per-subproject request-type rate rows, and
//! per-subproject productivity tiers. Absence of a rate is a valid zero-rate
//! state, not an error.

pub mod resolver;

#[cfg(test)]
mod tests;

pub use resolver::{RateSelector, RateTable};
