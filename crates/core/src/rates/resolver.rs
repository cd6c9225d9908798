//! Rate lookup over request-type and productivity-tier tables.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::vocab::{ProductivityLevel, RequestType};

/// Which pricing axis to resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSelector {
    /// Price per unit of a request category.
    Request(RequestType),
    /// Tier base rate, independent of request type.
    Productivity(ProductivityLevel),
}

/// In-memory rate tables for one upload or query window.
///
/// Loaded once from the persisted rate rows for the subprojects in scope.
/// `resolve` never fails: early-stage subprojects may have no pricing
/// configured yet, which is modeled as a zero rate.
#[derive(Debug, Default)]
pub struct RateTable {
    request_rates: HashMap<(Uuid, RequestType), Decimal>,
    tier_rates: HashMap<(Uuid, ProductivityLevel), Decimal>,
}

impl RateTable {
    /// Creates an empty rate table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request-type rate for a subproject.
    pub fn insert_request_rate(
        &mut self,
        subproject_id: Uuid,
        request_type: RequestType,
        rate: Decimal,
    ) {
        self.request_rates.insert((subproject_id, request_type), rate);
    }

    /// Registers a productivity-tier base rate for a subproject.
    pub fn insert_tier_rate(
        &mut self,
        subproject_id: Uuid,
        level: ProductivityLevel,
        base_rate: Decimal,
    ) {
        self.tier_rates.insert((subproject_id, level), base_rate);
    }

    /// Resolves the billing rate for a subproject and selector.
    ///
    /// Returns `Decimal::ZERO` when no rate is configured.
    #[must_use]
    pub fn resolve(&self, subproject_id: Uuid, selector: RateSelector) -> Decimal {
        match selector {
            RateSelector::Request(request_type) => self
                .request_rates
                .get(&(subproject_id, request_type))
                .copied()
                .unwrap_or(Decimal::ZERO),
            RateSelector::Productivity(level) => self
                .tier_rates
                .get(&(subproject_id, level))
                .copied()
                .unwrap_or(Decimal::ZERO),
        }
    }
}
