//! Tests for rate resolution.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::resolver::{RateSelector, RateTable};
use crate::vocab::{ProductivityLevel, RequestType};

#[test]
fn test_request_type_rate_lookup() {
    let subproject = Uuid::new_v4();
    let mut table = RateTable::new();
    table.insert_request_rate(subproject, RequestType::Key, dec!(2.5));
    table.insert_request_rate(subproject, RequestType::Duplicate, dec!(0.75));

    assert_eq!(
        table.resolve(subproject, RateSelector::Request(RequestType::Key)),
        dec!(2.5)
    );
    assert_eq!(
        table.resolve(subproject, RateSelector::Request(RequestType::Duplicate)),
        dec!(0.75)
    );
}

#[test]
fn test_missing_rate_defaults_to_zero() {
    let subproject = Uuid::new_v4();
    let table = RateTable::new();

    assert_eq!(
        table.resolve(subproject, RateSelector::Request(RequestType::NewRequest)),
        Decimal::ZERO
    );
    assert_eq!(
        table.resolve(subproject, RateSelector::Productivity(ProductivityLevel::Best)),
        Decimal::ZERO
    );
}

#[test]
fn test_rate_is_scoped_to_subproject() {
    let site_a = Uuid::new_v4();
    let site_b = Uuid::new_v4();
    let mut table = RateTable::new();
    table.insert_request_rate(site_a, RequestType::Key, dec!(2.5));

    assert_eq!(
        table.resolve(site_b, RateSelector::Request(RequestType::Key)),
        Decimal::ZERO
    );
}

#[test]
fn test_tier_rate_lookup() {
    let subproject = Uuid::new_v4();
    let mut table = RateTable::new();
    table.insert_tier_rate(subproject, ProductivityLevel::High, dec!(18));

    assert_eq!(
        table.resolve(subproject, RateSelector::Productivity(ProductivityLevel::High)),
        dec!(18)
    );
    assert_eq!(
        table.resolve(subproject, RateSelector::Productivity(ProductivityLevel::Low)),
        Decimal::ZERO
    );
}
