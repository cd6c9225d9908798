//! Tests for allocation aggregation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::aggregator::{aggregate, totals};
use super::types::AllocationEvent;
use crate::rates::RateTable;
use crate::vocab::RequestType;

fn event(
    subproject_id: Uuid,
    request_type: RequestType,
    date: NaiveDate,
    resource: &str,
) -> AllocationEvent {
    AllocationEvent {
        geography_id: Uuid::nil(),
        client_id: Uuid::nil(),
        project_id: Uuid::nil(),
        subproject_id,
        geography_name: "Offshore".to_string(),
        client_name: "Acme".to_string(),
        project_name: "Intake".to_string(),
        subproject_name: "SiteA".to_string(),
        request_type,
        date,
        resource_name: resource.to_string(),
    }
}

#[test]
fn test_seven_rows_at_rate_two_point_five() {
    let subproject = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
    let mut rates = RateTable::new();
    rates.insert_request_rate(subproject, RequestType::Key, dec!(2.5));

    let events: Vec<AllocationEvent> = (0..7)
        .map(|i| event(subproject, RequestType::Key, date, &format!("res{}", i % 3)))
        .collect();

    let groups = aggregate(events, &rates);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count, 7);
    assert_eq!(groups[0].total_billing, dec!(17.5));
    assert_eq!(groups[0].resource_names, vec!["res0", "res1", "res2"]);
}

#[test]
fn test_groups_split_on_date_and_request_type() {
    let subproject = Uuid::new_v4();
    let d1 = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
    let rates = RateTable::new();

    let events = vec![
        event(subproject, RequestType::Key, d1, "a"),
        event(subproject, RequestType::Key, d2, "a"),
        event(subproject, RequestType::Duplicate, d1, "a"),
    ];

    let groups = aggregate(events, &rates);
    assert_eq!(groups.len(), 3);
    assert!(groups.iter().all(|g| g.count == 1));
}

#[test]
fn test_unpriced_group_bills_zero() {
    let subproject = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let rates = RateTable::new();

    let groups = aggregate(vec![event(subproject, RequestType::Rework, date, "a")], &rates);
    assert_eq!(groups[0].rate, Decimal::ZERO);
    assert_eq!(groups[0].total_billing, Decimal::ZERO);
}

#[test]
fn test_first_row_wins_denormalized_names() {
    let subproject = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let rates = RateTable::new();

    let mut second = event(subproject, RequestType::Key, date, "b");
    second.subproject_name = "Site A (renamed)".to_string();

    let groups = aggregate(
        vec![event(subproject, RequestType::Key, date, "a"), second],
        &rates,
    );
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].subproject_name, "SiteA");
}

proptest! {
    /// Conservation: sum of group counts equals the number of raw events,
    /// and page totals agree with grand totals for any page split.
    #[test]
    fn test_aggregation_conservation(
        rows in proptest::collection::vec((0u8..4, 0u8..5, 0u8..28), 1..200),
        split in 0usize..50,
    ) {
        let subprojects: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let rates = RateTable::new();

        let events: Vec<AllocationEvent> = rows
            .iter()
            .map(|&(sp, rt, day)| {
                let date = NaiveDate::from_ymd_opt(2026, 2, u32::from(day) + 1).unwrap();
                event(
                    subprojects[usize::from(sp)],
                    RequestType::ALL[usize::from(rt)],
                    date,
                    "res",
                )
            })
            .collect();
        let raw_count = events.len() as u64;

        let groups = aggregate(events, &rates);
        let grand = totals(&groups);
        prop_assert_eq!(grand.count, raw_count);

        let split = split.min(groups.len());
        let (page_a, page_b) = groups.split_at(split);
        let total_a = totals(page_a);
        let total_b = totals(page_b);
        prop_assert_eq!(total_a.count + total_b.count, grand.count);
        prop_assert_eq!(total_a.billing + total_b.billing, grand.billing);
    }
}
