//! Grouping and pricing of raw allocation events.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::types::{AllocationEvent, AllocationGroup, AllocationTotals};
use crate::rates::{RateSelector, RateTable};
use crate::vocab::RequestType;

/// Groups events by (subproject, request type, date) and prices each group.
///
/// Each group's `count` is the number of raw events, `resource_names` is a
/// deduplicated first-seen-order set, and denormalized display names are
/// taken from the first event seen for the group. Billing is
/// `count x rate(subproject, request type)`.
///
/// Output order is deterministic: ascending (subproject id, request type,
/// date), regardless of input order.
#[must_use]
pub fn aggregate(events: Vec<AllocationEvent>, rates: &RateTable) -> Vec<AllocationGroup> {
    let mut groups: BTreeMap<(Uuid, RequestType, NaiveDate), AllocationGroup> = BTreeMap::new();

    for event in events {
        let key = (event.subproject_id, event.request_type, event.date);
        match groups.entry(key) {
            Entry::Occupied(mut occupied) => {
                let group = occupied.get_mut();
                group.count += 1;
                if !group.resource_names.contains(&event.resource_name) {
                    group.resource_names.push(event.resource_name);
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(AllocationGroup {
                    geography_id: event.geography_id,
                    client_id: event.client_id,
                    project_id: event.project_id,
                    subproject_id: event.subproject_id,
                    geography_name: event.geography_name,
                    client_name: event.client_name,
                    project_name: event.project_name,
                    subproject_name: event.subproject_name,
                    request_type: event.request_type,
                    date: event.date,
                    count: 1,
                    resource_names: vec![event.resource_name],
                    rate: Decimal::ZERO,
                    total_billing: Decimal::ZERO,
                });
            }
        }
    }

    let mut result: Vec<AllocationGroup> = groups.into_values().collect();
    for group in &mut result {
        group.rate = rates.resolve(group.subproject_id, RateSelector::Request(group.request_type));
        group.total_billing = Decimal::from(group.count) * group.rate;
    }
    result
}

/// Rolls counts and billing up across a set of groups.
///
/// Applied both to a single page (page totals) and to the full group set
/// (grand totals); summing page totals across all pages must equal the grand
/// totals.
#[must_use]
pub fn totals(groups: &[AllocationGroup]) -> AllocationTotals {
    let mut acc = AllocationTotals::default();
    for group in groups {
        acc.count += group.count;
        acc.billing += group.total_billing;
    }
    acc
}
