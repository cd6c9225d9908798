//! Unit tests for billing upserts against a mocked connection.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

use super::{BillingRepository, UpsertBillingInput};
use crate::entities::billings;

fn stored(resource_id: Uuid, subproject_id: Uuid, hours: Decimal) -> billings::Model {
    let now = Utc::now().into();
    billings::Model {
        id: Uuid::new_v4(),
        geography_id: Uuid::new_v4(),
        client_id: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        subproject_id,
        resource_id,
        request_type: "Key".to_string(),
        month: 3,
        year: 2026,
        hours,
        rate: dec!(2.5),
        flatrate: Decimal::ZERO,
        costing: hours * dec!(2.5),
        total_amount: hours * dec!(2.5),
        billable_status: "billable".to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn input(resource_id: Uuid, subproject_id: Uuid, hours: Decimal) -> UpsertBillingInput {
    UpsertBillingInput {
        geography_id: Uuid::new_v4(),
        client_id: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        subproject_id,
        resource_id,
        request_type: "Key".to_string(),
        month: 3,
        year: 2026,
        hours,
        rate: dec!(2.5),
        flatrate: Decimal::ZERO,
        costing: hours * dec!(2.5),
        total_amount: hours * dec!(2.5),
        billable_status: "billable".to_string(),
    }
}

#[tokio::test]
async fn upsert_many_updates_existing_keys_and_creates_the_rest() {
    let resource_id = Uuid::new_v4();
    let known_sub = Uuid::new_v4();
    let new_sub = Uuid::new_v4();

    let existing = stored(resource_id, known_sub, dec!(3));
    let mut updated = existing.clone();
    updated.hours = dec!(5);
    let inserted = stored(resource_id, new_sub, dec!(2));

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([
            vec![existing], // key lookup hits
            vec![updated],  // update returns the row
            vec![],         // key lookup misses
            vec![inserted], // insert returns the row
        ])
        .into_connection();

    let repo = BillingRepository::new(db);
    let (counts, failed) = repo
        .upsert_many(vec![
            (4, input(resource_id, known_sub, dec!(5))),
            (9, input(resource_id, new_sub, dec!(2))),
        ])
        .await;

    assert_eq!(counts.updated, 1);
    assert_eq!(counts.created, 1);
    assert!(failed.is_empty());
}
