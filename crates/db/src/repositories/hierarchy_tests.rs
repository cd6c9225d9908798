//! Unit tests for rate-card staging and the incremental upsert index.
//!
//! `stage_rows` and `UpsertIndex` are pure, so the dedup, linkage, and
//! replay-idempotence rules are tested here without a database; the pruning
//! sweep runs against a mocked connection.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use uuid::Uuid;
use worktally_core::hierarchy::{
    ClientRecord, GeographyRecord, HierarchySnapshot, ProjectRecord, SubprojectRecord,
};
use worktally_core::ingest::RateCardRow;
use worktally_core::vocab::{ProcessType, ProductivityLevel, RequestType};

use super::{HierarchyRepository, UpsertIndex, stage_rows};
use crate::entities::subprojects;

fn row(number: usize, geography: &str, client: &str, subproject: &str) -> RateCardRow {
    RateCardRow {
        row_number: number,
        geography: geography.to_string(),
        client: client.to_string(),
        process: ProcessType::Intake,
        subproject: subproject.to_string(),
        request_type: RequestType::NewRequest,
        rate: dec!(2.50),
        flatrate: None,
        productivity: None,
    }
}

#[test]
fn dedupes_entities_across_rows() {
    let rows = vec![
        row(1, "EMEA", "Acme Corp", "Berlin"),
        row(2, "EMEA", "Acme Corp", "Hamburg"),
        row(3, "EMEA", "Globex", "Berlin"),
    ];

    let staged = stage_rows(&rows);

    assert_eq!(staged.geographies.len(), 1);
    assert_eq!(staged.clients.len(), 2);
    assert_eq!(staged.projects.len(), 2);
    assert_eq!(staged.subprojects.len(), 3);
}

#[test]
fn normalized_keys_collapse_casing_and_spacing() {
    let rows = vec![
        row(1, "EMEA", "Acme Corp", "Berlin"),
        row(2, "emea", "ACME  CORP", "berlin"),
    ];

    let staged = stage_rows(&rows);

    assert_eq!(staged.geographies.len(), 1);
    assert_eq!(staged.clients.len(), 1);
    assert_eq!(staged.subprojects.len(), 1);
    // First occurrence wins the stored casing.
    assert_eq!(staged.clients[0].entity.name, "Acme Corp");
}

#[test]
fn children_reference_staged_parent_ids() {
    let rows = vec![row(1, "EMEA", "Acme Corp", "Berlin")];

    let staged = stage_rows(&rows);

    let geo = &staged.geographies[0];
    let client = &staged.clients[0];
    let project = &staged.projects[0];
    let sub = &staged.subprojects[0];

    assert_eq!(client.geography_id, geo.id);
    assert_eq!(project.client_id, client.entity.id);
    assert_eq!(project.geography_id, geo.id);
    assert_eq!(sub.project_id, project.entity.id);
    assert_eq!(sub.client_id, client.entity.id);
    assert_eq!(sub.geography_id, geo.id);
    assert_eq!(sub.geography_name, "EMEA");
}

#[test]
fn one_rate_per_subproject_and_request_type() {
    let mut first = row(1, "EMEA", "Acme Corp", "Berlin");
    first.request_type = RequestType::NewRequest;
    let mut second = row(2, "EMEA", "Acme Corp", "Berlin");
    second.request_type = RequestType::Rework;
    second.rate = dec!(1.25);

    let staged = stage_rows(&[first, second]);

    assert_eq!(staged.subprojects.len(), 1);
    assert_eq!(staged.rates.len(), 2);
    let sub_id = staged.subprojects[0].entity.id;
    assert!(staged.rates.iter().all(|r| r.subproject_id == sub_id));
}

#[test]
fn first_flatrate_wins_per_scope() {
    let mut first = row(1, "EMEA", "Acme Corp", "Berlin");
    first.flatrate = Some(dec!(100));
    let mut second = row(2, "EMEA", "Acme Corp", "Berlin");
    second.request_type = RequestType::Key;
    second.flatrate = Some(dec!(999));

    let staged = stage_rows(&[first, second]);

    assert_eq!(staged.projects[0].flatrate, dec!(100));
    assert_eq!(staged.subprojects[0].flatrate, dec!(100));
}

#[test]
fn missing_flatrate_stages_as_zero() {
    let staged = stage_rows(&[row(1, "EMEA", "Acme Corp", "Berlin")]);

    assert_eq!(staged.projects[0].flatrate, Decimal::ZERO);
    assert_eq!(staged.subprojects[0].flatrate, Decimal::ZERO);
}

#[test]
fn productivity_rows_stage_tiers() {
    let mut first = row(1, "EMEA", "Acme Corp", "Berlin");
    first.productivity = Some((ProductivityLevel::High, dec!(4.00)));
    let mut second = row(2, "EMEA", "Acme Corp", "Berlin");
    second.request_type = RequestType::Key;
    second.productivity = Some((ProductivityLevel::Low, dec!(1.00)));

    let staged = stage_rows(&[first, second]);

    assert_eq!(staged.tiers.len(), 2);
    let sub_id = staged.subprojects[0].entity.id;
    assert!(staged.tiers.iter().all(|t| t.subproject_id == sub_id));
}

#[test]
fn staged_rows_remember_their_source_row() {
    let rows = vec![
        row(3, "EMEA", "Acme Corp", "Berlin"),
        row(7, "APAC", "Initech", "Osaka"),
    ];

    let staged = stage_rows(&rows);

    assert_eq!(staged.geographies[0].row_number, 3);
    assert_eq!(staged.geographies[1].row_number, 7);
}

// ============================================================================
// Incremental upsert index
// ============================================================================

fn snapshot() -> (HierarchySnapshot, Uuid, Uuid, Uuid, Uuid) {
    let geo_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let project_id = Uuid::new_v4();
    let sub_id = Uuid::new_v4();

    let snapshot = HierarchySnapshot {
        geographies: vec![GeographyRecord {
            id: geo_id,
            name: "EMEA".to_string(),
        }],
        clients: vec![ClientRecord {
            id: client_id,
            name: "Acme Corp".to_string(),
            geography_id: geo_id,
        }],
        projects: vec![ProjectRecord {
            id: project_id,
            name: "Intake".to_string(),
            client_id,
            flatrate: Decimal::ZERO,
        }],
        subprojects: vec![SubprojectRecord {
            id: sub_id,
            name: "Berlin".to_string(),
            project_id,
            flatrate: Decimal::ZERO,
        }],
    };
    (snapshot, geo_id, client_id, project_id, sub_id)
}

#[test]
fn replayed_rows_hit_the_snapshot_seeded_index() {
    // Re-importing the same file must find every entity instead of creating
    // a duplicate, even when casing and separators drift.
    let (snapshot, geo_id, client_id, project_id, sub_id) = snapshot();
    let index = UpsertIndex::from_snapshot(&snapshot);

    let replay = row(1, "emea", "ACME_CORP", "berlin");
    let (geo_key, client_key, project_key, sub_key) = UpsertIndex::row_keys(&replay);

    assert_eq!(
        index.geographies.get(&geo_key).map(|(id, _)| *id),
        Some(geo_id)
    );
    assert_eq!(
        index.clients.get(&client_key).map(|(id, _)| *id),
        Some(client_id)
    );
    assert_eq!(
        index.projects.get(&project_key).map(|(id, _)| *id),
        Some(project_id)
    );
    assert_eq!(
        index.subprojects.get(&sub_key).map(|(id, _)| *id),
        Some(sub_id)
    );
    // Stored casing is preserved for denormalized names.
    assert_eq!(
        index.clients.get(&client_key).map(|(_, name)| name.as_str()),
        Some("Acme Corp")
    );
}

#[test]
fn only_genuinely_new_entities_miss_the_index() {
    let (snapshot, _, _, _, _) = snapshot();
    let index = UpsertIndex::from_snapshot(&snapshot);

    let fresh = row(2, "EMEA", "Acme Corp", "Munich");
    let (geo_key, client_key, project_key, sub_key) = UpsertIndex::row_keys(&fresh);

    assert!(index.geographies.contains_key(&geo_key));
    assert!(index.clients.contains_key(&client_key));
    assert!(index.projects.contains_key(&project_key));
    // Only the unseen subproject would be created on this row.
    assert!(!index.subprojects.contains_key(&sub_key));
}

#[test]
fn same_name_under_different_parents_does_not_collide() {
    let berlin_under_acme = row(1, "EMEA", "Acme Corp", "Berlin");
    let berlin_under_globex = row(2, "EMEA", "Globex", "Berlin");

    let (_, _, _, acme_sub) = UpsertIndex::row_keys(&berlin_under_acme);
    let (_, _, _, globex_sub) = UpsertIndex::row_keys(&berlin_under_globex);

    assert_ne!(acme_sub, globex_sub);
}

// ============================================================================
// Generation pruning
// ============================================================================

#[tokio::test]
async fn pruning_sweeps_billing_rows_for_dead_subprojects() {
    let generation = Uuid::new_v4();
    let now = chrono::Utc::now().into();
    let kept = subprojects::Model {
        id: Uuid::new_v4(),
        name: "Berlin".to_string(),
        project_id: Uuid::new_v4(),
        client_id: Uuid::new_v4(),
        geography_id: Uuid::new_v4(),
        project_name: "Intake".to_string(),
        client_name: "Acme Corp".to_string(),
        geography_name: "EMEA".to_string(),
        flatrate: Decimal::ZERO,
        status: "active".to_string(),
        generation,
        created_at: now,
        updated_at: now,
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([
            // Superseded geographies, then stale billings.
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            },
        ])
        .append_query_results([vec![kept]])
        .into_connection();

    // `DatabaseConnection` is not `Clone` with sea-orm's `mock` feature, so
    // share the underlying mock connection by cloning its `Arc` directly.
    let DatabaseConnection::MockDatabaseConnection(conn) = &db else {
        unreachable!("mock database always yields a mock connection");
    };
    let repo = HierarchyRepository::new(DatabaseConnection::MockDatabaseConnection(
        std::sync::Arc::clone(conn),
    ));
    repo.prune_superseded(generation)
        .await
        .expect("prune succeeds");

    // Join the raw SQL rather than Debug-formatting the log: `{:?}` escapes
    // the inner quotes, which would never match the asserted substrings.
    let log = db
        .into_transaction_log()
        .iter()
        .flat_map(|transaction| transaction.statements())
        .map(|statement| statement.sql.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    assert!(log.contains(r#"DELETE FROM "geographies""#));
    assert!(log.contains(r#"DELETE FROM "billings""#));
}
