//! Tests for the hierarchy cache and resolver.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::cache::HierarchyCache;
use super::resolver::{ClientSource, HierarchyResolver, extract_client_token};
use super::types::{
    ClientRecord, GeographyRecord, HierarchySnapshot, ProjectRecord, SubprojectRecord,
};

fn fixture() -> HierarchySnapshot {
    let geo_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let other_client_id = Uuid::new_v4();
    let project_id = Uuid::new_v4();
    let subproject_id = Uuid::new_v4();

    HierarchySnapshot {
        geographies: vec![GeographyRecord {
            id: geo_id,
            name: "Offshore".to_string(),
        }],
        clients: vec![
            ClientRecord {
                id: client_id,
                name: "Offshore Client 3".to_string(),
                geography_id: geo_id,
            },
            ClientRecord {
                id: other_client_id,
                name: "Acme".to_string(),
                geography_id: geo_id,
            },
        ],
        projects: vec![ProjectRecord {
            id: project_id,
            name: "Intake".to_string(),
            client_id,
            flatrate: Decimal::ZERO,
        }],
        subprojects: vec![SubprojectRecord {
            id: subproject_id,
            name: "SiteA".to_string(),
            project_id,
            flatrate: Decimal::ZERO,
        }],
    }
}

#[test]
fn test_cache_matches_normalized_names() {
    let snapshot = fixture();
    let cache = HierarchyCache::from_snapshot(&snapshot);

    let geo = cache.geography("OFFSHORE").expect("geography");
    assert_eq!(geo.name, "Offshore");

    let client = cache.client(geo.id, "offshore_client_3").expect("client");
    assert_eq!(client.name, "Offshore Client 3");

    assert_eq!(cache.clients_under(geo.id).len(), 2);
    assert!(cache.geography("Onshore").is_none());
}

#[test]
fn test_resolver_full_chain_explicit_client() {
    let snapshot = fixture();
    let cache = HierarchyCache::from_snapshot(&snapshot);
    let resolver = HierarchyResolver::new(&cache);

    let chain = resolver
        .resolve(
            1,
            "Offshore",
            ClientSource::Explicit("Acme"),
            "Intake",
            "SiteA",
        )
        .expect_err("Acme has no Intake project");
    assert!(chain.reason.contains("Project 'Intake' not found"));

    let chain = resolver
        .resolve(
            1,
            "Offshore",
            ClientSource::Explicit("Offshore Client 3"),
            "Intake",
            "site_a",
        )
        .expect_err("normalized 'site a' does not match 'SiteA'");
    assert!(chain.reason.contains("Subproject"));

    let chain = resolver
        .resolve(
            1,
            "Offshore",
            ClientSource::Explicit("Offshore Client 3"),
            "Intake",
            "SiteA",
        )
        .expect("full chain resolves");
    assert_eq!(chain.subproject.name, "SiteA");
    assert_eq!(chain.client.name, "Offshore Client 3");
}

#[test]
fn test_resolver_geography_is_closed_set() {
    let snapshot = fixture();
    let cache = HierarchyCache::from_snapshot(&snapshot);
    let resolver = HierarchyResolver::new(&cache);

    let miss = resolver
        .resolve(
            7,
            "Onshore",
            ClientSource::Explicit("Acme"),
            "Intake",
            "SiteA",
        )
        .expect_err("unknown geography is skipped, never created");
    assert_eq!(miss.row_number, 7);
    assert_eq!(miss.reason, "Geography 'Onshore' not found");
}

#[test]
fn test_extract_client_token() {
    assert_eq!(
        extract_client_token("Intake_Client_3"),
        Some("client 3".to_string())
    );
    assert_eq!(
        extract_client_token("Offshore-Client-12-QC"),
        Some("client 12".to_string())
    );
    assert_eq!(extract_client_token("Intake_Client_"), None);
    assert_eq!(extract_client_token("Intake_Customer_3"), None);
    assert_eq!(extract_client_token(""), None);
}

#[test]
fn test_resolver_embedded_client_token() {
    let snapshot = fixture();
    let cache = HierarchyCache::from_snapshot(&snapshot);
    let resolver = HierarchyResolver::new(&cache);

    // "client 3" is a unique suffix of "Offshore Client 3".
    let chain = resolver
        .resolve(
            2,
            "Offshore",
            ClientSource::Embedded("Intake_Client_3"),
            "Intake",
            "SiteA",
        )
        .expect("embedded token resolves");
    assert_eq!(chain.client.name, "Offshore Client 3");
}

#[test]
fn test_resolver_embedded_extraction_failure_is_an_error() {
    let snapshot = fixture();
    let cache = HierarchyCache::from_snapshot(&snapshot);
    let resolver = HierarchyResolver::new(&cache);

    // No silent fallback to the first client under the geography.
    let miss = resolver
        .resolve(
            3,
            "Offshore",
            ClientSource::Embedded("Intake_Team_3"),
            "Intake",
            "SiteA",
        )
        .expect_err("unrecognized token must not guess");
    assert!(miss.reason.contains("No client token recognized"));
}

#[test]
fn test_resolver_embedded_unmatched_token() {
    let snapshot = fixture();
    let cache = HierarchyCache::from_snapshot(&snapshot);
    let resolver = HierarchyResolver::new(&cache);

    let miss = resolver
        .resolve(
            4,
            "Offshore",
            ClientSource::Embedded("Intake_Client_99"),
            "Intake",
            "SiteA",
        )
        .expect_err("token matching no client is an error");
    assert!(miss.reason.contains("matches no client"));
}
