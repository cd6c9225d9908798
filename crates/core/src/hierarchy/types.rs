//! Snapshot records feeding the per-upload hierarchy cache.
//!
//! These are plain data carriers: the database layer maps its entities into
//! them once per upload, and the cache/resolver work only against them. This
//! keeps the resolver unit-testable with injected fixtures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An active geography (root of the hierarchy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeographyRecord {
    /// Geography ID.
    pub id: Uuid,
    /// Geography name (stored casing).
    pub name: String,
}

/// An active client scoped to one geography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Client ID.
    pub id: Uuid,
    /// Client name (stored casing).
    pub name: String,
    /// Owning geography.
    pub geography_id: Uuid,
}

/// An active project (process type) under a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Project ID.
    pub id: Uuid,
    /// Project name (stored casing).
    pub name: String,
    /// Owning client.
    pub client_id: Uuid,
    /// Flat rate applied at project scope, zero when unset.
    pub flatrate: Decimal,
}

/// An active subproject (location), the leaf billing unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubprojectRecord {
    /// Subproject ID.
    pub id: Uuid,
    /// Subproject name (stored casing).
    pub name: String,
    /// Owning project.
    pub project_id: Uuid,
    /// Flat rate applied at subproject scope, zero when unset.
    pub flatrate: Decimal,
}

/// A full snapshot of active hierarchy entities, loaded once per upload.
#[derive(Debug, Clone, Default)]
pub struct HierarchySnapshot {
    /// All active geographies.
    pub geographies: Vec<GeographyRecord>,
    /// All active clients.
    pub clients: Vec<ClientRecord>,
    /// All active projects.
    pub projects: Vec<ProjectRecord>,
    /// All active subprojects.
    pub subprojects: Vec<SubprojectRecord>,
}
