//! Request-scoped hierarchy lookup cache.

use std::collections::HashMap;

use uuid::Uuid;

use super::normalize::normalize_key;
use super::types::{
    ClientRecord, GeographyRecord, HierarchySnapshot, ProjectRecord, SubprojectRecord,
};

/// In-memory lookup maps over one snapshot of active hierarchy entities.
///
/// Built fresh for every upload invocation and passed explicitly through the
/// pipeline; it must never be shared between concurrent uploads. Lookups are
/// keyed by normalized name (per level) and by parent id (for children).
#[derive(Debug)]
pub struct HierarchyCache {
    geographies_by_name: HashMap<String, GeographyRecord>,
    clients_by_key: HashMap<(Uuid, String), ClientRecord>,
    clients_by_geography: HashMap<Uuid, Vec<ClientRecord>>,
    projects_by_key: HashMap<(Uuid, String), ProjectRecord>,
    projects_by_client: HashMap<Uuid, Vec<ProjectRecord>>,
    subprojects_by_key: HashMap<(Uuid, String), SubprojectRecord>,
    subprojects_by_project: HashMap<Uuid, Vec<SubprojectRecord>>,
}

impl HierarchyCache {
    /// Builds the cache from a snapshot of active entities.
    #[must_use]
    pub fn from_snapshot(snapshot: &HierarchySnapshot) -> Self {
        let mut geographies_by_name = HashMap::with_capacity(snapshot.geographies.len());
        for geo in &snapshot.geographies {
            geographies_by_name.insert(normalize_key(&geo.name), geo.clone());
        }

        let mut clients_by_key = HashMap::with_capacity(snapshot.clients.len());
        let mut clients_by_geography: HashMap<Uuid, Vec<ClientRecord>> = HashMap::new();
        for client in &snapshot.clients {
            clients_by_key.insert(
                (client.geography_id, normalize_key(&client.name)),
                client.clone(),
            );
            clients_by_geography
                .entry(client.geography_id)
                .or_default()
                .push(client.clone());
        }

        let mut projects_by_key = HashMap::with_capacity(snapshot.projects.len());
        let mut projects_by_client: HashMap<Uuid, Vec<ProjectRecord>> = HashMap::new();
        for project in &snapshot.projects {
            projects_by_key.insert(
                (project.client_id, normalize_key(&project.name)),
                project.clone(),
            );
            projects_by_client
                .entry(project.client_id)
                .or_default()
                .push(project.clone());
        }

        let mut subprojects_by_key = HashMap::with_capacity(snapshot.subprojects.len());
        let mut subprojects_by_project: HashMap<Uuid, Vec<SubprojectRecord>> = HashMap::new();
        for subproject in &snapshot.subprojects {
            subprojects_by_key.insert(
                (subproject.project_id, normalize_key(&subproject.name)),
                subproject.clone(),
            );
            subprojects_by_project
                .entry(subproject.project_id)
                .or_default()
                .push(subproject.clone());
        }

        Self {
            geographies_by_name,
            clients_by_key,
            clients_by_geography,
            projects_by_key,
            projects_by_client,
            subprojects_by_key,
            subprojects_by_project,
        }
    }

    /// Looks up a geography by normalized name.
    #[must_use]
    pub fn geography(&self, name: &str) -> Option<&GeographyRecord> {
        self.geographies_by_name.get(&normalize_key(name))
    }

    /// Looks up a client by normalized name under a geography.
    #[must_use]
    pub fn client(&self, geography_id: Uuid, name: &str) -> Option<&ClientRecord> {
        self.clients_by_key.get(&(geography_id, normalize_key(name)))
    }

    /// Returns all clients under a geography.
    #[must_use]
    pub fn clients_under(&self, geography_id: Uuid) -> &[ClientRecord] {
        self.clients_by_geography
            .get(&geography_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Looks up a project by normalized name under a client.
    #[must_use]
    pub fn project(&self, client_id: Uuid, name: &str) -> Option<&ProjectRecord> {
        self.projects_by_key.get(&(client_id, normalize_key(name)))
    }

    /// Returns all projects under a client.
    #[must_use]
    pub fn projects_under(&self, client_id: Uuid) -> &[ProjectRecord] {
        self.projects_by_client
            .get(&client_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Looks up a subproject by normalized name under a project.
    #[must_use]
    pub fn subproject(&self, project_id: Uuid, name: &str) -> Option<&SubprojectRecord> {
        self.subprojects_by_key
            .get(&(project_id, normalize_key(name)))
    }

    /// Returns all subprojects under a project.
    #[must_use]
    pub fn subprojects_under(&self, project_id: Uuid) -> &[SubprojectRecord] {
        self.subprojects_by_project
            .get(&project_id)
            .map_or(&[], Vec::as_slice)
    }
}
