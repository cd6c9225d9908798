//! Row-by-row resolution of the Geography -> Client -> Project -> Subproject chain.

use super::cache::HierarchyCache;
use super::normalize::normalize_key;
use super::types::{ClientRecord, GeographyRecord, ProjectRecord, SubprojectRecord};

/// Where a row's client identity comes from.
///
/// Some feeds carry an explicit client column; others embed a client token in
/// a combined process string such as `Intake_Client_3`.
#[derive(Debug, Clone, Copy)]
pub enum ClientSource<'a> {
    /// The feed supplies the client name directly.
    Explicit(&'a str),
    /// The client token must be extracted from a combined process string.
    Embedded(&'a str),
}

/// A fully resolved hierarchy chain for one row.
#[derive(Debug, Clone)]
pub struct ResolvedChain {
    /// Resolved geography.
    pub geography: GeographyRecord,
    /// Resolved client.
    pub client: ClientRecord,
    /// Resolved project.
    pub project: ProjectRecord,
    /// Resolved subproject.
    pub subproject: SubprojectRecord,
}

/// A row that could not be resolved, with the level and reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionMiss {
    /// 1-indexed data row number in the source file.
    pub row_number: usize,
    /// Human-readable skip reason.
    pub reason: String,
}

/// Extracts a client token from a combined process string.
///
/// The recognized pattern is `<tag>_Client_<n>`: a segment spelling `client`
/// followed by a numeric segment, with `_`, `-`, or spaces as separators.
/// Returns the normalized lookup key (`"client <n>"`) on success.
///
/// Extraction failure is surfaced to the caller as an unresolved row; there is
/// deliberately no "first client under the geography" guess here.
#[must_use]
pub fn extract_client_token(combined: &str) -> Option<String> {
    let normalized = normalize_key(combined);
    let segments: Vec<&str> = normalized.split(' ').collect();

    segments.windows(2).find_map(|pair| {
        if pair[0] == "client" && pair[1].chars().all(|c| c.is_ascii_digit()) && !pair[1].is_empty()
        {
            Some(format!("client {}", pair[1]))
        } else {
            None
        }
    })
}

/// Resolves validated rows against a per-upload cache.
///
/// Geography is a closed reference set: a miss at any level produces a
/// [`ResolutionMiss`] rather than auto-creating entities. Callers batch the
/// misses; any non-empty miss set after the whole file fails the write phase.
#[derive(Debug)]
pub struct HierarchyResolver<'c> {
    cache: &'c HierarchyCache,
}

impl<'c> HierarchyResolver<'c> {
    /// Creates a resolver over a cache.
    #[must_use]
    pub const fn new(cache: &'c HierarchyCache) -> Self {
        Self { cache }
    }

    /// Resolves the full chain for one row.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionMiss`] naming the first level that failed.
    pub fn resolve(
        &self,
        row_number: usize,
        geography_name: &str,
        client: ClientSource<'_>,
        project_name: &str,
        subproject_name: &str,
    ) -> Result<ResolvedChain, ResolutionMiss> {
        let geography = self.cache.geography(geography_name).ok_or_else(|| {
            ResolutionMiss {
                row_number,
                reason: format!("Geography '{geography_name}' not found"),
            }
        })?;

        let client = self.resolve_client(row_number, geography, client)?;

        let project = self
            .cache
            .project(client.id, project_name)
            .ok_or_else(|| ResolutionMiss {
                row_number,
                reason: format!(
                    "Project '{project_name}' not found under client '{}'",
                    client.name
                ),
            })?;

        let subproject = self
            .cache
            .subproject(project.id, subproject_name)
            .ok_or_else(|| ResolutionMiss {
                row_number,
                reason: format!(
                    "Subproject '{subproject_name}' not found under project '{}'",
                    project.name
                ),
            })?;

        Ok(ResolvedChain {
            geography: geography.clone(),
            client,
            project: project.clone(),
            subproject: subproject.clone(),
        })
    }

    fn resolve_client(
        &self,
        row_number: usize,
        geography: &GeographyRecord,
        source: ClientSource<'_>,
    ) -> Result<ClientRecord, ResolutionMiss> {
        match source {
            ClientSource::Explicit(name) => self
                .cache
                .client(geography.id, name)
                .cloned()
                .ok_or_else(|| ResolutionMiss {
                    row_number,
                    reason: format!(
                        "Client '{name}' not found under geography '{}'",
                        geography.name
                    ),
                }),
            ClientSource::Embedded(combined) => {
                let Some(token) = extract_client_token(combined) else {
                    return Err(ResolutionMiss {
                        row_number,
                        reason: format!("No client token recognized in '{combined}'"),
                    });
                };

                // Exact normalized match wins; otherwise the token must
                // identify exactly one client under this geography.
                if let Some(client) = self.cache.client(geography.id, &token) {
                    return Ok(client.clone());
                }

                let candidates: Vec<&ClientRecord> = self
                    .cache
                    .clients_under(geography.id)
                    .iter()
                    .filter(|c| normalize_key(&c.name).ends_with(&token))
                    .collect();

                match candidates.as_slice() {
                    [client] => Ok((*client).clone()),
                    [] => Err(ResolutionMiss {
                        row_number,
                        reason: format!(
                            "Client token '{token}' matches no client under geography '{}'",
                            geography.name
                        ),
                    }),
                    _ => Err(ResolutionMiss {
                        row_number,
                        reason: format!(
                            "Client token '{token}' is ambiguous under geography '{}'",
                            geography.name
                        ),
                    }),
                }
            }
        }
    }
}
