//! Hierarchy repository: snapshot loads, rate-card imports, renames.
//!
//! Full-replace imports never delete-then-insert in place. They stage a fresh
//! generation of hierarchy and rate rows, flip the `active_generations`
//! pointer in one transaction, and only then prune the superseded generation.
//! A crash mid-import leaves the previous generation fully visible.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;
use worktally_core::hierarchy::{
    ClientRecord, GeographyRecord, HierarchySnapshot, ProjectRecord, SubprojectRecord,
    normalize_key,
};
use worktally_core::ingest::RateCardRow;
use worktally_core::vocab::{ProductivityLevel, RequestType};

use crate::entities::{
    active_generations, allocation_summaries, billings, clients, geographies, productivity_tiers,
    projects, request_type_rates, subprojects,
};

/// Generation pointer scope for the hierarchy and rate tables.
const HIERARCHY_SCOPE: &str = "hierarchy";

/// Error types for hierarchy operations.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// Entity not found.
    #[error("Hierarchy entity not found: {0}")]
    NotFound(Uuid),

    /// A sibling with the same name already exists under the same parent.
    #[error("Name '{0}' already exists under the same parent")]
    DuplicateName(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Which level of the hierarchy an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyLevel {
    /// Root level.
    Geography,
    /// Client under a geography.
    Client,
    /// Project (process type) under a client.
    Project,
    /// Subproject (location) under a project.
    Subproject,
}

/// One row that could not be written, with the reason.
#[derive(Debug, Clone)]
pub struct FailedRecord {
    /// 1-indexed data row number in the source file.
    pub row_number: usize,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Per-table write counts for one import.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportCounts {
    /// Geographies written.
    pub geographies: u64,
    /// Clients written.
    pub clients: u64,
    /// Projects written.
    pub projects: u64,
    /// Subprojects written.
    pub subprojects: u64,
    /// Request-type rates written.
    pub rates: u64,
    /// Productivity tiers written.
    pub tiers: u64,
}

/// Outcome of a rate-card import: counts plus any rows that failed to write.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    /// Per-table write counts.
    pub counts: ImportCounts,
    /// Rows that failed during the write phase.
    pub failed: Vec<FailedRecord>,
}

/// Tables touched by a rename cascade, with rows updated per table.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameCascade {
    /// Rows updated on the renamed entity's own table.
    pub entity: u64,
    /// Denormalized name columns updated on descendant hierarchy tables.
    pub descendants: u64,
    /// Denormalized name columns updated on allocation summaries.
    pub summaries: u64,
}

// ============================================================================
// Staging (pure, unit-tested without a database)
// ============================================================================

/// A deduplicated entity staged for insertion, tagged with the first source
/// row that introduced it.
#[derive(Debug, Clone)]
pub struct StagedEntity {
    /// Pre-generated ID.
    pub id: Uuid,
    /// Display name (casing from the first occurrence).
    pub name: String,
    /// 1-indexed source row that introduced this entity.
    pub row_number: usize,
}

/// A staged rate row.
#[derive(Debug, Clone)]
pub struct StagedRate {
    /// Owning subproject.
    pub subproject_id: Uuid,
    /// Request category.
    pub request_type: RequestType,
    /// Per-unit rate.
    pub rate: Decimal,
    /// 1-indexed source row.
    pub row_number: usize,
}

/// A staged productivity tier row.
#[derive(Debug, Clone)]
pub struct StagedTier {
    /// Owning subproject.
    pub subproject_id: Uuid,
    /// Tier level.
    pub level: ProductivityLevel,
    /// Tier base rate.
    pub base_rate: Decimal,
    /// 1-indexed source row.
    pub row_number: usize,
}

/// A staged client, carrying its parent linkage and denormalized names.
#[derive(Debug, Clone)]
pub struct StagedClient {
    /// The entity itself.
    pub entity: StagedEntity,
    /// Parent geography ID.
    pub geography_id: Uuid,
    /// Parent geography name.
    pub geography_name: String,
}

/// A staged project.
#[derive(Debug, Clone)]
pub struct StagedProject {
    /// The entity itself.
    pub entity: StagedEntity,
    /// Parent client ID.
    pub client_id: Uuid,
    /// Parent client name.
    pub client_name: String,
    /// Geography ID two levels up.
    pub geography_id: Uuid,
    /// Geography name two levels up.
    pub geography_name: String,
    /// Flat rate at project scope; zero when the feed never supplied one.
    pub flatrate: Decimal,
}

/// A staged subproject.
#[derive(Debug, Clone)]
pub struct StagedSubproject {
    /// The entity itself.
    pub entity: StagedEntity,
    /// Parent project ID.
    pub project_id: Uuid,
    /// Parent project name.
    pub project_name: String,
    /// Client ID two levels up.
    pub client_id: Uuid,
    /// Client name two levels up.
    pub client_name: String,
    /// Geography ID at the root.
    pub geography_id: Uuid,
    /// Geography name at the root.
    pub geography_name: String,
    /// Flat rate at subproject scope; zero when unset.
    pub flatrate: Decimal,
}

/// A full staged generation, ready for batched insertion.
#[derive(Debug)]
pub struct StagedGeneration {
    /// The generation tag shared by every staged row.
    pub generation: Uuid,
    /// Deduplicated geographies.
    pub geographies: Vec<StagedEntity>,
    /// Deduplicated clients.
    pub clients: Vec<StagedClient>,
    /// Deduplicated projects.
    pub projects: Vec<StagedProject>,
    /// Deduplicated subprojects.
    pub subprojects: Vec<StagedSubproject>,
    /// Rate rows, one per (subproject, request type).
    pub rates: Vec<StagedRate>,
    /// Tier rows, one per (subproject, level).
    pub tiers: Vec<StagedTier>,
}

/// Deduplicates validated rate-card rows into a staged generation.
///
/// Entities are keyed by their normalized name chain, so `ACME Corp` and
/// `acme  corp` collapse into one client. First occurrence wins the stored
/// casing; the first non-zero flat rate seen wins at each scope. IDs are
/// generated up front so child rows can reference parents before anything
/// touches the database.
#[must_use]
pub fn stage_rows(rows: &[RateCardRow]) -> StagedGeneration {
    let mut staged = StagedGeneration {
        generation: Uuid::new_v4(),
        geographies: Vec::new(),
        clients: Vec::new(),
        projects: Vec::new(),
        subprojects: Vec::new(),
        rates: Vec::new(),
        tiers: Vec::new(),
    };

    // Normalized key -> index into the staged vectors.
    let mut geo_idx: HashMap<String, usize> = HashMap::new();
    let mut client_idx: HashMap<String, usize> = HashMap::new();
    let mut project_idx: HashMap<String, usize> = HashMap::new();
    let mut sub_idx: HashMap<String, usize> = HashMap::new();
    let mut rate_keys: HashMap<(Uuid, RequestType), usize> = HashMap::new();
    let mut tier_keys: HashMap<(Uuid, ProductivityLevel), usize> = HashMap::new();

    for row in rows {
        let geo_key = normalize_key(&row.geography);
        let geo_pos = *geo_idx.entry(geo_key.clone()).or_insert_with(|| {
            staged.geographies.push(StagedEntity {
                id: Uuid::new_v4(),
                name: row.geography.clone(),
                row_number: row.row_number,
            });
            staged.geographies.len() - 1
        });
        let (geo_id, geo_name) = {
            let geo = &staged.geographies[geo_pos];
            (geo.id, geo.name.clone())
        };

        let client_key = format!("{geo_key}|{}", normalize_key(&row.client));
        let client_pos = *client_idx.entry(client_key.clone()).or_insert_with(|| {
            staged.clients.push(StagedClient {
                entity: StagedEntity {
                    id: Uuid::new_v4(),
                    name: row.client.clone(),
                    row_number: row.row_number,
                },
                geography_id: geo_id,
                geography_name: geo_name.clone(),
            });
            staged.clients.len() - 1
        });
        let (client_id, client_name) = {
            let client = &staged.clients[client_pos];
            (client.entity.id, client.entity.name.clone())
        };

        let project_label = row.process.label();
        let project_key = format!("{client_key}|{}", normalize_key(project_label));
        let project_pos = *project_idx.entry(project_key.clone()).or_insert_with(|| {
            staged.projects.push(StagedProject {
                entity: StagedEntity {
                    id: Uuid::new_v4(),
                    name: project_label.to_string(),
                    row_number: row.row_number,
                },
                client_id,
                client_name: client_name.clone(),
                geography_id: geo_id,
                geography_name: geo_name.clone(),
                flatrate: Decimal::ZERO,
            });
            staged.projects.len() - 1
        });
        if let Some(flatrate) = row.flatrate {
            let project = &mut staged.projects[project_pos];
            if project.flatrate == Decimal::ZERO {
                project.flatrate = flatrate;
            }
        }
        let (project_id, project_name) = {
            let project = &staged.projects[project_pos];
            (project.entity.id, project.entity.name.clone())
        };

        let sub_key = format!("{project_key}|{}", normalize_key(&row.subproject));
        let sub_pos = *sub_idx.entry(sub_key).or_insert_with(|| {
            staged.subprojects.push(StagedSubproject {
                entity: StagedEntity {
                    id: Uuid::new_v4(),
                    name: row.subproject.clone(),
                    row_number: row.row_number,
                },
                project_id,
                project_name: project_name.clone(),
                client_id,
                client_name: client_name.clone(),
                geography_id: geo_id,
                geography_name: geo_name.clone(),
                flatrate: Decimal::ZERO,
            });
            staged.subprojects.len() - 1
        });
        if let Some(flatrate) = row.flatrate {
            let sub = &mut staged.subprojects[sub_pos];
            if sub.flatrate == Decimal::ZERO {
                sub.flatrate = flatrate;
            }
        }
        let sub_id = staged.subprojects[sub_pos].entity.id;

        // Validation already rejects duplicate composite keys inside one
        // file, so first-wins here only guards cross-casing collisions.
        rate_keys.entry((sub_id, row.request_type)).or_insert_with(|| {
            staged.rates.push(StagedRate {
                subproject_id: sub_id,
                request_type: row.request_type,
                rate: row.rate,
                row_number: row.row_number,
            });
            staged.rates.len() - 1
        });

        if let Some((level, base_rate)) = row.productivity {
            tier_keys.entry((sub_id, level)).or_insert_with(|| {
                staged.tiers.push(StagedTier {
                    subproject_id: sub_id,
                    level,
                    base_rate,
                    row_number: row.row_number,
                });
                staged.tiers.len() - 1
            });
        }
    }

    staged
}

// ============================================================================
// Repository
// ============================================================================

/// Hierarchy repository over the geography/client/project/subproject tables.
#[derive(Debug)]
pub struct HierarchyRepository {
    db: DatabaseConnection,
}

impl HierarchyRepository {
    /// Creates a new hierarchy repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the active hierarchy generation, if one has been activated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn active_generation(&self) -> Result<Option<Uuid>, HierarchyError> {
        let pointer = active_generations::Entity::find_by_id(HIERARCHY_SCOPE.to_string())
            .one(&self.db)
            .await?;
        Ok(pointer.map(|p| p.generation))
    }

    /// Loads the full active hierarchy as a snapshot for cache building.
    ///
    /// Returns an empty snapshot before the first rate-card import.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the queries fail.
    pub async fn load_active_snapshot(&self) -> Result<HierarchySnapshot, HierarchyError> {
        let Some(generation) = self.active_generation().await? else {
            return Ok(HierarchySnapshot::default());
        };

        let geographies = geographies::Entity::find()
            .filter(geographies::Column::Generation.eq(generation))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| GeographyRecord {
                id: m.id,
                name: m.name,
            })
            .collect();

        let clients = clients::Entity::find()
            .filter(clients::Column::Generation.eq(generation))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| ClientRecord {
                id: m.id,
                name: m.name,
                geography_id: m.geography_id,
            })
            .collect();

        let projects = projects::Entity::find()
            .filter(projects::Column::Generation.eq(generation))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| ProjectRecord {
                id: m.id,
                name: m.name,
                client_id: m.client_id,
                flatrate: m.flatrate,
            })
            .collect();

        let subprojects = subprojects::Entity::find()
            .filter(subprojects::Column::Generation.eq(generation))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| SubprojectRecord {
                id: m.id,
                name: m.name,
                project_id: m.project_id,
                flatrate: m.flatrate,
            })
            .collect();

        Ok(HierarchySnapshot {
            geographies,
            clients,
            projects,
            subprojects,
        })
    }

    /// Replaces the whole hierarchy and rate card from validated rows.
    ///
    /// Stages a new generation, inserts it in batches, flips the pointer,
    /// then prunes the superseded generation. Rows that fail the batched
    /// insert are retried one by one so a single bad row does not sink its
    /// whole batch; the stragglers land in [`ImportOutcome::failed`].
    ///
    /// # Errors
    ///
    /// Returns an error when the pointer flip itself fails; per-row write
    /// failures are reported in the outcome instead.
    pub async fn full_replace(
        &self,
        rows: &[RateCardRow],
        batch_size: usize,
    ) -> Result<ImportOutcome, HierarchyError> {
        let staged = stage_rows(rows);
        let generation = staged.generation;
        let mut outcome = ImportOutcome::default();
        let now = Utc::now().into();

        let geo_models: Vec<geographies::ActiveModel> = staged
            .geographies
            .iter()
            .map(|g| geographies::ActiveModel {
                id: Set(g.id),
                name: Set(g.name.clone()),
                status: Set("active".to_string()),
                generation: Set(generation),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();
        let row_numbers: Vec<usize> = staged.geographies.iter().map(|g| g.row_number).collect();
        outcome.counts.geographies = self
            .insert_batched(geo_models, &row_numbers, batch_size, &mut outcome.failed)
            .await?;

        let client_models: Vec<clients::ActiveModel> = staged
            .clients
            .iter()
            .map(|c| clients::ActiveModel {
                id: Set(c.entity.id),
                name: Set(c.entity.name.clone()),
                geography_id: Set(c.geography_id),
                geography_name: Set(c.geography_name.clone()),
                status: Set("active".to_string()),
                generation: Set(generation),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();
        let row_numbers: Vec<usize> = staged.clients.iter().map(|c| c.entity.row_number).collect();
        outcome.counts.clients = self
            .insert_batched(client_models, &row_numbers, batch_size, &mut outcome.failed)
            .await?;

        let project_models: Vec<projects::ActiveModel> = staged
            .projects
            .iter()
            .map(|p| projects::ActiveModel {
                id: Set(p.entity.id),
                name: Set(p.entity.name.clone()),
                client_id: Set(p.client_id),
                client_name: Set(p.client_name.clone()),
                geography_id: Set(p.geography_id),
                geography_name: Set(p.geography_name.clone()),
                flatrate: Set(p.flatrate),
                status: Set("active".to_string()),
                generation: Set(generation),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();
        let row_numbers: Vec<usize> = staged.projects.iter().map(|p| p.entity.row_number).collect();
        outcome.counts.projects = self
            .insert_batched(project_models, &row_numbers, batch_size, &mut outcome.failed)
            .await?;

        let sub_models: Vec<subprojects::ActiveModel> = staged
            .subprojects
            .iter()
            .map(|s| subprojects::ActiveModel {
                id: Set(s.entity.id),
                name: Set(s.entity.name.clone()),
                project_id: Set(s.project_id),
                project_name: Set(s.project_name.clone()),
                client_id: Set(s.client_id),
                client_name: Set(s.client_name.clone()),
                geography_id: Set(s.geography_id),
                geography_name: Set(s.geography_name.clone()),
                flatrate: Set(s.flatrate),
                status: Set("active".to_string()),
                generation: Set(generation),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();
        let row_numbers: Vec<usize> = staged
            .subprojects
            .iter()
            .map(|s| s.entity.row_number)
            .collect();
        outcome.counts.subprojects = self
            .insert_batched(sub_models, &row_numbers, batch_size, &mut outcome.failed)
            .await?;

        let rate_models: Vec<request_type_rates::ActiveModel> = staged
            .rates
            .iter()
            .map(|r| request_type_rates::ActiveModel {
                id: Set(Uuid::new_v4()),
                subproject_id: Set(r.subproject_id),
                request_type: Set(r.request_type.label().to_string()),
                rate: Set(r.rate),
                generation: Set(generation),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();
        let row_numbers: Vec<usize> = staged.rates.iter().map(|r| r.row_number).collect();
        outcome.counts.rates = self
            .insert_batched(rate_models, &row_numbers, batch_size, &mut outcome.failed)
            .await?;

        let tier_models: Vec<productivity_tiers::ActiveModel> = staged
            .tiers
            .iter()
            .map(|t| productivity_tiers::ActiveModel {
                id: Set(Uuid::new_v4()),
                subproject_id: Set(t.subproject_id),
                level: Set(t.level.label().to_string()),
                base_rate: Set(t.base_rate),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();
        let row_numbers: Vec<usize> = staged.tiers.iter().map(|t| t.row_number).collect();
        outcome.counts.tiers = self
            .insert_batched(tier_models, &row_numbers, batch_size, &mut outcome.failed)
            .await?;

        self.activate_generation(generation).await?;
        self.prune_superseded(generation).await?;

        tracing::info!(
            generation = %generation,
            geographies = outcome.counts.geographies,
            clients = outcome.counts.clients,
            projects = outcome.counts.projects,
            subprojects = outcome.counts.subprojects,
            rates = outcome.counts.rates,
            failed = outcome.failed.len(),
            "rate card full replace complete"
        );
        Ok(outcome)
    }

    /// Applies validated rate-card rows on top of the active generation.
    ///
    /// Missing entities are created, existing rate values are updated, and
    /// everything the file does not mention is left untouched. Per-row write
    /// failures are collected in the outcome rather than aborting the import.
    ///
    /// # Errors
    ///
    /// Returns an error if loading the active generation fails.
    pub async fn apply_incremental(
        &self,
        rows: &[RateCardRow],
    ) -> Result<ImportOutcome, HierarchyError> {
        let generation = match self.active_generation().await? {
            Some(generation) => generation,
            // First import into an empty database behaves like a replace.
            None => {
                let generation = Uuid::new_v4();
                self.activate_generation(generation).await?;
                generation
            }
        };

        let snapshot = self.load_active_snapshot().await?;
        let mut index = UpsertIndex::from_snapshot(&snapshot);
        let mut outcome = ImportOutcome::default();

        for row in rows {
            if let Err(err) = self.upsert_row(row, generation, &mut index, &mut outcome).await {
                outcome.failed.push(FailedRecord {
                    row_number: row.row_number,
                    reason: err.to_string(),
                });
            }
        }

        tracing::info!(
            generation = %generation,
            rates = outcome.counts.rates,
            failed = outcome.failed.len(),
            "rate card incremental import complete"
        );
        Ok(outcome)
    }

    /// Renames an entity and cascades the new name to every denormalized
    /// copy on descendant hierarchy rows and allocation summaries.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist, a sibling already
    /// carries the new name, or a database operation fails.
    pub async fn rename(
        &self,
        level: HierarchyLevel,
        id: Uuid,
        new_name: &str,
    ) -> Result<RenameCascade, HierarchyError> {
        let txn = self.db.begin().await?;
        let now = Utc::now().into();
        let mut cascade = RenameCascade::default();

        match level {
            HierarchyLevel::Geography => {
                let model = geographies::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or(HierarchyError::NotFound(id))?;
                self.check_sibling(
                    geographies::Entity::find()
                        .filter(geographies::Column::Generation.eq(model.generation)),
                    new_name,
                    id,
                    &txn,
                )
                .await?;

                let mut active: geographies::ActiveModel = model.into();
                active.name = Set(new_name.to_string());
                active.updated_at = Set(now);
                active.update(&txn).await?;
                cascade.entity = 1;

                cascade.descendants += clients::Entity::update_many()
                    .col_expr(clients::Column::GeographyName, Expr::value(new_name))
                    .filter(clients::Column::GeographyId.eq(id))
                    .exec(&txn)
                    .await?
                    .rows_affected;
                cascade.descendants += projects::Entity::update_many()
                    .col_expr(projects::Column::GeographyName, Expr::value(new_name))
                    .filter(projects::Column::GeographyId.eq(id))
                    .exec(&txn)
                    .await?
                    .rows_affected;
                cascade.descendants += subprojects::Entity::update_many()
                    .col_expr(subprojects::Column::GeographyName, Expr::value(new_name))
                    .filter(subprojects::Column::GeographyId.eq(id))
                    .exec(&txn)
                    .await?
                    .rows_affected;
                cascade.summaries = allocation_summaries::Entity::update_many()
                    .col_expr(allocation_summaries::Column::GeographyName, Expr::value(new_name))
                    .filter(allocation_summaries::Column::GeographyId.eq(id))
                    .exec(&txn)
                    .await?
                    .rows_affected;
            }
            HierarchyLevel::Client => {
                let model = clients::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or(HierarchyError::NotFound(id))?;
                self.check_sibling(
                    clients::Entity::find()
                        .filter(clients::Column::GeographyId.eq(model.geography_id))
                        .filter(clients::Column::Generation.eq(model.generation)),
                    new_name,
                    id,
                    &txn,
                )
                .await?;

                let mut active: clients::ActiveModel = model.into();
                active.name = Set(new_name.to_string());
                active.updated_at = Set(now);
                active.update(&txn).await?;
                cascade.entity = 1;

                cascade.descendants += projects::Entity::update_many()
                    .col_expr(projects::Column::ClientName, Expr::value(new_name))
                    .filter(projects::Column::ClientId.eq(id))
                    .exec(&txn)
                    .await?
                    .rows_affected;
                cascade.descendants += subprojects::Entity::update_many()
                    .col_expr(subprojects::Column::ClientName, Expr::value(new_name))
                    .filter(subprojects::Column::ClientId.eq(id))
                    .exec(&txn)
                    .await?
                    .rows_affected;
                cascade.summaries = allocation_summaries::Entity::update_many()
                    .col_expr(allocation_summaries::Column::ClientName, Expr::value(new_name))
                    .filter(allocation_summaries::Column::ClientId.eq(id))
                    .exec(&txn)
                    .await?
                    .rows_affected;
            }
            HierarchyLevel::Project => {
                let model = projects::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or(HierarchyError::NotFound(id))?;
                self.check_sibling(
                    projects::Entity::find()
                        .filter(projects::Column::ClientId.eq(model.client_id))
                        .filter(projects::Column::Generation.eq(model.generation)),
                    new_name,
                    id,
                    &txn,
                )
                .await?;

                let mut active: projects::ActiveModel = model.into();
                active.name = Set(new_name.to_string());
                active.updated_at = Set(now);
                active.update(&txn).await?;
                cascade.entity = 1;

                cascade.descendants += subprojects::Entity::update_many()
                    .col_expr(subprojects::Column::ProjectName, Expr::value(new_name))
                    .filter(subprojects::Column::ProjectId.eq(id))
                    .exec(&txn)
                    .await?
                    .rows_affected;
                cascade.summaries = allocation_summaries::Entity::update_many()
                    .col_expr(allocation_summaries::Column::ProjectName, Expr::value(new_name))
                    .filter(allocation_summaries::Column::ProjectId.eq(id))
                    .exec(&txn)
                    .await?
                    .rows_affected;
            }
            HierarchyLevel::Subproject => {
                let model = subprojects::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or(HierarchyError::NotFound(id))?;
                self.check_sibling(
                    subprojects::Entity::find()
                        .filter(subprojects::Column::ProjectId.eq(model.project_id))
                        .filter(subprojects::Column::Generation.eq(model.generation)),
                    new_name,
                    id,
                    &txn,
                )
                .await?;

                let mut active: subprojects::ActiveModel = model.into();
                active.name = Set(new_name.to_string());
                active.updated_at = Set(now);
                active.update(&txn).await?;
                cascade.entity = 1;

                cascade.summaries = allocation_summaries::Entity::update_many()
                    .col_expr(
                        allocation_summaries::Column::SubprojectName,
                        Expr::value(new_name),
                    )
                    .filter(allocation_summaries::Column::SubprojectId.eq(id))
                    .exec(&txn)
                    .await?
                    .rows_affected;
            }
        }

        txn.commit().await?;
        tracing::info!(
            entity = %id,
            descendants = cascade.descendants,
            summaries = cascade.summaries,
            "rename cascade complete"
        );
        Ok(cascade)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Flips the generation pointer in a single transaction.
    async fn activate_generation(&self, generation: Uuid) -> Result<(), HierarchyError> {
        let txn = self.db.begin().await?;
        let existing = active_generations::Entity::find_by_id(HIERARCHY_SCOPE.to_string())
            .one(&txn)
            .await?;
        let now = Utc::now().into();

        match existing {
            Some(pointer) => {
                let mut active: active_generations::ActiveModel = pointer.into();
                active.generation = Set(generation);
                active.activated_at = Set(now);
                active.update(&txn).await?;
            }
            None => {
                let pointer = active_generations::ActiveModel {
                    scope: Set(HIERARCHY_SCOPE.to_string()),
                    generation: Set(generation),
                    activated_at: Set(now),
                };
                pointer.insert(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }

    /// Deletes every hierarchy row not tagged with the active generation,
    /// then sweeps billing facts left pointing at pruned subprojects.
    /// Rates and tiers follow via FK cascade from their subprojects;
    /// billings carry no subproject FK, so stale rows would otherwise
    /// survive the swap and surface next to the new generation.
    async fn prune_superseded(&self, generation: Uuid) -> Result<(), HierarchyError> {
        let pruned = geographies::Entity::delete_many()
            .filter(geographies::Column::Generation.ne(generation))
            .exec(&self.db)
            .await?;

        let kept: Vec<Uuid> = subprojects::Entity::find()
            .filter(subprojects::Column::Generation.eq(generation))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();
        let swept = billings::Entity::delete_many()
            .filter(billings::Column::SubprojectId.is_not_in(kept))
            .exec(&self.db)
            .await?;

        if pruned.rows_affected > 0 || swept.rows_affected > 0 {
            tracing::debug!(
                geographies = pruned.rows_affected,
                billings = swept.rows_affected,
                "pruned superseded hierarchy generation"
            );
        }
        Ok(())
    }

    /// Inserts models in chunks; a failing chunk is retried row by row so
    /// only genuinely bad rows are reported.
    async fn insert_batched<A>(
        &self,
        models: Vec<A>,
        row_numbers: &[usize],
        batch_size: usize,
        failed: &mut Vec<FailedRecord>,
    ) -> Result<u64, HierarchyError>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send + Clone,
        <A::Entity as EntityTrait>::Model: sea_orm::IntoActiveModel<A>,
    {
        let batch_size = batch_size.max(1);
        let mut written = 0u64;

        for (chunk_start, chunk) in models
            .chunks(batch_size)
            .enumerate()
            .map(|(i, c)| (i * batch_size, c))
        {
            let insert = <A::Entity as EntityTrait>::insert_many(chunk.to_vec())
                .exec(&self.db)
                .await;
            match insert {
                Ok(_) => written += chunk.len() as u64,
                Err(_) => {
                    for (offset, model) in chunk.iter().enumerate() {
                        match model.clone().insert(&self.db).await {
                            Ok(_) => written += 1,
                            Err(err) => {
                                let row_number = row_numbers
                                    .get(chunk_start + offset)
                                    .copied()
                                    .unwrap_or_default();
                                failed.push(FailedRecord {
                                    row_number,
                                    reason: err.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        Ok(written)
    }

    /// Upserts one validated row along the hierarchy chain.
    async fn upsert_row(
        &self,
        row: &RateCardRow,
        generation: Uuid,
        index: &mut UpsertIndex,
        outcome: &mut ImportOutcome,
    ) -> Result<(), HierarchyError> {
        let now = Utc::now().into();

        let (geo_key, client_key, project_key, sub_key) = UpsertIndex::row_keys(row);
        let (geo_id, geo_name) = match index.geographies.get(&geo_key) {
            Some((id, name)) => (*id, name.clone()),
            None => {
                let model = geographies::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(row.geography.clone()),
                    status: Set("active".to_string()),
                    generation: Set(generation),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                let inserted = model.insert(&self.db).await?;
                outcome.counts.geographies += 1;
                index
                    .geographies
                    .insert(geo_key.clone(), (inserted.id, inserted.name.clone()));
                (inserted.id, inserted.name)
            }
        };

        let (client_id, client_name) = match index.clients.get(&client_key) {
            Some((id, name)) => (*id, name.clone()),
            None => {
                let model = clients::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(row.client.clone()),
                    geography_id: Set(geo_id),
                    geography_name: Set(geo_name.clone()),
                    status: Set("active".to_string()),
                    generation: Set(generation),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                let inserted = model.insert(&self.db).await?;
                outcome.counts.clients += 1;
                index
                    .clients
                    .insert(client_key.clone(), (inserted.id, inserted.name.clone()));
                (inserted.id, inserted.name)
            }
        };

        let project_label = row.process.label();
        let (project_id, project_name) = match index.projects.get(&project_key) {
            Some((id, name)) => (*id, name.clone()),
            None => {
                let model = projects::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(project_label.to_string()),
                    client_id: Set(client_id),
                    client_name: Set(client_name.clone()),
                    geography_id: Set(geo_id),
                    geography_name: Set(geo_name.clone()),
                    flatrate: Set(row.flatrate.unwrap_or(Decimal::ZERO)),
                    status: Set("active".to_string()),
                    generation: Set(generation),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                let inserted = model.insert(&self.db).await?;
                outcome.counts.projects += 1;
                index
                    .projects
                    .insert(project_key.clone(), (inserted.id, inserted.name.clone()));
                (inserted.id, inserted.name)
            }
        };

        let subproject_id = match index.subprojects.get(&sub_key) {
            Some((id, _)) => *id,
            None => {
                let model = subprojects::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(row.subproject.clone()),
                    project_id: Set(project_id),
                    project_name: Set(project_name),
                    client_id: Set(client_id),
                    client_name: Set(client_name),
                    geography_id: Set(geo_id),
                    geography_name: Set(geo_name),
                    flatrate: Set(row.flatrate.unwrap_or(Decimal::ZERO)),
                    status: Set("active".to_string()),
                    generation: Set(generation),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                let inserted = model.insert(&self.db).await?;
                outcome.counts.subprojects += 1;
                let id = inserted.id;
                index.subprojects.insert(sub_key, (id, inserted.name));
                id
            }
        };

        // Rate upsert on (subproject, request type) within the generation.
        let existing_rate = request_type_rates::Entity::find()
            .filter(request_type_rates::Column::SubprojectId.eq(subproject_id))
            .filter(request_type_rates::Column::RequestType.eq(row.request_type.label()))
            .one(&self.db)
            .await?;
        match existing_rate {
            Some(model) if model.rate == row.rate => {}
            Some(model) => {
                let mut active: request_type_rates::ActiveModel = model.into();
                active.rate = Set(row.rate);
                active.updated_at = Set(now);
                active.update(&self.db).await?;
                outcome.counts.rates += 1;
            }
            None => {
                let model = request_type_rates::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    subproject_id: Set(subproject_id),
                    request_type: Set(row.request_type.label().to_string()),
                    rate: Set(row.rate),
                    generation: Set(generation),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&self.db).await?;
                outcome.counts.rates += 1;
            }
        }

        if let Some((level, base_rate)) = row.productivity {
            let existing_tier = productivity_tiers::Entity::find()
                .filter(productivity_tiers::Column::SubprojectId.eq(subproject_id))
                .filter(productivity_tiers::Column::Level.eq(level.label()))
                .one(&self.db)
                .await?;
            match existing_tier {
                Some(model) if model.base_rate == base_rate => {}
                Some(model) => {
                    let mut active: productivity_tiers::ActiveModel = model.into();
                    active.base_rate = Set(base_rate);
                    active.updated_at = Set(now);
                    active.update(&self.db).await?;
                    outcome.counts.tiers += 1;
                }
                None => {
                    let model = productivity_tiers::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        subproject_id: Set(subproject_id),
                        level: Set(level.label().to_string()),
                        base_rate: Set(base_rate),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    model.insert(&self.db).await?;
                    outcome.counts.tiers += 1;
                }
            }
        }

        Ok(())
    }

    /// Rejects a rename that would collide with a sibling's normalized name.
    async fn check_sibling<E>(
        &self,
        siblings: sea_orm::Select<E>,
        new_name: &str,
        own_id: Uuid,
        txn: &sea_orm::DatabaseTransaction,
    ) -> Result<(), HierarchyError>
    where
        E: EntityTrait,
        E::Model: NamedEntity,
    {
        let key = normalize_key(new_name);
        let collision = siblings
            .all(txn)
            .await?
            .into_iter()
            .any(|m| m.entity_id() != own_id && normalize_key(m.entity_name()) == key);
        if collision {
            return Err(HierarchyError::DuplicateName(new_name.to_string()));
        }
        Ok(())
    }
}

/// Access to the id/name pair shared by every hierarchy entity.
trait NamedEntity {
    fn entity_id(&self) -> Uuid;
    fn entity_name(&self) -> &str;
}

macro_rules! impl_named_entity {
    ($($entity:ident),+ $(,)?) => {
        $(impl NamedEntity for $entity::Model {
            fn entity_id(&self) -> Uuid {
                self.id
            }
            fn entity_name(&self) -> &str {
                &self.name
            }
        })+
    };
}

impl_named_entity!(geographies, clients, projects, subprojects);

/// Normalized-key lookup maps for incremental upserts, seeded from the
/// active snapshot and extended as rows create new entities.
#[derive(Debug, Default)]
struct UpsertIndex {
    geographies: HashMap<String, (Uuid, String)>,
    clients: HashMap<String, (Uuid, String)>,
    projects: HashMap<String, (Uuid, String)>,
    subprojects: HashMap<String, (Uuid, String)>,
}

impl UpsertIndex {
    /// Chained normalized lookup keys for one row. Each child key embeds its
    /// parent's key, so equal names only collide under the same parent.
    fn row_keys(row: &RateCardRow) -> (String, String, String, String) {
        let geo = normalize_key(&row.geography);
        let client = format!("{geo}|{}", normalize_key(&row.client));
        let project = format!("{client}|{}", normalize_key(row.process.label()));
        let sub = format!("{project}|{}", normalize_key(&row.subproject));
        (geo, client, project, sub)
    }

    fn from_snapshot(snapshot: &HierarchySnapshot) -> Self {
        let mut index = Self::default();

        let geo_names: HashMap<Uuid, String> = snapshot
            .geographies
            .iter()
            .map(|g| (g.id, normalize_key(&g.name)))
            .collect();
        for geo in &snapshot.geographies {
            index
                .geographies
                .insert(normalize_key(&geo.name), (geo.id, geo.name.clone()));
        }

        let mut client_keys: HashMap<Uuid, String> = HashMap::new();
        for client in &snapshot.clients {
            if let Some(geo_key) = geo_names.get(&client.geography_id) {
                let key = format!("{geo_key}|{}", normalize_key(&client.name));
                client_keys.insert(client.id, key.clone());
                index.clients.insert(key, (client.id, client.name.clone()));
            }
        }

        let mut project_keys: HashMap<Uuid, String> = HashMap::new();
        for project in &snapshot.projects {
            if let Some(client_key) = client_keys.get(&project.client_id) {
                let key = format!("{client_key}|{}", normalize_key(&project.name));
                project_keys.insert(project.id, key.clone());
                index
                    .projects
                    .insert(key, (project.id, project.name.clone()));
            }
        }

        for sub in &snapshot.subprojects {
            if let Some(project_key) = project_keys.get(&sub.project_id) {
                let key = format!("{project_key}|{}", normalize_key(&sub.name));
                index.subprojects.insert(key, (sub.id, sub.name.clone()));
            }
        }

        index
    }
}

#[cfg(test)]
#[path = "hierarchy_tests.rs"]
mod tests;
