//! Rate repository: loads persisted rate rows into an in-memory table.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;
use worktally_core::rates::RateTable;
use worktally_core::vocab::{ProductivityLevel, RequestType};

use crate::entities::{productivity_tiers, request_type_rates};

/// Error types for rate operations.
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Rate repository over the request-type rate and productivity tier tables.
#[derive(Debug)]
pub struct RateRepository {
    db: DatabaseConnection,
}

impl RateRepository {
    /// Creates a new rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the rate table for a set of subprojects.
    ///
    /// Subproject IDs come from the active generation, and rate rows cascade
    /// with their subprojects, so filtering on the IDs alone is sufficient.
    /// Rows whose stored vocabulary label no longer parses are skipped with
    /// a warning rather than failing the whole load.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn load_table(&self, subproject_ids: &[Uuid]) -> Result<RateTable, RateError> {
        let mut table = RateTable::new();
        if subproject_ids.is_empty() {
            return Ok(table);
        }

        let rates = request_type_rates::Entity::find()
            .filter(request_type_rates::Column::SubprojectId.is_in(subproject_ids.iter().copied()))
            .all(&self.db)
            .await?;
        for row in rates {
            match RequestType::parse(&row.request_type) {
                Some(request_type) => {
                    table.insert_request_rate(row.subproject_id, request_type, row.rate);
                }
                None => {
                    tracing::warn!(
                        rate_id = %row.id,
                        label = %row.request_type,
                        "skipping rate row with unknown request type label"
                    );
                }
            }
        }

        let tiers = productivity_tiers::Entity::find()
            .filter(productivity_tiers::Column::SubprojectId.is_in(subproject_ids.iter().copied()))
            .all(&self.db)
            .await?;
        for row in tiers {
            match ProductivityLevel::parse(&row.level) {
                Some(level) => {
                    table.insert_tier_rate(row.subproject_id, level, row.base_rate);
                }
                None => {
                    tracing::warn!(
                        tier_id = %row.id,
                        label = %row.level,
                        "skipping tier row with unknown level label"
                    );
                }
            }
        }

        Ok(table)
    }
}
