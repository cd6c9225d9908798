//! Resource repository: resource identity and subproject assignments.
//!
//! Resources are keyed by email. Emails are lowercased before every lookup
//! and write, so `Ana@Example.com` and `ana@example.com` are one resource.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::{resource_assignments, resources};

/// Error types for resource operations.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Resource repository over the resources and assignment tables.
#[derive(Debug)]
pub struct ResourceRepository {
    db: DatabaseConnection,
}

impl ResourceRepository {
    /// Creates a new resource repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a resource by email, creating it if missing.
    ///
    /// An existing resource whose display name drifted from the feed is
    /// updated to the newest name.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn upsert_by_email(
        &self,
        name: &str,
        email: &str,
    ) -> Result<resources::Model, ResourceError> {
        let email = email.trim().to_lowercase();
        let existing = resources::Entity::find()
            .filter(resources::Column::Email.eq(&email))
            .one(&self.db)
            .await?;

        match existing {
            Some(model) if model.name == name => Ok(model),
            Some(model) => {
                let mut active: resources::ActiveModel = model.into();
                active.name = Set(name.to_string());
                active.updated_at = Set(Utc::now().into());
                Ok(active.update(&self.db).await?)
            }
            None => {
                let now = Utc::now().into();
                let model = resources::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(name.to_string()),
                    email: Set(email),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                Ok(model.insert(&self.db).await?)
            }
        }
    }

    /// Records that a resource works against a subproject, once.
    ///
    /// Returns `true` when a new assignment row was created.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn ensure_assignment(
        &self,
        resource_id: Uuid,
        geography_id: Uuid,
        client_id: Uuid,
        project_id: Uuid,
        subproject_id: Uuid,
    ) -> Result<bool, ResourceError> {
        let existing = resource_assignments::Entity::find()
            .filter(resource_assignments::Column::ResourceId.eq(resource_id))
            .filter(resource_assignments::Column::SubprojectId.eq(subproject_id))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let model = resource_assignments::ActiveModel {
            id: Set(Uuid::new_v4()),
            resource_id: Set(resource_id),
            geography_id: Set(geography_id),
            client_id: Set(client_id),
            project_id: Set(project_id),
            subproject_id: Set(subproject_id),
            created_at: Set(Utc::now().into()),
        };
        model.insert(&self.db).await?;
        Ok(true)
    }
}
