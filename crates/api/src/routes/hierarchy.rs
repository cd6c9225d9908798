//! Hierarchy management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::put,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use super::{error_response, internal_error};
use crate::AppState;
use worktally_db::repositories::hierarchy::HierarchyError;
use worktally_db::{HierarchyLevel, HierarchyRepository};
use worktally_shared::AppError;

/// Creates the hierarchy routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/hierarchy/{level}/{id}/name", put(rename))
}

/// Request body for a rename.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// The new display name.
    pub name: String,
}

fn parse_level(level: &str) -> Option<HierarchyLevel> {
    match level {
        "geographies" | "geography" => Some(HierarchyLevel::Geography),
        "clients" | "client" => Some(HierarchyLevel::Client),
        "projects" | "project" => Some(HierarchyLevel::Project),
        "subprojects" | "subproject" => Some(HierarchyLevel::Subproject),
        _ => None,
    }
}

/// PUT `/hierarchy/{level}/{id}/name` - Rename an entity.
///
/// The new name cascades to every denormalized copy on descendant rows and
/// allocation summaries in the same transaction.
async fn rename(
    State(state): State<AppState>,
    Path((level, id)): Path<(String, Uuid)>,
    Json(payload): Json<RenameRequest>,
) -> impl IntoResponse {
    let Some(level) = parse_level(&level) else {
        return error_response(&AppError::Validation(
            "Level must be one of: geographies, clients, projects, subprojects".to_string(),
        ));
    };

    let name = payload.name.trim();
    if name.is_empty() {
        return error_response(&AppError::Validation("Name must not be empty".to_string()));
    }

    let repo = HierarchyRepository::new((*state.db).clone());
    match repo.rename(level, id, name).await {
        Ok(cascade) => {
            info!(%id, name, "hierarchy entity renamed");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "renamed",
                    "cascade": {
                        "descendants": cascade.descendants,
                        "summaries": cascade.summaries,
                    }
                })),
            )
                .into_response()
        }
        Err(HierarchyError::NotFound(id)) => {
            error_response(&AppError::NotFound(format!("Entity {id}")))
        }
        Err(HierarchyError::DuplicateName(name)) => error_response(&AppError::Conflict(format!(
            "Name '{name}' already exists under the same parent"
        ))),
        Err(e) => {
            error!(error = %e, "Rename failed");
            internal_error()
        }
    }
}
