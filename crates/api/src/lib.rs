//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for imports, summaries, billing and invoices
//! - Application state shared across handlers
//! - Trace and CORS layers

pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use worktally_shared::config::ImportConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Bulk import settings (batch size, upload cap).
    pub import: ImportConfig,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.import.max_upload_bytes;

    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
