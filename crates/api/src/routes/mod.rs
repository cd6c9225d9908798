//! API route definitions.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use worktally_shared::AppError;

use crate::AppState;

pub mod allocations;
pub mod billing;
pub mod health;
pub mod hierarchy;
pub mod imports;
pub mod invoices;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(imports::routes())
        .merge(allocations::routes())
        .merge(hierarchy::routes())
        .merge(billing::routes())
        .merge(invoices::routes())
}

/// Maps a domain error onto the JSON error body every route shares.
pub(crate) fn error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

/// The opaque 500 used when a database or infrastructure call fails.
pub(crate) fn internal_error() -> Response {
    error_response(&AppError::Internal("the request could not be completed".to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rstest::rstest;
    use worktally_shared::AppError;

    use super::{error_response, internal_error};

    #[rstest]
    #[case(AppError::Validation("bad".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::UploadRejected(3), StatusCode::BAD_REQUEST)]
    #[case(AppError::NotFound("gone".into()), StatusCode::NOT_FOUND)]
    #[case(AppError::Conflict("taken".into()), StatusCode::CONFLICT)]
    #[case(AppError::BusinessRule("empty period".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(AppError::Internal("oops".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn error_response_maps_status(#[case] err: AppError, #[case] expected: StatusCode) {
        assert_eq!(error_response(&err).status(), expected);
    }

    #[test]
    fn internal_error_is_a_500() {
        assert_eq!(internal_error().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
