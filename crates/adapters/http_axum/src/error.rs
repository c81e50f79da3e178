//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Errors surfaced by the JSON API.
///
/// Guarded transitions that do not apply are not errors: the caller gets
/// the resulting status and sees the machine's true state.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("state {0:?} is not declared")]
    UnknownState(String),
    #[error("state {state:?} has no action {index}")]
    UnknownAction { state: String, index: usize },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "api request rejected");
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (StatusCode::NOT_FOUND, body).into_response()
    }
}
