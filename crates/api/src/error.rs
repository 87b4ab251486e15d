//! HTTP error mapping
//!
//! Converts the domain error taxonomy into status codes and a small JSON
//! body. Messages are already user-safe; internal variants are logged and
//! collapsed to a generic body so storage details never leave the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clinicsync_domain::ClinicSyncError;
use serde_json::json;
use tracing::error;

/// Wrapper giving [`ClinicSyncError`] an HTTP representation.
pub struct ApiError(pub ClinicSyncError);

impl From<ClinicSyncError> for ApiError {
    fn from(error: ClinicSyncError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ClinicSyncError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
            ClinicSyncError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            ClinicSyncError::InvalidInput(message) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            ClinicSyncError::Forbidden(message) => (StatusCode::FORBIDDEN, message.clone()),
            ClinicSyncError::Auth(message) | ClinicSyncError::Security(message) => {
                (StatusCode::UNAUTHORIZED, message.clone())
            }
            other => {
                error!(error = %other, "request failed with internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
