//! Calendar connection and sync trigger endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use clinicsync_domain::{ClinicSyncError, SyncAction};
use clinicsync_core::SyncOutcome;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::context::AppContext;
use crate::error::ApiError;
use crate::extract::UserId;

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub professional_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub action: SyncAction,
    pub appointment_id: String,
}

pub async fn connect(
    State(context): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let authorization =
        context.oauth.begin_authorization(&request.professional_id, &user_id).await?;
    Ok(Json(json!({
        "state": authorization.state,
        "authorization_url": authorization.authorization_url,
    })))
}

/// Browser redirect target for the provider callback.
///
/// Always answers with a 302 to the configured frontend URL; failures carry
/// a coarse reason code and never a body, since the audience is a browser
/// mid-redirect and the state token must not leak into error pages.
pub async fn callback(
    State(context): State<Arc<AppContext>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let base = context.config.post_auth_redirect_url.clone();

    let (code, state) = match (query.code, query.state) {
        (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => (code, state),
        _ => return found(format!("{base}?calendar=error&reason=missing_parameters")),
    };

    match context.oauth.complete_authorization(&state, &code).await {
        Ok(_) => found(format!("{base}?calendar=connected")),
        Err(error) => {
            warn!(error = %error, "calendar authorization callback failed");
            let reason = match error {
                ClinicSyncError::Security(_) => "invalid_state",
                ClinicSyncError::Auth(_) => "auth_failed",
                ClinicSyncError::Forbidden(_) => "forbidden",
                ClinicSyncError::NotFound(_) => "unknown_professional",
                _ => "server_error",
            };
            found(format!("{base}?calendar=error&reason={reason}"))
        }
    }
}

pub async fn disconnect(
    State(context): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Json(request): Json<ConnectRequest>,
) -> Result<StatusCode, ApiError> {
    context.oauth.disconnect(&request.professional_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Operator-facing synchronous sync trigger.
pub async fn sync(
    State(context): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Json(request): Json<SyncRequest>,
) -> Result<Response, ApiError> {
    tracing::info!(
        caller = %user_id,
        appointment_id = %request.appointment_id,
        "sync triggered"
    );
    let outcome = context.sync.sync(request.action, &request.appointment_id).await?;

    let response = match outcome {
        SyncOutcome::Completed => {
            (StatusCode::OK, Json(json!({ "status": "completed" }))).into_response()
        }
        SyncOutcome::Failed { error_id, message } => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "status": "failed",
                "error_id": error_id,
                "error": message,
            })),
        )
            .into_response(),
    };
    Ok(response)
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
