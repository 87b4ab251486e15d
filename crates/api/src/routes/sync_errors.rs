//! Sync error ledger endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use clinicsync_core::RetryOutcome;
use clinicsync_domain::SyncError;
use serde::Deserialize;
use serde_json::json;

use crate::context::AppContext;
use crate::error::ApiError;
use crate::extract::UserId;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub appointment_id: Option<String>,
}

pub async fn list(
    State(context): State<Arc<AppContext>>,
    UserId(_user_id): UserId,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SyncError>>, ApiError> {
    let entries =
        context.sync_errors.list_unresolved(query.appointment_id.as_deref()).await?;
    Ok(Json(entries))
}

pub async fn resolve(
    State(context): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(error_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    tracing::info!(caller = %user_id, error_id = %error_id, "sync error resolved");
    context.sync_errors.mark_resolved(&error_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn retry(
    State(context): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(error_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    tracing::info!(caller = %user_id, error_id = %error_id, "sync error retry requested");
    let outcome = context.retry.retry(&error_id).await?;

    let body = match outcome {
        RetryOutcome::Succeeded => json!({ "outcome": "succeeded" }),
        RetryOutcome::StillFailing { message } => {
            json!({ "outcome": "still_failing", "error": message })
        }
        RetryOutcome::AttemptsExhausted => json!({ "outcome": "attempts_exhausted" }),
    };
    Ok(Json(body))
}
