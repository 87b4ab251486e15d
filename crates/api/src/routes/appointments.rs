//! Booking endpoints
//!
//! Booking is decided synchronously against local state; calendar
//! propagation runs afterwards on a background task so provider latency or
//! outages never block or fail the booking response.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use clinicsync_domain::{Appointment, NewAppointment, SyncAction, TimeSlot};
use serde::Deserialize;
use tracing::error;

use crate::context::AppContext;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub professional_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub service_type: String,
    pub notes: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

pub async fn create(
    State(context): State<Arc<AppContext>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let slot = TimeSlot::new(request.start_time, request.end_time)?;
    let appointment = context
        .booking
        .book(NewAppointment {
            professional_id: request.professional_id,
            patient_id: request.patient_id,
            patient_name: request.patient_name,
            service_type: request.service_type,
            notes: request.notes,
            slot,
        })
        .await?;

    spawn_sync(&context, SyncAction::Create, appointment.id.clone());
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn reschedule(
    State(context): State<Arc<AppContext>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let slot = TimeSlot::new(request.start_time, request.end_time)?;
    let appointment = context.booking.reschedule(&appointment_id, slot).await?;

    spawn_sync(&context, SyncAction::Update, appointment.id.clone());
    Ok(Json(appointment))
}

pub async fn cancel(
    State(context): State<Arc<AppContext>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = context.booking.cancel(&appointment_id).await?;

    spawn_sync(&context, SyncAction::Delete, appointment.id.clone());
    Ok(Json(appointment))
}

/// Fire-and-forget calendar propagation. Failures land in the sync error
/// ledger inside the service; an `Err` here means the ledger itself failed.
fn spawn_sync(context: &Arc<AppContext>, action: SyncAction, appointment_id: String) {
    let sync = Arc::clone(&context.sync);
    tokio::spawn(async move {
        if let Err(e) = sync.sync(action, &appointment_id).await {
            error!(appointment_id, ?action, error = %e, "background sync could not record outcome");
        }
    });
}
