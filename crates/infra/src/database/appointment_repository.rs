//! Appointment repository implementation
//!
//! Holds the booking invariant's source of truth: `insert_checked` and
//! `reschedule_checked` re-run the overlap scan inside an IMMEDIATE write
//! transaction, so two racing bookings for one slot cannot both commit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinicsync_core::AppointmentRepository;
use clinicsync_domain::{Appointment, ClinicSyncError, NewAppointment, Result, TimeSlot};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use uuid::Uuid;

use super::manager::{with_connection, DbManager};
use crate::errors::InfraError;

/// SQLite-based appointment repository
pub struct SqliteAppointmentRepository {
    db: Arc<DbManager>,
}

impl SqliteAppointmentRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepository {
    async fn get_appointment(&self, appointment_id: &str) -> Result<Appointment> {
        let appointment_id = appointment_id.to_string();
        with_connection(&self.db, move |conn| query_appointment(conn, &appointment_id)).await
    }

    async fn get_active_appointments(&self, professional_id: &str) -> Result<Vec<Appointment>> {
        let professional_id = professional_id.to_string();
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, professional_id, patient_id, patient_name, service_type, notes,
                            start_ts, end_ts, cancelled, confirmed, external_event_id,
                            created_at, updated_at
                     FROM appointments
                     WHERE professional_id = ?1 AND cancelled = 0
                     ORDER BY start_ts ASC",
                )
                .map_err(InfraError::from)?;

            let rows = stmt
                .query_map(params![professional_id], map_appointment_row)
                .map_err(InfraError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(InfraError::from)?;
            Ok(rows)
        })
        .await
    }

    async fn insert_checked(&self, request: &NewAppointment) -> Result<Appointment> {
        let request = request.clone();
        with_connection(&self.db, move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(InfraError::from)?;

            check_no_overlap(&tx, &request.professional_id, request.slot, None)?;

            let now = Utc::now();
            let appointment = Appointment {
                id: Uuid::now_v7().to_string(),
                professional_id: request.professional_id.clone(),
                patient_id: request.patient_id.clone(),
                patient_name: request.patient_name.clone(),
                service_type: request.service_type.clone(),
                notes: request.notes.clone(),
                start: request.slot.start,
                end: request.slot.end,
                cancelled: false,
                confirmed: false,
                external_event_id: None,
                created_at: now,
                updated_at: now,
            };

            tx.execute(
                "INSERT INTO appointments (id, professional_id, patient_id, patient_name,
                                           service_type, notes, start_ts, end_ts, cancelled,
                                           confirmed, external_event_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, 0, NULL, ?9, ?9)",
                params![
                    appointment.id,
                    appointment.professional_id,
                    appointment.patient_id,
                    appointment.patient_name,
                    appointment.service_type,
                    appointment.notes,
                    appointment.start.timestamp(),
                    appointment.end.timestamp(),
                    now.timestamp(),
                ],
            )
            .map_err(InfraError::from)?;

            tx.commit().map_err(InfraError::from)?;
            Ok(appointment)
        })
        .await
    }

    async fn reschedule_checked(
        &self,
        appointment_id: &str,
        slot: TimeSlot,
    ) -> Result<Appointment> {
        let appointment_id = appointment_id.to_string();
        with_connection(&self.db, move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(InfraError::from)?;

            let current = query_appointment(&tx, &appointment_id)?;
            check_no_overlap(&tx, &current.professional_id, slot, Some(&appointment_id))?;

            let now = Utc::now();
            tx.execute(
                "UPDATE appointments SET start_ts = ?1, end_ts = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![slot.start.timestamp(), slot.end.timestamp(), now.timestamp(), appointment_id],
            )
            .map_err(InfraError::from)?;

            let updated = query_appointment(&tx, &appointment_id)?;
            tx.commit().map_err(InfraError::from)?;
            Ok(updated)
        })
        .await
    }

    async fn cancel_appointment(&self, appointment_id: &str) -> Result<()> {
        let appointment_id = appointment_id.to_string();
        with_connection(&self.db, move |conn| {
            let now = Utc::now().timestamp();
            let changed = conn
                .execute(
                    "UPDATE appointments SET cancelled = 1, updated_at = ?1 WHERE id = ?2",
                    params![now, appointment_id],
                )
                .map_err(InfraError::from)?;
            if changed == 0 {
                return Err(ClinicSyncError::NotFound(format!(
                    "appointment {appointment_id} not found"
                )));
            }
            Ok(())
        })
        .await
    }

    async fn set_external_event_id_if_absent(
        &self,
        appointment_id: &str,
        external_event_id: &str,
    ) -> Result<bool> {
        let appointment_id = appointment_id.to_string();
        let external_event_id = external_event_id.to_string();
        with_connection(&self.db, move |conn| {
            let now = Utc::now().timestamp();
            let changed = conn
                .execute(
                    "UPDATE appointments SET external_event_id = ?1, updated_at = ?2
                     WHERE id = ?3 AND external_event_id IS NULL",
                    params![external_event_id, now, appointment_id],
                )
                .map_err(InfraError::from)?;
            Ok(changed == 1)
        })
        .await
    }

    async fn clear_external_event_id(&self, appointment_id: &str) -> Result<()> {
        let appointment_id = appointment_id.to_string();
        with_connection(&self.db, move |conn| {
            let now = Utc::now().timestamp();
            conn.execute(
                "UPDATE appointments SET external_event_id = NULL, updated_at = ?1
                 WHERE id = ?2",
                params![now, appointment_id],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
    }
}

// ============================================================================
// SQL Operations (synchronous)
// ============================================================================

fn query_appointment(conn: &Connection, appointment_id: &str) -> Result<Appointment> {
    conn.query_row(
        "SELECT id, professional_id, patient_id, patient_name, service_type, notes,
                start_ts, end_ts, cancelled, confirmed, external_event_id,
                created_at, updated_at
         FROM appointments WHERE id = ?1",
        params![appointment_id],
        map_appointment_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            ClinicSyncError::NotFound(format!("appointment {appointment_id} not found"))
        }
        other => InfraError::from(other).into(),
    })
}

/// Overlap scan used inside the write transactions. Rejects with the same
/// `Conflict` shape as the in-process pre-check.
fn check_no_overlap(
    conn: &Connection,
    professional_id: &str,
    slot: TimeSlot,
    exclude_appointment_id: Option<&str>,
) -> Result<()> {
    let exclude = exclude_appointment_id.unwrap_or("");
    let conflict: Option<(i64, i64)> = conn
        .query_row(
            "SELECT start_ts, end_ts FROM appointments
             WHERE professional_id = ?1 AND cancelled = 0
               AND id != ?2
               AND start_ts < ?3 AND end_ts > ?4
             LIMIT 1",
            params![professional_id, exclude, slot.end.timestamp(), slot.start.timestamp()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(ClinicSyncError::from(InfraError::from(other))),
        })?;

    match conflict {
        Some((start_ts, end_ts)) => {
            let conflicting = TimeSlot {
                start: epoch_to_datetime(start_ts)?,
                end: epoch_to_datetime(end_ts)?,
            };
            Err(ClinicSyncError::Conflict(format!(
                "requested slot {slot} overlaps existing appointment {conflicting}"
            )))
        }
        None => Ok(()),
    }
}

fn map_appointment_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let start_ts: i64 = row.get(6)?;
    let end_ts: i64 = row.get(7)?;
    let created_at: i64 = row.get(11)?;
    let updated_at: i64 = row.get(12)?;

    Ok(Appointment {
        id: row.get(0)?,
        professional_id: row.get(1)?,
        patient_id: row.get(2)?,
        patient_name: row.get(3)?,
        service_type: row.get(4)?,
        notes: row.get(5)?,
        start: epoch_to_datetime_sql(start_ts, 6)?,
        end: epoch_to_datetime_sql(end_ts, 7)?,
        cancelled: row.get(8)?,
        confirmed: row.get(9)?,
        external_event_id: row.get(10)?,
        created_at: epoch_to_datetime_sql(created_at, 11)?,
        updated_at: epoch_to_datetime_sql(updated_at, 12)?,
    })
}

fn epoch_to_datetime(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
        ClinicSyncError::Database(format!("timestamp {secs} out of range"))
    })
}

fn epoch_to_datetime_sql(secs: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Integer,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("timestamp {secs} out of range"),
            )),
        )
    })
}

// ============================================================================
// Tests
// ============================================================================
