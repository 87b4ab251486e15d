//! Booking service - conflict resolution and appointment lifecycle

use std::sync::Arc;

use clinicsync_domain::{
    Appointment, ClinicSyncError, NewAppointment, Result, TimeSlot,
};
use tracing::{info, instrument, warn};

use super::ports::{AppointmentRepository, ProfessionalRepository};

/// Outcome of a conflict check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingDecision {
    Accepted,
    Rejected {
        /// The first conflicting interval found (scan order is not a nearest
        /// guarantee)
        conflicting: TimeSlot,
    },
}

/// Booking service
///
/// The in-process conflict check is a fast pre-check for user-facing errors;
/// the repository's transactional insert is the invariant's source of truth
/// under concurrent writers.
pub struct BookingService {
    appointments: Arc<dyn AppointmentRepository>,
    professionals: Arc<dyn ProfessionalRepository>,
}

impl BookingService {
    /// Create a new booking service
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        professionals: Arc<dyn ProfessionalRepository>,
    ) -> Self {
        Self { appointments, professionals }
    }

    /// Decide whether `slot` may be booked for the professional.
    ///
    /// Scans every non-cancelled appointment (no time-window bound),
    /// excluding `exclude_appointment_id` when rescheduling. Acceptance does
    /// not reserve the slot; callers persist through [`Self::book`] or
    /// [`Self::reschedule`], which re-run the check atomically.
    #[instrument(skip(self))]
    pub async fn try_book(
        &self,
        professional_id: &str,
        slot: TimeSlot,
        exclude_appointment_id: Option<&str>,
    ) -> Result<BookingDecision> {
        let professional = self.professionals.get_professional(professional_id).await?;
        if !professional.active {
            return Err(ClinicSyncError::NotFound(format!(
                "professional {professional_id} is not active"
            )));
        }

        let existing = self.appointments.get_active_appointments(professional_id).await?;
        for appointment in &existing {
            if Some(appointment.id.as_str()) == exclude_appointment_id {
                continue;
            }
            let other = appointment.slot();
            if slot.overlaps(&other) {
                return Ok(BookingDecision::Rejected { conflicting: other });
            }
        }

        Ok(BookingDecision::Accepted)
    }

    /// Book a new appointment.
    ///
    /// Runs the pre-check, then delegates to the repository's atomic
    /// check-and-insert. Validation and conflict errors are returned
    /// synchronously and never recorded in the sync error ledger.
    #[instrument(skip(self, request), fields(professional_id = %request.professional_id))]
    pub async fn book(&self, request: NewAppointment) -> Result<Appointment> {
        match self.try_book(&request.professional_id, request.slot, None).await? {
            BookingDecision::Accepted => {}
            BookingDecision::Rejected { conflicting } => {
                warn!(conflicting = %conflicting, "booking rejected by pre-check");
                return Err(ClinicSyncError::Conflict(format!(
                    "requested slot {} overlaps existing appointment {conflicting}",
                    request.slot
                )));
            }
        }

        let appointment = self.appointments.insert_checked(&request).await?;
        info!(appointment_id = %appointment.id, slot = %appointment.slot(), "appointment booked");
        Ok(appointment)
    }

    /// Move an existing appointment to a new slot, re-running conflict
    /// checking with the appointment itself excluded.
    #[instrument(skip(self))]
    pub async fn reschedule(&self, appointment_id: &str, slot: TimeSlot) -> Result<Appointment> {
        let current = self.appointments.get_appointment(appointment_id).await?;
        if current.cancelled {
            return Err(ClinicSyncError::InvalidInput(format!(
                "appointment {appointment_id} is cancelled"
            )));
        }

        match self
            .try_book(&current.professional_id, slot, Some(appointment_id))
            .await?
        {
            BookingDecision::Accepted => {}
            BookingDecision::Rejected { conflicting } => {
                return Err(ClinicSyncError::Conflict(format!(
                    "requested slot {slot} overlaps existing appointment {conflicting}"
                )));
            }
        }

        let updated = self.appointments.reschedule_checked(appointment_id, slot).await?;
        info!(appointment_id, slot = %slot, "appointment rescheduled");
        Ok(updated)
    }

    /// Flag an appointment cancelled. The record is kept; only the flag
    /// flips.
    #[instrument(skip(self))]
    pub async fn cancel(&self, appointment_id: &str) -> Result<Appointment> {
        // Existence check keeps the error shape consistent with get paths.
        let _ = self.appointments.get_appointment(appointment_id).await?;
        self.appointments.cancel_appointment(appointment_id).await?;
        info!(appointment_id, "appointment cancelled");
        self.appointments.get_appointment(appointment_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use clinicsync_domain::Professional;
    use uuid::Uuid;

    use super::*;

    struct InMemoryAppointments {
        rows: Mutex<HashMap<String, Appointment>>,
    }

    impl InMemoryAppointments {
        fn new() -> Self {
            Self { rows: Mutex::new(HashMap::new()) }
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Appointment>> {
            self.rows.lock().expect("appointments mutex")
        }
    }

    #[async_trait]
    impl AppointmentRepository for InMemoryAppointments {
        async fn get_appointment(&self, appointment_id: &str) -> Result<Appointment> {
            self.lock().get(appointment_id).cloned().ok_or_else(|| {
                ClinicSyncError::NotFound(format!("appointment {appointment_id} not found"))
            })
        }

        async fn get_active_appointments(
            &self,
            professional_id: &str,
        ) -> Result<Vec<Appointment>> {
            Ok(self
                .lock()
                .values()
                .filter(|a| a.professional_id == professional_id && !a.cancelled)
                .cloned()
                .collect())
        }

        async fn insert_checked(&self, request: &NewAppointment) -> Result<Appointment> {
            let mut rows = self.lock();
            if let Some(existing) = rows.values().find(|a| {
                a.professional_id == request.professional_id
                    && !a.cancelled
                    && a.slot().overlaps(&request.slot)
            }) {
                return Err(ClinicSyncError::Conflict(format!(
                    "requested slot {} overlaps existing appointment {}",
                    request.slot,
                    existing.slot()
                )));
            }

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
            rows.insert(appointment.id.clone(), appointment.clone());
            Ok(appointment)
        }

        async fn reschedule_checked(
            &self,
            appointment_id: &str,
            slot: TimeSlot,
        ) -> Result<Appointment> {
            let mut rows = self.lock();
            let professional_id = rows
                .get(appointment_id)
                .map(|a| a.professional_id.clone())
                .ok_or_else(|| {
                    ClinicSyncError::NotFound(format!("appointment {appointment_id} not found"))
                })?;

            if let Some(existing) = rows.values().find(|a| {
                a.id != appointment_id
                    && a.professional_id == professional_id
                    && !a.cancelled
                    && a.slot().overlaps(&slot)
            }) {
                return Err(ClinicSyncError::Conflict(format!(
                    "requested slot {slot} overlaps existing appointment {}",
                    existing.slot()
                )));
            }

            let appointment = rows.get_mut(appointment_id).ok_or_else(|| {
                ClinicSyncError::NotFound(format!("appointment {appointment_id} not found"))
            })?;
            appointment.start = slot.start;
            appointment.end = slot.end;
            appointment.updated_at = Utc::now();
            Ok(appointment.clone())
        }

        async fn cancel_appointment(&self, appointment_id: &str) -> Result<()> {
            let mut rows = self.lock();
            let appointment = rows.get_mut(appointment_id).ok_or_else(|| {
                ClinicSyncError::NotFound(format!("appointment {appointment_id} not found"))
            })?;
            appointment.cancelled = true;
            Ok(())
        }

        async fn set_external_event_id_if_absent(
            &self,
            appointment_id: &str,
            external_event_id: &str,
        ) -> Result<bool> {
            let mut rows = self.lock();
            let appointment = rows.get_mut(appointment_id).ok_or_else(|| {
                ClinicSyncError::NotFound(format!("appointment {appointment_id} not found"))
            })?;
            if appointment.external_event_id.is_some() {
                return Ok(false);
            }
            appointment.external_event_id = Some(external_event_id.to_string());
            Ok(true)
        }

        async fn clear_external_event_id(&self, appointment_id: &str) -> Result<()> {
            let mut rows = self.lock();
            let appointment = rows.get_mut(appointment_id).ok_or_else(|| {
                ClinicSyncError::NotFound(format!("appointment {appointment_id} not found"))
            })?;
            appointment.external_event_id = None;
            Ok(())
        }
    }

    struct InMemoryProfessionals {
        rows: HashMap<String, Professional>,
    }

    impl InMemoryProfessionals {
        fn with(professional: Professional) -> Self {
            let mut rows = HashMap::new();
            rows.insert(professional.id.clone(), professional);
            Self { rows }
        }
    }

    #[async_trait]
    impl ProfessionalRepository for InMemoryProfessionals {
        async fn get_professional(&self, professional_id: &str) -> Result<Professional> {
            self.rows.get(professional_id).cloned().ok_or_else(|| {
                ClinicSyncError::NotFound(format!("professional {professional_id} not found"))
            })
        }

        async fn set_refresh_token(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }

        async fn clear_refresh_token(&self, _: &str) -> Result<()> {
            Ok(())
        }
    }

    fn professional(id: &str, active: bool) -> Professional {
        Professional {
            id: id.to_string(),
            user_id: format!("user-{id}"),
            display_name: "Dr. Example".to_string(),
            time_zone: "America/Sao_Paulo".to_string(),
            active,
            calendar_refresh_token: None,
        }
    }

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, hour, min, 0).single().expect("valid timestamp")
    }

    fn slot(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeSlot {
        TimeSlot::new(at(h1, m1), at(h2, m2)).expect("valid slot")
    }

    fn request(professional_id: &str, slot: TimeSlot) -> NewAppointment {
        NewAppointment {
            professional_id: professional_id.to_string(),
            patient_id: "patient-1".to_string(),
            patient_name: "Ana Souza".to_string(),
            service_type: "Consulta".to_string(),
            notes: None,
            slot,
        }
    }

    fn service() -> BookingService {
        BookingService::new(
            Arc::new(InMemoryAppointments::new()),
            Arc::new(InMemoryProfessionals::with(professional("prof-1", true))),
        )
    }

    #[tokio::test]
    async fn overlapping_booking_rejected_with_conflicting_interval() {
        let svc = service();
        svc.book(request("prof-1", slot(10, 0, 11, 0))).await.expect("first booking");

        let err = svc
            .book(request("prof-1", slot(10, 30, 11, 30)))
            .await
            .expect_err("overlap rejected");
        match err {
            ClinicSyncError::Conflict(message) => {
                assert!(message.contains("10:00"), "conflict names the overlap: {message}");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn adjacent_booking_accepted() {
        let svc = service();
        svc.book(request("prof-1", slot(10, 0, 11, 0))).await.expect("first booking");
        svc.book(request("prof-1", slot(11, 0, 12, 0))).await.expect("adjacent slot accepted");
    }

    #[tokio::test]
    async fn cancelled_appointments_do_not_block() {
        let svc = service();
        let appointment =
            svc.book(request("prof-1", slot(10, 0, 11, 0))).await.expect("first booking");
        svc.cancel(&appointment.id).await.expect("cancelled");

        svc.book(request("prof-1", slot(10, 0, 11, 0))).await.expect("slot freed by cancel");
    }

    #[tokio::test]
    async fn reschedule_excludes_own_interval() {
        let svc = service();
        let appointment =
            svc.book(request("prof-1", slot(10, 0, 11, 0))).await.expect("booked");

        // Shifting within its own current interval must not self-conflict.
        let moved = svc
            .reschedule(&appointment.id, slot(10, 30, 11, 30))
            .await
            .expect("self-overlap excluded");
        assert_eq!(moved.slot(), slot(10, 30, 11, 30));
    }

    #[tokio::test]
    async fn reschedule_into_other_appointment_rejected() {
        let svc = service();
        svc.book(request("prof-1", slot(9, 0, 10, 0))).await.expect("first");
        let second = svc.book(request("prof-1", slot(10, 0, 11, 0))).await.expect("second");

        let err = svc
            .reschedule(&second.id, slot(9, 30, 10, 30))
            .await
            .expect_err("overlap with first");
        assert!(matches!(err, ClinicSyncError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_professional_is_not_found() {
        let svc = service();
        let err =
            svc.try_book("prof-missing", slot(10, 0, 11, 0), None).await.expect_err("unknown");
        assert!(matches!(err, ClinicSyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn inactive_professional_is_not_found() {
        let svc = BookingService::new(
            Arc::new(InMemoryAppointments::new()),
            Arc::new(InMemoryProfessionals::with(professional("prof-1", false))),
        );
        let err =
            svc.try_book("prof-1", slot(10, 0, 11, 0), None).await.expect_err("inactive");
        assert!(matches!(err, ClinicSyncError::NotFound(_)));
    }
}
