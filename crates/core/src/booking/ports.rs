//! Port interfaces for booking operations

use async_trait::async_trait;
use clinicsync_domain::{Appointment, NewAppointment, Professional, Result, TimeSlot};

/// Trait for appointment persistence
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Get an appointment by its ID
    async fn get_appointment(&self, appointment_id: &str) -> Result<Appointment>;

    /// All non-cancelled appointments for a professional, regardless of time
    async fn get_active_appointments(&self, professional_id: &str) -> Result<Vec<Appointment>>;

    /// Atomically re-check the overlap invariant and insert.
    ///
    /// This is the source of truth for the no-overlap invariant: the check
    /// and the insert run inside one write transaction, so two racing
    /// bookings for the same slot cannot both commit. A conflict surfaces as
    /// `ClinicSyncError::Conflict` naming the overlapping range, the same
    /// error shape the resolver pre-check produces.
    async fn insert_checked(&self, appointment: &NewAppointment) -> Result<Appointment>;

    /// Atomically re-check and move an existing appointment to a new slot,
    /// excluding the appointment itself from the overlap scan.
    async fn reschedule_checked(&self, appointment_id: &str, slot: TimeSlot)
        -> Result<Appointment>;

    /// Flag an appointment cancelled (never hard-deletes)
    async fn cancel_appointment(&self, appointment_id: &str) -> Result<()>;

    /// Set the external calendar event reference, only if none is set yet.
    /// Returns `false` when another writer already claimed it.
    async fn set_external_event_id_if_absent(
        &self,
        appointment_id: &str,
        external_event_id: &str,
    ) -> Result<bool>;

    /// Clear the external calendar event reference after remote deletion
    async fn clear_external_event_id(&self, appointment_id: &str) -> Result<()>;
}

/// Trait for professional record access
#[async_trait]
pub trait ProfessionalRepository: Send + Sync {
    /// Get a professional by ID
    async fn get_professional(&self, professional_id: &str) -> Result<Professional>;

    /// Persist the calendar refresh token after a successful code exchange
    async fn set_refresh_token(&self, professional_id: &str, refresh_token: &str) -> Result<()>;

    /// Revoke the stored refresh token (user-initiated disconnect or
    /// unrecoverable auth error)
    async fn clear_refresh_token(&self, professional_id: &str) -> Result<()>;
}
