//! Calendar sync port implementation
//!
//! Ties the appointment store, the OAuth manager, and the events API client
//! together. The create path is idempotent under concurrency: the stored
//! `external_event_id` is claimed with a conditional update, and a claim
//! that loses the race records an inconsistency entry for the orphaned
//! remote event instead of leaving it invisible.

use std::sync::Arc;

use async_trait::async_trait;
use clinicsync_core::{
    AppointmentRepository, CalendarSyncPort, ProfessionalRepository, SyncErrorRepository,
    SyncFailure, SyncResult,
};
use clinicsync_domain::{Appointment, ClinicSyncError, NewSyncError, Professional};
use tracing::{debug, info, instrument, warn};

use super::client::GoogleCalendarClient;
use super::oauth::CalendarOAuthManager;
use super::types::EventPayload;

/// Propagates appointment lifecycle events to Google Calendar.
pub struct CalendarSyncAdapter {
    appointments: Arc<dyn AppointmentRepository>,
    professionals: Arc<dyn ProfessionalRepository>,
    oauth: Arc<CalendarOAuthManager>,
    client: GoogleCalendarClient,
    ledger: Arc<dyn SyncErrorRepository>,
}

impl CalendarSyncAdapter {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        professionals: Arc<dyn ProfessionalRepository>,
        oauth: Arc<CalendarOAuthManager>,
        client: GoogleCalendarClient,
        ledger: Arc<dyn SyncErrorRepository>,
    ) -> Self {
        Self { appointments, professionals, oauth, client, ledger }
    }

    async fn load_appointment(&self, appointment_id: &str) -> SyncResult<Appointment> {
        self.appointments.get_appointment(appointment_id).await.map_err(|e| match e {
            ClinicSyncError::NotFound(message) => SyncFailure::AppointmentNotFound(message),
            other => SyncFailure::Storage(other.to_string()),
        })
    }

    async fn load_professional(&self, professional_id: &str) -> SyncResult<Professional> {
        self.professionals
            .get_professional(professional_id)
            .await
            .map_err(|e| SyncFailure::Storage(e.to_string()))
    }

    /// Insert the remote event and claim the external id. Exactly one of the
    /// racing creators keeps its event; a loser records the orphan and
    /// reports the winner's id.
    async fn create_and_claim(&self, appointment: &Appointment) -> SyncResult<String> {
        let professional = self.load_professional(&appointment.professional_id).await?;
        let access_token = self.oauth.get_access_token(&professional.id).await?;

        let payload = EventPayload::from_appointment(appointment, &professional.time_zone);
        let event_id = self.client.insert_event(&access_token, &payload).await?;

        let claimed = self
            .appointments
            .set_external_event_id_if_absent(&appointment.id, &event_id)
            .await
            .map_err(|e| SyncFailure::Storage(e.to_string()))?;

        if claimed {
            info!(
                appointment_id = %appointment.id,
                external_event_id = %event_id,
                "calendar event created"
            );
            return Ok(event_id);
        }

        // Another writer claimed first. The event just inserted is now an
        // orphan on the remote calendar; record it for an operator.
        warn!(
            appointment_id = %appointment.id,
            orphan_event_id = %event_id,
            "lost create race; recording orphaned remote event"
        );
        let entry = NewSyncError::inconsistency(
            &appointment.id,
            format!(
                "duplicate remote event {event_id} created for appointment {}; \
                 manual cleanup required",
                appointment.id
            ),
        )
        .with_owner(&appointment.professional_id, None);
        self.ledger.record(entry).await.map_err(|e| SyncFailure::Storage(e.to_string()))?;

        let winner = self.load_appointment(&appointment.id).await?;
        winner.external_event_id.ok_or_else(|| {
            SyncFailure::Storage(format!(
                "appointment {} lost the claim yet has no external event id",
                appointment.id
            ))
        })
    }
}

#[async_trait]
impl CalendarSyncPort for CalendarSyncAdapter {
    #[instrument(skip(self))]
    async fn create(&self, appointment_id: &str) -> SyncResult<String> {
        let appointment = self.load_appointment(appointment_id).await?;

        // Already synced: repeat triggers must not create a second event.
        if let Some(existing) = appointment.external_event_id.clone() {
            debug!(appointment_id, external_event_id = %existing, "already synced");
            return Ok(existing);
        }

        self.create_and_claim(&appointment).await
    }

    #[instrument(skip(self))]
    async fn update(&self, appointment_id: &str) -> SyncResult<()> {
        let appointment = self.load_appointment(appointment_id).await?;

        let Some(event_id) = appointment.external_event_id.clone() else {
            // Never synced; an update trigger creates the event instead.
            self.create_and_claim(&appointment).await?;
            return Ok(());
        };

        let professional = self.load_professional(&appointment.professional_id).await?;
        let access_token = self.oauth.get_access_token(&professional.id).await?;
        let payload = EventPayload::from_appointment(&appointment, &professional.time_zone);
        self.client.patch_event(&access_token, &event_id, &payload).await?;

        info!(appointment_id, external_event_id = %event_id, "calendar event updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, appointment_id: &str) -> SyncResult<()> {
        let appointment = self.load_appointment(appointment_id).await?;

        let Some(event_id) = appointment.external_event_id.clone() else {
            debug!(appointment_id, "never synced; nothing to delete remotely");
            return Ok(());
        };

        let access_token = self.oauth.get_access_token(&appointment.professional_id).await?;
        self.client.delete_event(&access_token, &event_id).await?;

        self.appointments
            .clear_external_event_id(appointment_id)
            .await
            .map_err(|e| SyncFailure::Storage(e.to_string()))?;

        info!(appointment_id, external_event_id = %event_id, "calendar event deleted");
        Ok(())
    }
}
