//! Sync orchestration
//!
//! Runs a calendar propagation and, when it fails, records the failure in
//! the durable ledger before surfacing it. Retries of recorded entries go
//! through [`super::retry::RetryCoordinator`] instead, which updates the
//! existing entry rather than recording a new one.

use std::sync::Arc;

use clinicsync_domain::{NewSyncError, Result, SyncAction};
use tracing::{info, instrument, warn};

use super::ports::{CalendarSyncPort, SyncErrorRepository, SyncFailure};
use crate::booking::ports::AppointmentRepository;

/// Result of a triggered sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote calendar reflects the appointment
    Completed,
    /// The propagation failed; a ledger entry was recorded
    Failed { error_id: String, message: String },
}

/// Runs calendar propagation with durable failure recording.
pub struct SyncService {
    calendar: Arc<dyn CalendarSyncPort>,
    ledger: Arc<dyn SyncErrorRepository>,
    appointments: Arc<dyn AppointmentRepository>,
}

impl SyncService {
    pub fn new(
        calendar: Arc<dyn CalendarSyncPort>,
        ledger: Arc<dyn SyncErrorRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self { calendar, ledger, appointments }
    }

    /// Propagate an appointment lifecycle event to the external calendar.
    ///
    /// Never bubbles the remote failure itself: a failed propagation becomes
    /// a ledger entry and a `Failed` outcome. Only ledger persistence errors
    /// surface as `Err`.
    #[instrument(skip(self))]
    pub async fn sync(&self, action: SyncAction, appointment_id: &str) -> Result<SyncOutcome> {
        let result = match action {
            SyncAction::Create => self.calendar.create(appointment_id).await.map(|_| ()),
            SyncAction::Update => self.calendar.update(appointment_id).await,
            SyncAction::Delete => self.calendar.delete(appointment_id).await,
        };

        match result {
            Ok(()) => {
                info!(appointment_id, ?action, "calendar sync completed");
                Ok(SyncOutcome::Completed)
            }
            Err(failure) => {
                let message = failure.to_string();
                let entry = self.record_failure(appointment_id, &failure).await?;
                warn!(
                    appointment_id,
                    ?action,
                    error_id = %entry,
                    error = %message,
                    "calendar sync failed; recorded in ledger"
                );
                Ok(SyncOutcome::Failed { error_id: entry, message })
            }
        }
    }

    async fn record_failure(
        &self,
        appointment_id: &str,
        failure: &SyncFailure,
    ) -> Result<String> {
        let mut entry = NewSyncError::synchronization(appointment_id, failure.to_string());
        if !failure.is_retryable() {
            // Fatal failures are recorded already exhausted.
            entry.max_attempts = 0;
        }

        // Owner attribution is best effort; the subject may be gone.
        if let Ok(appointment) = self.appointments.get_appointment(appointment_id).await {
            entry = entry.with_owner(appointment.professional_id, None);
        }

        let recorded = self.ledger.record(entry).await?;
        Ok(recorded.id)
    }
}
