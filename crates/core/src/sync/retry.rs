//! Retry coordinator for the sync error ledger
//!
//! Re-attempts failed calendar propagation. The retry counter is incremented
//! durably *before* the remote attempt so a crash mid-retry still reflects
//! it. An explicit attempts ceiling and capped exponential backoff bound
//! automatic retries; exhaustion is surfaced to the operator, never silently
//! abandoned.

use std::sync::Arc;
use std::time::Duration;

use clinicsync_domain::constants::{RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_MS};
use clinicsync_domain::Result;
use tracing::{info, instrument, warn};

use super::ports::{CalendarSyncPort, SyncErrorRepository};

/// Outcome of a retry attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The remote operation succeeded; the entry was marked resolved
    Succeeded,
    /// The attempt failed again; the message was updated, the entry stays
    /// unresolved
    StillFailing { message: String },
    /// The attempts ceiling was reached (or the category is not retryable);
    /// no attempt was made
    AttemptsExhausted,
}

/// Coordinates retries of recorded sync failures
pub struct RetryCoordinator {
    ledger: Arc<dyn SyncErrorRepository>,
    calendar: Arc<dyn CalendarSyncPort>,
}

impl RetryCoordinator {
    pub fn new(ledger: Arc<dyn SyncErrorRepository>, calendar: Arc<dyn CalendarSyncPort>) -> Self {
        Self { ledger, calendar }
    }

    /// Re-attempt the failed sync behind a ledger entry.
    ///
    /// Increments the retry count before invoking the calendar adapter, so
    /// the audit trail reflects the attempt even if the process dies mid
    /// flight. Success marks the entry resolved; failure updates the message
    /// and leaves `resolved = false`.
    #[instrument(skip(self))]
    pub async fn retry(&self, error_id: &str) -> Result<RetryOutcome> {
        let entry = self.ledger.find(error_id).await?;

        if entry.resolved {
            info!(error_id, "entry already resolved; nothing to retry");
            return Ok(RetryOutcome::Succeeded);
        }
        if !entry.retry_eligible() {
            warn!(
                error_id,
                retry_count = entry.retry_count,
                max_attempts = entry.max_attempts,
                category = %entry.category,
                "entry is not eligible for retry"
            );
            return Ok(RetryOutcome::AttemptsExhausted);
        }

        let entry = self.ledger.increment_retry(error_id).await?;

        match self.calendar.create(&entry.appointment_id).await {
            Ok(external_event_id) => {
                self.ledger.mark_resolved(error_id).await?;
                info!(
                    error_id,
                    appointment_id = %entry.appointment_id,
                    external_event_id = %external_event_id,
                    retry_count = entry.retry_count,
                    "retry succeeded; entry resolved"
                );
                Ok(RetryOutcome::Succeeded)
            }
            Err(failure) => {
                let message = failure.to_string();
                self.ledger.update_message(error_id, &message).await?;
                warn!(
                    error_id,
                    appointment_id = %entry.appointment_id,
                    retry_count = entry.retry_count,
                    error = %message,
                    "retry failed; entry left unresolved"
                );
                Ok(RetryOutcome::StillFailing { message })
            }
        }
    }

    /// Retry with the backoff delay appropriate for the entry's attempt
    /// count. Used by automation; operator-triggered retries call
    /// [`Self::retry`] directly.
    pub async fn retry_with_backoff(&self, error_id: &str) -> Result<RetryOutcome> {
        let entry = self.ledger.find(error_id).await?;
        if !entry.resolved && entry.retry_eligible() && entry.retry_count > 0 {
            tokio::time::sleep(Duration::from_millis(calculate_backoff(entry.retry_count))).await;
        }
        self.retry(error_id).await
    }
}

/// Calculate exponential backoff delay with jitter
pub fn calculate_backoff(attempt: u32) -> u64 {
    let delay = RETRY_BASE_DELAY_MS * 2u64.pow(attempt.min(5));
    let capped_delay = delay.min(RETRY_MAX_DELAY_MS);

    // ±25% jitter
    use rand::Rng;
    let jitter_range = (capped_delay as f64 * 0.25) as u64;
    let mut rng = rand::thread_rng();
    let jitter = rng.gen_range(0..=jitter_range * 2) as i64 - jitter_range as i64;

    (capped_delay as i64 + jitter).max(0) as u64
}
