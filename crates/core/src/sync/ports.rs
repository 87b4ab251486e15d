//! Port interfaces for calendar sync and the error ledger

use async_trait::async_trait;
use clinicsync_domain::{NewSyncError, Result, SyncError};
use thiserror::Error;

/// Classified calendar propagation failure.
///
/// Retryable variants are recorded in the ledger and remain eligible for the
/// retry coordinator; `AppointmentNotFound` is fatal (the subject vanished)
/// and is recorded already exhausted.
#[derive(Debug, Error)]
pub enum SyncFailure {
    /// The professional has no stored refresh token; a human can
    /// re-authorize later
    #[error("calendar credential missing: {0}")]
    CredentialMissing(String),

    /// The refresh-token exchange with the provider failed
    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Network error or provider 5xx
    #[error("calendar request failed: {0}")]
    RemoteRequestFailed(String),

    /// Provider 4xx other than auth; unlikely to self-resolve but surfaced
    /// to the operator rather than dropped
    #[error("calendar request rejected: {0}")]
    RemoteRejected(String),

    /// The appointment no longer exists; never retried
    #[error("appointment not found: {0}")]
    AppointmentNotFound(String),

    /// Local persistence failed around the remote call
    #[error("storage error during sync: {0}")]
    Storage(String),
}

impl SyncFailure {
    /// Whether the failure may self-resolve and is eligible for retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::AppointmentNotFound(_))
    }
}

/// Result alias for calendar propagation operations
pub type SyncResult<T> = std::result::Result<T, SyncFailure>;

/// Trait for propagating appointment lifecycle events to the external
/// calendar
#[async_trait]
pub trait CalendarSyncPort: Send + Sync {
    /// Create the remote event for an appointment; returns the external
    /// event id. Gated so repeated calls never create a second remote event
    /// for the same appointment.
    async fn create(&self, appointment_id: &str) -> SyncResult<String>;

    /// Propagate field changes. An appointment that was never synced is
    /// implicitly created.
    async fn update(&self, appointment_id: &str) -> SyncResult<()>;

    /// Delete the remote event; no-op when the appointment was never synced.
    async fn delete(&self, appointment_id: &str) -> SyncResult<()>;
}

/// Trait for the durable sync error ledger
#[async_trait]
pub trait SyncErrorRepository: Send + Sync {
    /// Record a new failure
    async fn record(&self, error: NewSyncError) -> Result<SyncError>;

    /// Get a ledger entry by ID
    async fn find(&self, error_id: &str) -> Result<SyncError>;

    /// Unresolved entries, optionally filtered by the subject appointment,
    /// most recent first
    async fn list_unresolved(&self, appointment_id: Option<&str>) -> Result<Vec<SyncError>>;

    /// Mark an entry resolved. Idempotent; the flag is monotonic and never
    /// reset.
    async fn mark_resolved(&self, error_id: &str) -> Result<()>;

    /// Increment the retry counter, returning the updated entry. The counter
    /// only ever increases.
    async fn increment_retry(&self, error_id: &str) -> Result<SyncError>;

    /// Replace the entry's message after a failed retry
    async fn update_message(&self, error_id: &str, message: &str) -> Result<()>;
}
