//! Sync error ledger types

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_RETRY_ATTEMPTS;
use crate::errors::ClinicSyncError;

/// Category of a recorded sync failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorCategory {
    /// Calendar propagation failed; eligible for retry.
    Synchronization,
    /// A remote event exists that the local row does not reference (e.g. a
    /// race between two creates). Requires operator attention, never
    /// auto-retried.
    Inconsistency,
}

impl std::fmt::Display for SyncErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Synchronization => write!(f, "synchronization"),
            Self::Inconsistency => write!(f, "inconsistency"),
        }
    }
}

impl FromStr for SyncErrorCategory {
    type Err = ClinicSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synchronization" => Ok(Self::Synchronization),
            "inconsistency" => Ok(Self::Inconsistency),
            other => Err(ClinicSyncError::InvalidInput(format!(
                "unknown sync error category: {other}"
            ))),
        }
    }
}

/// Durable record of a failed calendar propagation.
///
/// Invariants: `retry_count` only increases; `resolved` is monotonic
/// false→true and never reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncError {
    pub id: String,
    pub appointment_id: String,
    pub professional_id: Option<String>,
    pub user_id: Option<String>,
    pub category: SyncErrorCategory,
    pub message: String,
    pub retry_count: u32,
    pub max_attempts: u32,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncError {
    /// Whether automatic retry may still be attempted.
    #[must_use]
    pub fn retry_eligible(&self) -> bool {
        !self.resolved
            && self.category == SyncErrorCategory::Synchronization
            && self.retry_count < self.max_attempts
    }
}

/// Parameters for recording a new ledger entry.
#[derive(Debug, Clone)]
pub struct NewSyncError {
    pub appointment_id: String,
    pub professional_id: Option<String>,
    pub user_id: Option<String>,
    pub category: SyncErrorCategory,
    pub message: String,
    pub max_attempts: u32,
}

impl NewSyncError {
    /// A retryable synchronization failure with the default attempt ceiling.
    #[must_use]
    pub fn synchronization(appointment_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            appointment_id: appointment_id.into(),
            professional_id: None,
            user_id: None,
            category: SyncErrorCategory::Synchronization,
            message: message.into(),
            max_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
        }
    }

    /// An inconsistency entry; recorded already exhausted so the retry
    /// coordinator never picks it up.
    #[must_use]
    pub fn inconsistency(appointment_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            appointment_id: appointment_id.into(),
            professional_id: None,
            user_id: None,
            category: SyncErrorCategory::Inconsistency,
            message: message.into(),
            max_attempts: 0,
        }
    }

    #[must_use]
    pub fn with_owner(
        mut self,
        professional_id: impl Into<String>,
        user_id: Option<String>,
    ) -> Self {
        self.professional_id = Some(professional_id.into());
        self.user_id = user_id;
        self
    }
}

/// Action requested through the sync trigger endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Create,
    Update,
    Delete,
}
