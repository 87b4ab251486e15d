//! Appointment types and the half-open time slot model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ClinicSyncError, Result};

/// Half-open time range `[start, end)`.
///
/// The end instant is excluded, so adjacent slots (`a.end == b.start`) do not
/// overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    /// Build a slot, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(ClinicSyncError::InvalidInput(format!(
                "appointment start ({start}) must be before end ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Half-open interval overlap test.
    #[must_use]
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// A booked appointment.
///
/// Appointments are never hard-deleted; cancellation only flips the flag.
/// `external_event_id` references the provider-side calendar event once sync
/// has succeeded, and is cleared again on successful remote deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub professional_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub service_type: String,
    pub notes: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub cancelled: bool,
    pub confirmed: bool,
    pub external_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// The appointment's interval as a slot value.
    #[must_use]
    pub fn slot(&self) -> TimeSlot {
        TimeSlot { start: self.start, end: self.end }
    }
}

/// Parameters for creating a new appointment after conflict checking passed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub professional_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub service_type: String,
    pub notes: Option<String>,
    pub slot: TimeSlot,
}
