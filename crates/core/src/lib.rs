//! # ClinicSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The booking conflict resolver and appointment lifecycle service
//! - The sync error retry coordinator
//! - Port/adapter interfaces (traits) implemented by the infra layer
//!
//! ## Architecture Principles
//! - Only depends on `clinicsync-domain`
//! - No database or HTTP code
//! - All external dependencies via traits

pub mod booking;
pub mod sync;

pub use booking::ports::{AppointmentRepository, ProfessionalRepository};
pub use booking::service::{BookingDecision, BookingService};
pub use sync::ports::{CalendarSyncPort, SyncErrorRepository, SyncFailure, SyncResult};
pub use sync::retry::{calculate_backoff, RetryCoordinator, RetryOutcome};
pub use sync::service::{SyncOutcome, SyncService};
