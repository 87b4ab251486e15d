//! # ClinicSync Domain
//!
//! Business domain types and models for the booking and calendar sync engine.
//!
//! This crate contains:
//! - Domain data types (Appointment, Professional, SyncError, etc.)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other ClinicSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
