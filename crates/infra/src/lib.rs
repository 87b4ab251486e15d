//! # ClinicSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite)
//! - External calendar integration (Google Calendar + OAuth token manager)
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `clinicsync-core`
//! - Contains all "impure" code (I/O, HTTP)

pub mod config;
pub mod database;
pub mod errors;
pub mod integrations;

// Re-export commonly used items
pub use config::load_config;
pub use database::*;
pub use integrations::*;
