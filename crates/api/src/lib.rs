//! # ClinicSync API
//!
//! axum HTTP surface over the booking and calendar sync services:
//! booking endpoints, the OAuth connect/callback pair, the sync trigger,
//! and the sync error ledger endpoints.

pub mod context;
pub mod error;
pub mod extract;
pub mod routes;

pub use context::AppContext;
pub use routes::router;
