//! Google Calendar integration
//!
//! Three layers, wired bottom-up:
//! - [`GoogleCalendarClient`]: raw events API (insert/patch/delete) with
//!   failure classification
//! - [`CalendarOAuthManager`]: authorization flow plus access-token
//!   derivation from the stored refresh token
//! - [`CalendarSyncAdapter`]: the [`clinicsync_core::CalendarSyncPort`]
//!   implementation tying both to the appointment store

pub mod adapter;
pub mod client;
pub mod oauth;
pub mod types;

pub use adapter::CalendarSyncAdapter;
pub use client::GoogleCalendarClient;
pub use oauth::{AuthorizationRequest, CalendarOAuthManager};
