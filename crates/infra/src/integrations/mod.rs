//! External service integrations

pub mod calendar;

pub use calendar::{
    AuthorizationRequest, CalendarOAuthManager, CalendarSyncAdapter, GoogleCalendarClient,
};
