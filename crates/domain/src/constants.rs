//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! engine.

// Sync error retry policy
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 5;
pub const RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const RETRY_MAX_DELAY_MS: u64 = 32_000;

// Outbound HTTP
pub const HTTP_TIMEOUT_SECS: u64 = 30;

// Google endpoints (overridable through configuration)
pub const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

// Access tokens are cached in-process only; entries drop this many seconds
// before the provider-reported expiry.
pub const ACCESS_TOKEN_CACHE_SAFETY_SECS: u64 = 60;
pub const ACCESS_TOKEN_CACHE_MIN_TTL_SECS: u64 = 30;
