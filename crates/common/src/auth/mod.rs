//! OAuth 2.0 infrastructure for the calendar integration
//!
//! This module provides the pieces the calendar connection flow is built
//! from:
//!
//! - **Signed state tokens**: self-contained, HMAC-signed, time-boxed tokens
//!   that carry authorization context across the provider's browser redirect
//!   without server-side session storage ("stateless state").
//! - **OAuth client**: authorization URL assembly, authorization-code
//!   exchange, and refresh-token exchange against a standard OAuth 2.0 token
//!   endpoint (confidential client with a client secret).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ CalendarOAuthManager │  (infra crate)
//! └─────────┬────────────┘
//!           │
//!           ├──► StateTokenService  (mint/verify redirect state)
//!           └──► OAuthClient        (HTTP token exchanges)
//! ```

pub mod client;
pub mod state;
pub mod types;

pub use client::{OAuthClient, OAuthClientError};
pub use state::{StateClaims, StateTokenError, StateTokenService};
pub use types::{OAuthConfig, OAuthProviderError, TokenResponse, TokenSet};
