//! # ClinicSync Common
//!
//! Shared authorization building blocks used by the infrastructure layer:
//! the signed state token service and the OAuth 2.0 HTTP client.
//!
//! ## Architecture
//! - No dependencies on other ClinicSync crates
//! - Errors are crate-local enums; the infra layer maps them into the domain
//!   error taxonomy at the boundary

pub mod auth;

// Re-export commonly used items
pub use auth::{
    OAuthClient, OAuthClientError, OAuthConfig, OAuthProviderError, StateClaims,
    StateTokenError, StateTokenService, TokenResponse, TokenSet,
};
