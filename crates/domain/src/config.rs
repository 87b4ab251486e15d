//! Application configuration structures
//!
//! Values are loaded from the environment by the infra layer; this module
//! only defines the typed shape.

use serde::{Deserialize, Serialize};

use crate::constants::{
    GOOGLE_AUTHORIZATION_ENDPOINT, GOOGLE_CALENDAR_API_BASE, GOOGLE_TOKEN_ENDPOINT,
    HTTP_TIMEOUT_SECS,
};

/// Configuration for the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file path
    pub database_path: String,
    /// Connection pool size
    pub database_pool_size: u32,
    /// HTTP bind address, e.g. `127.0.0.1:8080`
    pub bind_address: String,
    /// OAuth client credentials for the calendar provider
    pub oauth: OAuthSettings,
    /// Secret used to sign authorization state tokens
    pub state_signing_secret: String,
    /// Browser destination after the OAuth callback completes
    pub post_auth_redirect_url: String,
    /// Calendar API base URL (sandbox/production variants)
    pub calendar_api_base: String,
    /// Outbound HTTP timeout in seconds
    pub http_timeout_secs: u64,
}

/// OAuth client settings for the external calendar provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI registered with the provider (the callback endpoint)
    pub redirect_uri: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
}

impl OAuthSettings {
    /// Google settings with production endpoints.
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            authorization_endpoint: GOOGLE_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "clinicsync.db".to_string(),
            database_pool_size: 4,
            bind_address: "127.0.0.1:8080".to_string(),
            oauth: OAuthSettings::google("", "", "http://localhost:8080/calendar/callback"),
            state_signing_secret: String::new(),
            post_auth_redirect_url: "http://localhost:3000/settings".to_string(),
            calendar_api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}
