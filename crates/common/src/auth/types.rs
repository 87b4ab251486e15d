//! OAuth 2.0 types and structures
//!
//! Unified data structures for OAuth tokens, responses, and configuration
//! used by the calendar integration.

use serde::{Deserialize, Serialize};

/// OAuth 2.0 access and refresh tokens
///
/// The refresh token is optional: a provider only issues one for offline
/// access, and refresh-grant responses omit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for API authentication
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds, as reported by the provider
    pub expires_in: i64,
}

/// OAuth token response from the authorization server
///
/// Standard OAuth 2.0 token response format (RFC 6749). Fields this engine
/// does not consume (`token_type`, `scope`) are ignored on deserialization.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
        }
    }
}

/// OAuth configuration for a confidential (server-side) client
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,

    /// OAuth client secret (confidential client)
    pub client_secret: String,

    /// Redirect URI registered with the provider
    pub redirect_uri: String,

    /// Full authorization endpoint URL
    pub authorization_endpoint: String,

    /// Full token endpoint URL
    pub token_endpoint: String,

    /// OAuth scopes to request
    pub scopes: Vec<String>,

    /// Extra query parameters appended to the authorization URL
    /// (e.g. `access_type=offline`, `prompt=consent`)
    pub extra_authorize_params: Vec<(String, String)>,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        authorization_endpoint: String,
        token_endpoint: String,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            authorization_endpoint,
            token_endpoint,
            scopes,
            extra_authorize_params: Vec::new(),
        }
    }

    pub fn add_authorize_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra_authorize_params.push((key.into(), value.into()));
    }

    /// Get scopes as a space-separated string.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// OAuth error response from the authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
pub struct OAuthProviderError {
    pub error: String,
    pub error_description: Option<String>,
}

impl std::fmt::Display for OAuthProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {description}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}
