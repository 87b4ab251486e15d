//! OAuth 2.0 client for a confidential server-side application
//!
//! Handles the provider-facing half of the calendar connection flow:
//! - Authorization URL building (the caller supplies the signed state)
//! - Authorization code exchange
//! - Refresh-token exchange for short-lived access tokens

use std::time::Duration;

use reqwest::Client;

use super::types::{OAuthConfig, OAuthProviderError, TokenResponse, TokenSet};

/// Error type for OAuth client operations
#[derive(Debug, thiserror::Error)]
pub enum OAuthClientError {
    /// HTTP request failed (network, timeout)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// OAuth server returned an error body; surfaced verbatim for
    /// diagnostics
    #[error("OAuth error: {0}")]
    OAuthError(OAuthProviderError),

    /// Failed to parse the provider response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Provider did not issue a refresh token (no offline access granted)
    #[error("no refresh token issued by provider")]
    NoRefreshToken,
}

/// OAuth 2.0 client
///
/// Implements RFC 6749 authorization-code and refresh-token grants for a
/// confidential client. CSRF protection across the redirect hop is handled
/// by the signed state token, not by this client.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with the given configuration and request
    /// timeout.
    #[must_use]
    pub fn new(config: OAuthConfig, timeout: Duration) -> Self {
        let client =
            Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new());
        Self { config, client }
    }

    /// Build the provider authorization URL carrying the given state.
    ///
    /// The state is minted by [`super::StateTokenService`] and travels
    /// through the user's browser; extra parameters configured on the
    /// [`OAuthConfig`] (offline access, consent prompt) are appended here.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        let scope_string = self.config.scope_string();

        let mut params = vec![
            ("response_type".to_string(), "code".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
            ("scope".to_string(), scope_string),
            ("state".to_string(), state.to_string()),
        ];
        params.extend(self.config.extra_authorize_params.iter().cloned());

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.config.authorization_endpoint, query_string)
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Returns [`OAuthClientError::NoRefreshToken`] when the provider grants
    /// no offline access; the caller must prompt for re-consent in that case.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, OAuthClientError> {
        let request_body = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("client_secret".to_string(), self.config.client_secret.clone()),
            ("code".to_string(), code.to_string()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
        ];

        let tokens = self.execute_token_request(&request_body).await?;
        if tokens.refresh_token.is_none() {
            return Err(OAuthClientError::NoRefreshToken);
        }
        Ok(tokens)
    }

    /// Exchange a refresh token for a new short-lived access token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let request_body = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("client_secret".to_string(), self.config.client_secret.clone()),
            ("refresh_token".to_string(), refresh_token.to_string()),
        ];

        self.execute_token_request(&request_body).await
    }

    async fn execute_token_request(
        &self,
        form: &[(String, String)],
    ) -> Result<TokenSet, OAuthClientError> {
        let response =
            self.client.post(&self.config.token_endpoint).form(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error: OAuthProviderError =
                serde_json::from_str(&body).unwrap_or_else(|_| OAuthProviderError {
                    error: format!("http_{}", status.as_u16()),
                    error_description: Some(body),
                });
            return Err(OAuthClientError::OAuthError(error));
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;

        Ok(token_response.into())
    }
}
