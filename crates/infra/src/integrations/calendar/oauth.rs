//! Calendar authorization flow and access-token manager
//!
//! Owns the two halves of the credential lifecycle:
//! - the browser round trip (authorization URL out, signed state + code back)
//! - deriving short-lived access tokens from the stored refresh token, with
//!   an in-process cache so a burst of syncs does not hammer the token
//!   endpoint
//!
//! Access tokens never touch the database; the refresh token on the
//! professional row is the only durable credential.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use clinicsync_common::{OAuthClient, OAuthClientError, StateTokenError, StateTokenService};
use clinicsync_core::{ProfessionalRepository, SyncFailure, SyncResult};
use clinicsync_domain::constants::{
    ACCESS_TOKEN_CACHE_MIN_TTL_SECS, ACCESS_TOKEN_CACHE_SAFETY_SECS,
};
use clinicsync_domain::{ClinicSyncError, Professional, Result};
use moka::future::Cache;
use moka::Expiry;
use tracing::{info, instrument, warn};

/// Cached access token with its remaining useful lifetime.
#[derive(Debug, Clone)]
struct CachedAccessToken {
    token: String,
    ttl: Duration,
}

struct TokenExpiry;

impl Expiry<String, CachedAccessToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedAccessToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// A started authorization flow: the signed state and the provider URL the
/// browser should visit.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub state: String,
    pub authorization_url: String,
}

/// Manages calendar authorization and access-token derivation.
pub struct CalendarOAuthManager {
    professionals: Arc<dyn ProfessionalRepository>,
    oauth: OAuthClient,
    state_tokens: StateTokenService,
    access_tokens: Cache<String, CachedAccessToken>,
}

impl CalendarOAuthManager {
    pub fn new(
        professionals: Arc<dyn ProfessionalRepository>,
        oauth: OAuthClient,
        state_tokens: StateTokenService,
    ) -> Self {
        let access_tokens =
            Cache::builder().max_capacity(1_000).expire_after(TokenExpiry).build();
        Self { professionals, oauth, state_tokens, access_tokens }
    }

    /// Start the authorization flow for a professional.
    ///
    /// The caller must own the professional record; the same check is
    /// repeated on callback because the state token round-trips through the
    /// browser.
    #[instrument(skip(self))]
    pub async fn begin_authorization(
        &self,
        professional_id: &str,
        user_id: &str,
    ) -> Result<AuthorizationRequest> {
        let professional = self.owned_professional(professional_id, user_id).await?;

        let state = self.state_tokens.mint(&professional.id, user_id, Utc::now());
        let authorization_url = self.oauth.authorization_url(&state);
        Ok(AuthorizationRequest { state, authorization_url })
    }

    /// Complete the flow with the state and code returned by the provider.
    ///
    /// Verifies the state signature and window, re-checks ownership against
    /// current data, exchanges the code, and persists the refresh token.
    #[instrument(skip(self, state, code))]
    pub async fn complete_authorization(&self, state: &str, code: &str) -> Result<Professional> {
        let claims = self.state_tokens.verify(state, Utc::now()).map_err(|e| match e {
            StateTokenError::InvalidSignature => {
                ClinicSyncError::Security("authorization state failed verification".into())
            }
            StateTokenError::Expired => {
                ClinicSyncError::Auth("authorization state expired".into())
            }
        })?;

        // Ownership may have changed while the user was at the consent
        // screen; the state only proves who started the flow.
        let professional =
            self.owned_professional(&claims.professional_id, &claims.user_id).await?;

        let tokens = self.oauth.exchange_code(code).await.map_err(map_exchange_error)?;
        let refresh_token = tokens
            .refresh_token
            .ok_or_else(|| ClinicSyncError::Auth("provider issued no refresh token".into()))?;

        self.professionals.set_refresh_token(&professional.id, &refresh_token).await?;
        self.cache_access_token(&professional.id, &tokens.access_token, tokens.expires_in).await;

        info!(professional_id = %professional.id, "calendar connected");
        Ok(professional)
    }

    /// Get a valid access token for the professional's calendar.
    ///
    /// Served from cache when fresh; otherwise derived from the stored
    /// refresh token. Failures come back pre-classified for the sync ledger.
    pub async fn get_access_token(&self, professional_id: &str) -> SyncResult<String> {
        if let Some(cached) = self.access_tokens.get(professional_id).await {
            return Ok(cached.token);
        }

        let professional = self
            .professionals
            .get_professional(professional_id)
            .await
            .map_err(|e| SyncFailure::Storage(e.to_string()))?;

        let refresh_token = professional.calendar_refresh_token.ok_or_else(|| {
            SyncFailure::CredentialMissing(format!(
                "professional {professional_id} has no calendar connected"
            ))
        })?;

        let tokens = self.oauth.refresh_access_token(&refresh_token).await.map_err(|e| {
            warn!(professional_id, error = %e, "access token refresh failed");
            match e {
                OAuthClientError::RequestFailed(inner) => {
                    SyncFailure::RemoteRequestFailed(inner.to_string())
                }
                other => SyncFailure::TokenExchangeFailed(other.to_string()),
            }
        })?;

        self.cache_access_token(professional_id, &tokens.access_token, tokens.expires_in).await;
        Ok(tokens.access_token)
    }

    /// Disconnect the professional's calendar: drop the stored refresh token
    /// and any cached access token.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, professional_id: &str, user_id: &str) -> Result<()> {
        self.owned_professional(professional_id, user_id).await?;
        self.professionals.clear_refresh_token(professional_id).await?;
        self.access_tokens.invalidate(professional_id).await;
        info!(professional_id, "calendar disconnected");
        Ok(())
    }

    async fn owned_professional(
        &self,
        professional_id: &str,
        user_id: &str,
    ) -> Result<Professional> {
        let professional = self.professionals.get_professional(professional_id).await?;
        if professional.user_id != user_id {
            return Err(ClinicSyncError::Forbidden(
                "professional belongs to a different user".into(),
            ));
        }
        Ok(professional)
    }

    async fn cache_access_token(&self, professional_id: &str, token: &str, expires_in: i64) {
        let usable = expires_in.max(0) as u64;
        let ttl = usable
            .saturating_sub(ACCESS_TOKEN_CACHE_SAFETY_SECS)
            .max(ACCESS_TOKEN_CACHE_MIN_TTL_SECS);
        self.access_tokens
            .insert(
                professional_id.to_string(),
                CachedAccessToken { token: token.to_string(), ttl: Duration::from_secs(ttl) },
            )
            .await;
    }
}

fn map_exchange_error(error: OAuthClientError) -> ClinicSyncError {
    match error {
        OAuthClientError::RequestFailed(inner) => ClinicSyncError::Network(inner.to_string()),
        OAuthClientError::NoRefreshToken => {
            ClinicSyncError::Auth("provider issued no refresh token".into())
        }
        other => ClinicSyncError::Auth(other.to_string()),
    }
}
