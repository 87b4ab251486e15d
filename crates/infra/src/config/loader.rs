//! Configuration loader
//!
//! Loads application configuration from environment variables.
//!
//! ## Environment Variables
//! - `CLINICSYNC_DB_PATH`: Database file path
//! - `CLINICSYNC_DB_POOL_SIZE`: Connection pool size (default 4)
//! - `CLINICSYNC_BIND_ADDRESS`: HTTP bind address (default `127.0.0.1:8080`)
//! - `CLINICSYNC_OAUTH_CLIENT_ID`: OAuth client identifier
//! - `CLINICSYNC_OAUTH_CLIENT_SECRET`: OAuth client secret
//! - `CLINICSYNC_OAUTH_REDIRECT_URI`: Registered callback URI
//! - `CLINICSYNC_STATE_SIGNING_SECRET`: Secret for signing state tokens
//! - `CLINICSYNC_POST_AUTH_REDIRECT_URL`: Browser destination after callback
//! - `CLINICSYNC_CALENDAR_API_BASE`: Calendar API base URL (optional;
//!   defaults to the production Google endpoint, override for sandbox)
//! - `CLINICSYNC_HTTP_TIMEOUT_SECS`: Outbound HTTP timeout (optional)

use clinicsync_domain::constants::{GOOGLE_CALENDAR_API_BASE, HTTP_TIMEOUT_SECS};
use clinicsync_domain::{AppConfig, ClinicSyncError, OAuthSettings, Result};

/// Load configuration from environment variables.
///
/// # Errors
/// Returns `ClinicSyncError::Config` if a required variable is missing or
/// has an invalid value.
pub fn load_config() -> Result<AppConfig> {
    let database_path = env_var("CLINICSYNC_DB_PATH")?;
    let database_pool_size = env_parse("CLINICSYNC_DB_POOL_SIZE", 4)?;
    let bind_address = env_or("CLINICSYNC_BIND_ADDRESS", "127.0.0.1:8080");

    let oauth = OAuthSettings::google(
        env_var("CLINICSYNC_OAUTH_CLIENT_ID")?,
        env_var("CLINICSYNC_OAUTH_CLIENT_SECRET")?,
        env_var("CLINICSYNC_OAUTH_REDIRECT_URI")?,
    );

    let state_signing_secret = env_var("CLINICSYNC_STATE_SIGNING_SECRET")?;
    if state_signing_secret.len() < 32 {
        return Err(ClinicSyncError::Config(
            "CLINICSYNC_STATE_SIGNING_SECRET must be at least 32 bytes".into(),
        ));
    }

    let config = AppConfig {
        database_path,
        database_pool_size,
        bind_address,
        oauth,
        state_signing_secret,
        post_auth_redirect_url: env_or(
            "CLINICSYNC_POST_AUTH_REDIRECT_URL",
            "http://localhost:3000/settings",
        ),
        calendar_api_base: env_or("CLINICSYNC_CALENDAR_API_BASE", GOOGLE_CALENDAR_API_BASE),
        http_timeout_secs: env_parse("CLINICSYNC_HTTP_TIMEOUT_SECS", HTTP_TIMEOUT_SECS)?,
    };

    tracing::info!(
        db_path = %config.database_path,
        bind = %config.bind_address,
        calendar_api = %config.calendar_api_base,
        "configuration loaded from environment"
    );

    Ok(config)
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        ClinicSyncError::Config(format!("missing required environment variable {name}"))
    })
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| ClinicSyncError::Config(format!("invalid value for {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
