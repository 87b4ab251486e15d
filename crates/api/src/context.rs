//! Application context
//!
//! Builds the full dependency graph once at startup: configuration → pool →
//! repositories → services. Handlers receive it as shared axum state.

use std::sync::Arc;
use std::time::Duration;

use clinicsync_common::{OAuthClient, OAuthConfig, StateTokenService};
use clinicsync_core::{
    AppointmentRepository, BookingService, CalendarSyncPort, ProfessionalRepository,
    RetryCoordinator, SyncErrorRepository, SyncService,
};
use clinicsync_domain::constants::GOOGLE_CALENDAR_SCOPE;
use clinicsync_domain::{AppConfig, Result};
use clinicsync_infra::{
    CalendarOAuthManager, CalendarSyncAdapter, DbManager, GoogleCalendarClient,
    SqliteAppointmentRepository, SqliteProfessionalRepository, SqliteSyncErrorRepository,
};
use tracing::info;

/// Shared application state.
pub struct AppContext {
    pub config: AppConfig,
    pub db: Arc<DbManager>,
    pub booking: Arc<BookingService>,
    pub sync: Arc<SyncService>,
    pub retry: Arc<RetryCoordinator>,
    pub oauth: Arc<CalendarOAuthManager>,
    pub sync_errors: Arc<dyn SyncErrorRepository>,
}

impl AppContext {
    /// Wire the whole service graph from configuration.
    pub fn initialize(config: AppConfig) -> Result<Arc<Self>> {
        let db = Arc::new(DbManager::new(&config.database_path, config.database_pool_size)?);
        db.run_migrations()?;

        let appointments: Arc<dyn AppointmentRepository> =
            Arc::new(SqliteAppointmentRepository::new(Arc::clone(&db)));
        let professionals: Arc<dyn ProfessionalRepository> =
            Arc::new(SqliteProfessionalRepository::new(Arc::clone(&db)));
        let sync_errors: Arc<dyn SyncErrorRepository> =
            Arc::new(SqliteSyncErrorRepository::new(Arc::clone(&db)));

        let timeout = Duration::from_secs(config.http_timeout_secs);

        let mut oauth_config = OAuthConfig::new(
            config.oauth.client_id.clone(),
            config.oauth.client_secret.clone(),
            config.oauth.redirect_uri.clone(),
            config.oauth.authorization_endpoint.clone(),
            config.oauth.token_endpoint.clone(),
            vec![GOOGLE_CALENDAR_SCOPE.to_string()],
        );
        // Offline access is required for the refresh token; consent forces
        // Google to issue one even on re-authorization.
        oauth_config.add_authorize_param("access_type", "offline");
        oauth_config.add_authorize_param("prompt", "consent");

        let oauth = Arc::new(CalendarOAuthManager::new(
            Arc::clone(&professionals),
            OAuthClient::new(oauth_config, timeout),
            StateTokenService::new(config.state_signing_secret.as_str()),
        ));

        let calendar: Arc<dyn CalendarSyncPort> = Arc::new(CalendarSyncAdapter::new(
            Arc::clone(&appointments),
            Arc::clone(&professionals),
            Arc::clone(&oauth),
            GoogleCalendarClient::new(config.calendar_api_base.clone(), timeout),
            Arc::clone(&sync_errors),
        ));

        let booking =
            Arc::new(BookingService::new(Arc::clone(&appointments), Arc::clone(&professionals)));
        let sync = Arc::new(SyncService::new(
            Arc::clone(&calendar),
            Arc::clone(&sync_errors),
            Arc::clone(&appointments),
        ));
        let retry = Arc::new(RetryCoordinator::new(Arc::clone(&sync_errors), calendar));

        info!(db_path = %config.database_path, "application context initialised");

        Ok(Arc::new(Self { config, db, booking, sync, retry, oauth, sync_errors }))
    }
}
