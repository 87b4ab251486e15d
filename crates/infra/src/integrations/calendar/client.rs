//! Google Calendar events API client
//!
//! Thin HTTP wrapper over the `calendars/primary/events` resource. Every
//! outcome is classified into a [`SyncFailure`] so the layers above never
//! inspect status codes themselves.

use std::time::Duration;

use clinicsync_core::{SyncFailure, SyncResult};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use tracing::{debug, instrument};

use super::types::{EventPayload, RawEventResponse};

/// Client for the Google Calendar v3 events API.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http: Client,
    api_base: String,
}

impl GoogleCalendarClient {
    /// Create a client against the given API base (production or sandbox).
    #[must_use]
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new());
        Self { http, api_base: api_base.into() }
    }

    /// Insert an event on the primary calendar; returns the provider event id.
    #[instrument(skip(self, access_token, payload))]
    pub async fn insert_event(
        &self,
        access_token: &str,
        payload: &EventPayload,
    ) -> SyncResult<String> {
        let url = format!("{}/calendars/primary/events", self.api_base);
        let response = self
            .send(self.http.request(Method::POST, &url).json(payload), access_token)
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, &body_text(response).await));
        }

        let event: RawEventResponse = response
            .json()
            .await
            .map_err(|e| SyncFailure::RemoteRejected(format!("malformed event response: {e}")))?;
        event.id.ok_or_else(|| {
            SyncFailure::RemoteRejected("event response carried no id".to_string())
        })
    }

    /// Patch an existing event with the current appointment fields.
    #[instrument(skip(self, access_token, payload))]
    pub async fn patch_event(
        &self,
        access_token: &str,
        event_id: &str,
        payload: &EventPayload,
    ) -> SyncResult<()> {
        let url = format!("{}/calendars/primary/events/{event_id}", self.api_base);
        let response = self
            .send(self.http.request(Method::PATCH, &url).json(payload), access_token)
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, &body_text(response).await));
        }
        Ok(())
    }

    /// Delete an event. A 404 or 410 means the event is already gone, which
    /// is the desired end state, so it is not an error.
    #[instrument(skip(self, access_token))]
    pub async fn delete_event(&self, access_token: &str, event_id: &str) -> SyncResult<()> {
        let url = format!("{}/calendars/primary/events/{event_id}", self.api_base);
        let response =
            self.send(self.http.request(Method::DELETE, &url), access_token).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            debug!(event_id, "remote event already absent");
            return Ok(());
        }
        if !status.is_success() {
            return Err(classify_status(status, &body_text(response).await));
        }
        Ok(())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        access_token: &str,
    ) -> SyncResult<reqwest::Response> {
        request
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| SyncFailure::RemoteRequestFailed(e.to_string()))
    }
}

async fn body_text(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}

/// Map a non-success status to the failure taxonomy: auth statuses point at
/// the credential, other 4xx at the request, 5xx at the provider.
fn classify_status(status: StatusCode, body: &str) -> SyncFailure {
    let detail = if body.is_empty() {
        format!("calendar API returned {status}")
    } else {
        format!("calendar API returned {status}: {body}")
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SyncFailure::TokenExchangeFailed(detail)
        }
        s if s.is_client_error() => SyncFailure::RemoteRejected(detail),
        _ => SyncFailure::RemoteRequestFailed(detail),
    }
}
