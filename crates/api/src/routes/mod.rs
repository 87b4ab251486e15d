//! HTTP routing

pub mod appointments;
pub mod calendar;
pub mod sync_errors;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::context::AppContext;
use crate::error::ApiError;

/// Build the application router.
pub fn router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/appointments", post(appointments::create))
        .route("/appointments/{id}/reschedule", post(appointments::reschedule))
        .route("/appointments/{id}/cancel", post(appointments::cancel))
        .route("/calendar/connect", post(calendar::connect))
        .route("/calendar/callback", get(calendar::callback))
        .route("/calendar/disconnect", post(calendar::disconnect))
        .route("/calendar/sync", post(calendar::sync))
        .route("/sync-errors", get(sync_errors::list))
        .route("/sync-errors/{id}/resolve", post(sync_errors::resolve))
        .route("/sync-errors/{id}/retry", post(sync_errors::retry))
        .with_state(context)
}

async fn health(
    State(context): State<Arc<AppContext>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    context.db.health_check()?;
    Ok(Json(json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use clinicsync_domain::{AppConfig, OAuthSettings};
    use rusqlite::params;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    struct TestApp {
        router: Router,
        _dir: TempDir,
    }

    fn test_app(calendar_api_base: &str, token_endpoint: &str) -> TestApp {
        let dir = TempDir::new().expect("temp dir created");
        let db_path = dir.path().join("api.db");

        let mut oauth = OAuthSettings::google(
            "client-id",
            "client-secret",
            "http://localhost:8080/calendar/callback",
        );
        oauth.token_endpoint = token_endpoint.to_string();

        let config = AppConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            database_pool_size: 4,
            bind_address: "127.0.0.1:0".to_string(),
            oauth,
            state_signing_secret: "0123456789abcdef0123456789abcdef".to_string(),
            post_auth_redirect_url: "http://localhost:3000/settings".to_string(),
            calendar_api_base: calendar_api_base.to_string(),
            http_timeout_secs: 5,
        };

        let context = AppContext::initialize(config).expect("context initialised");
        seed_professional(&context);
        TestApp { router: router(context), _dir: dir }
    }

    fn seed_professional(context: &Arc<AppContext>) {
        let conn = context.db.get_connection().expect("connection");
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO professionals (id, user_id, display_name, time_zone, active,
                                        created_at, updated_at)
             VALUES ('prof-1', 'user-1', 'Dr. Example', 'America/Sao_Paulo', 1, ?1, ?1)",
            params![now],
        )
        .expect("professional seeded");
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request built")
    }

    fn post_json_as(user_id: &str, uri: &str, body: Value) -> Request<Body> {
        let mut request = post_json(uri, body);
        request.headers_mut().insert("x-user-id", user_id.parse().expect("header"));
        request
    }

    fn get_as(user_id: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-user-id", user_id)
            .body(Body::empty())
            .expect("request built")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.expect("body read");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn booking_body(start: &str, end: &str) -> Value {
        json!({
            "professional_id": "prof-1",
            "patient_id": "patient-1",
            "patient_name": "Ana Souza",
            "service_type": "Consulta",
            "start_time": start,
            "end_time": end,
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn booking_conflicts_surface_as_409_naming_the_range() {
        let app = test_app("http://127.0.0.1:1", "http://127.0.0.1:1/token");

        let created = app
            .router
            .clone()
            .oneshot(post_json(
                "/appointments",
                booking_body("2026-03-10T10:00:00Z", "2026-03-10T11:00:00Z"),
            ))
            .await
            .expect("request handled");
        assert_eq!(created.status(), StatusCode::CREATED);

        let conflict = app
            .router
            .clone()
            .oneshot(post_json(
                "/appointments",
                booking_body("2026-03-10T10:30:00Z", "2026-03-10T11:30:00Z"),
            ))
            .await
            .expect("request handled");
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        let body = body_json(conflict).await;
        let message = body["error"].as_str().expect("error message");
        assert!(message.contains("2026-03-10T10:00:00"), "names the conflicting range");

        let adjacent = app
            .router
            .clone()
            .oneshot(post_json(
                "/appointments",
                booking_body("2026-03-10T11:00:00Z", "2026-03-10T12:00:00Z"),
            ))
            .await
            .expect("request handled");
        assert_eq!(adjacent.status(), StatusCode::CREATED);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn inverted_interval_is_a_bad_request() {
        let app = test_app("http://127.0.0.1:1", "http://127.0.0.1:1/token");

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/appointments",
                booking_body("2026-03-10T11:00:00Z", "2026-03-10T10:00:00Z"),
            ))
            .await
            .expect("request handled");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connect_requires_caller_identity_and_ownership() {
        let app = test_app("http://127.0.0.1:1", "http://127.0.0.1:1/token");

        let anonymous = app
            .router
            .clone()
            .oneshot(post_json("/calendar/connect", json!({"professional_id": "prof-1"})))
            .await
            .expect("request handled");
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let intruder = app
            .router
            .clone()
            .oneshot(post_json_as(
                "intruder",
                "/calendar/connect",
                json!({"professional_id": "prof-1"}),
            ))
            .await
            .expect("request handled");
        assert_eq!(intruder.status(), StatusCode::FORBIDDEN);

        let owner = app
            .router
            .clone()
            .oneshot(post_json_as(
                "user-1",
                "/calendar/connect",
                json!({"professional_id": "prof-1"}),
            ))
            .await
            .expect("request handled");
        assert_eq!(owner.status(), StatusCode::OK);
        let body = body_json(owner).await;
        assert!(body["authorization_url"].as_str().expect("url").contains("state="));
        assert!(!body["state"].as_str().expect("state").is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn callback_failures_redirect_with_coarse_reason() {
        let app = test_app("http://127.0.0.1:1", "http://127.0.0.1:1/token");

        let missing = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/calendar/callback")
                    .body(Body::empty())
                    .expect("request built"),
            )
            .await
            .expect("request handled");
        assert_eq!(missing.status(), StatusCode::FOUND);
        let location = missing.headers()[header::LOCATION].to_str().expect("location");
        assert!(location.ends_with("?calendar=error&reason=missing_parameters"));

        let tampered = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/calendar/callback?code=abc&state=not-a-real-token")
                    .body(Body::empty())
                    .expect("request built"),
            )
            .await
            .expect("request handled");
        assert_eq!(tampered.status(), StatusCode::FOUND);
        let location = tampered.headers()[header::LOCATION].to_str().expect("location");
        assert!(location.contains("calendar=error"));
        assert!(location.contains("reason=invalid_state"));
        assert!(!location.contains("not-a-real-token"), "state never echoed back");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_trigger_records_failure_and_exposes_it_in_the_ledger() {
        let app = test_app("http://127.0.0.1:1", "http://127.0.0.1:1/token");

        let created = app
            .router
            .clone()
            .oneshot(post_json(
                "/appointments",
                booking_body("2026-03-10T14:00:00Z", "2026-03-10T15:00:00Z"),
            ))
            .await
            .expect("request handled");
        let appointment = body_json(created).await;
        let appointment_id = appointment["id"].as_str().expect("id").to_string();

        // No refresh token stored, so the synchronous trigger fails and the
        // failure lands in the ledger.
        let failed = app
            .router
            .clone()
            .oneshot(post_json_as(
                "operator-1",
                "/calendar/sync",
                json!({"action": "create", "appointment_id": appointment_id}),
            ))
            .await
            .expect("request handled");
        assert_eq!(failed.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(failed).await;
        assert_eq!(body["status"], "failed");
        let error_id = body["error_id"].as_str().expect("error id").to_string();

        let listed = app
            .router
            .clone()
            .oneshot(get_as("operator-1", &format!("/sync-errors?appointment_id={appointment_id}")))
            .await
            .expect("request handled");
        assert_eq!(listed.status(), StatusCode::OK);
        let entries = body_json(listed).await;
        assert!(entries
            .as_array()
            .expect("array")
            .iter()
            .any(|e| e["id"] == error_id.as_str()));

        let resolved = app
            .router
            .clone()
            .oneshot(post_json_as(
                "operator-1",
                &format!("/sync-errors/{error_id}/resolve"),
                json!({}),
            ))
            .await
            .expect("request handled");
        assert_eq!(resolved.status(), StatusCode::NO_CONTENT);

        let after = app
            .router
            .clone()
            .oneshot(get_as("operator-1", &format!("/sync-errors?appointment_id={appointment_id}")))
            .await
            .expect("request handled");
        let entries = body_json(after).await;
        assert!(entries
            .as_array()
            .expect("array")
            .iter()
            .all(|e| e["id"] != error_id.as_str()));

        // Resolved entries refuse further retries without attempting.
        let retried = app
            .router
            .clone()
            .oneshot(post_json_as(
                "operator-1",
                &format!("/sync-errors/{error_id}/retry"),
                json!({}),
            ))
            .await
            .expect("request handled");
        assert_eq!(retried.status(), StatusCode::OK);
        let outcome = body_json(retried).await;
        assert_eq!(outcome["outcome"], "succeeded");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn full_connect_callback_and_sync_flow() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "refresh_token": "1//refresh",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "evt-1"})))
            .mount(&server)
            .await;

        let app = test_app(&server.uri(), &format!("{}/token", server.uri()));

        let connected = app
            .router
            .clone()
            .oneshot(post_json_as(
                "user-1",
                "/calendar/connect",
                json!({"professional_id": "prof-1"}),
            ))
            .await
            .expect("request handled");
        assert_eq!(connected.status(), StatusCode::OK);
        let state = body_json(connected).await["state"]
            .as_str()
            .expect("state")
            .to_string();

        let callback = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/calendar/callback?code=auth-code&state={state}"))
                    .body(Body::empty())
                    .expect("request built"),
            )
            .await
            .expect("request handled");
        assert_eq!(callback.status(), StatusCode::FOUND);
        let location = callback.headers()[header::LOCATION].to_str().expect("location");
        assert!(location.ends_with("?calendar=connected"));

        let created = app
            .router
            .clone()
            .oneshot(post_json(
                "/appointments",
                booking_body("2026-03-10T09:00:00Z", "2026-03-10T10:00:00Z"),
            ))
            .await
            .expect("request handled");
        assert_eq!(created.status(), StatusCode::CREATED);
        let appointment_id =
            body_json(created).await["id"].as_str().expect("id").to_string();

        // The post-booking background sync may have created the event
        // already; the trigger then short-circuits on the stored id.
        let synced = app
            .router
            .clone()
            .oneshot(post_json_as(
                "operator-1",
                "/calendar/sync",
                json!({"action": "create", "appointment_id": appointment_id}),
            ))
            .await
            .expect("request handled");
        assert_eq!(synced.status(), StatusCode::OK);
        assert_eq!(body_json(synced).await["status"], "completed");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn operator_endpoints_require_caller_identity() {
        let app = test_app("http://127.0.0.1:1", "http://127.0.0.1:1/token");

        let sync = app
            .router
            .clone()
            .oneshot(post_json(
                "/calendar/sync",
                json!({"action": "create", "appointment_id": "appt-1"}),
            ))
            .await
            .expect("request handled");
        assert_eq!(sync.status(), StatusCode::UNAUTHORIZED);

        let list = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/sync-errors")
                    .body(Body::empty())
                    .expect("request built"),
            )
            .await
            .expect("request handled");
        assert_eq!(list.status(), StatusCode::UNAUTHORIZED);

        let resolve = app
            .router
            .clone()
            .oneshot(post_json("/sync-errors/err-1/resolve", json!({})))
            .await
            .expect("request handled");
        assert_eq!(resolve.status(), StatusCode::UNAUTHORIZED);

        let retry = app
            .router
            .clone()
            .oneshot(post_json("/sync-errors/err-1/retry", json!({})))
            .await
            .expect("request handled");
        assert_eq!(retry.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn health_reports_ok() {
        let app = test_app("http://127.0.0.1:1", "http://127.0.0.1:1/token");

        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("request handled");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
