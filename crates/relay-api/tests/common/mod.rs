//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::TimeDelta;
use http_body_util::BodyExt;
use relay_api::routes;
use relay_api::state::AppState;
use relay_game::application::service::{RelayPorts, RelayService, RelaySettings};
use relay_test_support::{
    FixedClock, InMemoryLedgerStore, MockRng, RecordingNotifier, RecordingResultsSink,
};
use tower::ServiceExt;

/// Admin token configured by [`build_test_app`].
pub const ADMIN_TOKEN: &str = "let-me-in";

/// Router plus the in-memory collaborators behind it.
pub struct TestApp {
    pub router: Router,
    pub ledger: Arc<InMemoryLedgerStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub results: Arc<RecordingResultsSink>,
}

fn build(admin_token: Option<&str>) -> TestApp {
    let ledger = Arc::new(InMemoryLedgerStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let results = Arc::new(RecordingResultsSink::new());
    let clock = FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    );
    let relay = RelayService::new(
        RelaySettings {
            deadline_duration: TimeDelta::hours(12),
            results_destination: Some("results".to_owned()),
            delivery_timeout: Duration::from_millis(200),
        },
        RelayPorts {
            ledger: ledger.clone(),
            notifier: notifier.clone(),
            results: results.clone(),
            clock: Arc::new(clock),
            rng: Box::new(MockRng),
        },
    )
    .unwrap();
    let state = AppState::new(Arc::new(relay), admin_token.map(str::to_owned));

    TestApp {
        router: routes::app(state),
        ledger,
        notifier,
        results,
    }
}

/// Builds the full app with deterministic collaborators and admin routes
/// guarded by [`ADMIN_TOKEN`].
pub fn build_test_app() -> TestApp {
    build(Some(ADMIN_TOKEN))
}

/// Builds the full app with no admin token configured.
pub fn build_unconfigured_app() -> TestApp {
    build(None)
}

/// Sends `request` and decodes the JSON response body.
pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("x-admin-token", token);
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &TestApp,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, json_request("POST", uri, None, body)).await
}

/// Send an admin request with an optional token.
pub async fn admin_json(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, json_request(method, uri, token, body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &TestApp, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Registers `ids` as `player-<id>`.
pub async fn register_all(app: &TestApp, ids: &[u64]) {
    for id in ids {
        let (status, _) = post_json(
            app,
            "/api/v1/relay/register",
            &serde_json::json!({ "participant_id": id, "display_name": format!("player-{id}") }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

/// Submits clip `n` as `sender`.
pub async fn submit(app: &TestApp, sender: u64, n: u32) -> (StatusCode, serde_json::Value) {
    post_json(
        app,
        "/api/v1/relay/submit",
        &serde_json::json!({
            "participant_id": sender,
            "artifact_ref": format!("https://clips/{n}"),
            "artist": "Artist X",
            "title": format!("Title {n}"),
        }),
    )
    .await
}
