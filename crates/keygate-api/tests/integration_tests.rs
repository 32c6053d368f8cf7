//! # Integration Tests for keygate-api
//!
//! Drives the full router with `tower::ServiceExt::oneshot`: public and
//! health routes, authentication failures, the fixed-window limit, store
//! failure modes, and IP throttling of exempt routes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, Response, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use keygate_api::config::Settings;
use keygate_api::state::AppState;
use keygate_core::{FailureMode, PrincipalRecord, StoreError, WindowHit, WindowPolicy};
use keygate_store::{CounterStore, MemoryCounterStore, MemoryIdentityStore};

const TOKEN_HEADER: &str = r#"Token token="abc123""#;
const RATE_LIMITED_BODY: &str =
    r#"{"message":"You have fired too many requests. Please wait for some time."}"#;

fn settings() -> Settings {
    Settings {
        principals: vec![PrincipalRecord::new(1, "abc123")],
        ..Settings::default()
    }
}

/// App plus a handle on its counter store.
fn test_app_with(settings: Settings) -> (axum::Router, Arc<MemoryCounterStore>) {
    let identities = Arc::new(MemoryIdentityStore::new(settings.principals.clone()));
    let counters = Arc::new(MemoryCounterStore::new());
    let state = AppState::new(settings, identities, counters.clone()).unwrap();
    (keygate_api::app(state), counters)
}

fn test_app() -> axum::Router {
    keygate_api::app(AppState::in_memory(settings()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_token(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, TOKEN_HEADER)
        .body(Body::empty())
        .unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// -- Public and health routes -------------------------------------------------

#[tokio::test]
async fn home_is_public() {
    let response = test_app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        r#"{"message":"Welcome to ML API. Please contact admin to use our system."}"#
    );
}

#[tokio::test]
async fn liveness_probe() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn readiness_probe() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn metrics_without_recorder_is_not_found() {
    let response = test_app().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Authentication -------------------------------------------------------------

#[tokio::test]
async fn missing_authorization_is_unauthorized() {
    let response = test_app().oneshot(get("/v1/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::WWW_AUTHENTICATE],
        r#"Token realm="Application""#
    );
    assert_eq!(body_string(response).await, r#"{"message":"Bad credentials"}"#);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let request = Request::builder()
        .uri("/v1/products")
        .header(header::AUTHORIZATION, r#"Token token="nope""#)
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, r#"{"message":"Bad credentials"}"#);
}

#[tokio::test]
async fn basic_scheme_is_unauthorized() {
    let request = Request::builder()
        .uri("/v1/users")
        .header(header::AUTHORIZATION, "Basic YWJjMTIzOg==")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn configured_realm_is_advertised() {
    let mut settings = settings();
    settings.auth.realm = "Keygate".into();
    let (app, _) = test_app_with(settings);
    let response = app.oneshot(get("/v1/users")).await.unwrap();
    assert_eq!(
        response.headers()[header::WWW_AUTHENTICATE],
        r#"Token realm="Keygate""#
    );
}

#[tokio::test]
async fn every_resource_route_admits_a_valid_token() {
    let app = test_app();
    for uri in keygate_api::routes::resources::PATHS {
        let response = app.clone().oneshot(get_with_token(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(body_string(response).await, "[]");
    }
}

#[tokio::test]
async fn bearer_scheme_is_accepted() {
    let request = Request::builder()
        .uri("/v1/users")
        .header(header::AUTHORIZATION, "Bearer abc123")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_path_is_authenticated_before_404() {
    let app = test_app();

    let anonymous = app.clone().oneshot(get("/v1/nothing")).await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let authenticated = app.oneshot(get_with_token("/v1/nothing")).await.unwrap();
    assert_eq!(authenticated.status(), StatusCode::NOT_FOUND);
    assert!(body_string(authenticated).await.contains("/v1/nothing"));
}

// -- Rate limiting --------------------------------------------------------------

#[tokio::test]
async fn request_at_fifty_nine_passes_and_next_is_rejected() {
    let (app, counters) = test_app_with(settings());
    counters
        .set_with_expiry("token:abc123", 59, Duration::from_secs(900))
        .await
        .unwrap();

    let allowed = app.clone().oneshot(get_with_token("/v1/users")).await.unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(counters.get("token:abc123").await.unwrap(), Some(60));

    let rejected = app.oneshot(get_with_token("/v1/users")).await.unwrap();
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(rejected.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(body_string(rejected).await, RATE_LIMITED_BODY);
}

#[tokio::test]
async fn first_request_of_window_is_free() {
    let mut settings = settings();
    settings.throttle.max_requests = 2;
    let (app, _) = test_app_with(settings);

    for n in 1..=3 {
        let response = app.clone().oneshot(get_with_token("/v1/users")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {n}");
    }
    let response = app.oneshot(get_with_token("/v1/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn unauthenticated_requests_are_not_counted() {
    let (app, counters) = test_app_with(settings());
    for _ in 0..5 {
        app.clone().oneshot(get("/v1/users")).await.unwrap();
    }
    assert!(counters.is_empty());
}

#[tokio::test]
async fn home_is_not_throttled_by_default() {
    let (app, counters) = test_app_with(settings());
    let request = Request::builder()
        .uri("/")
        .extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 40000))))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap();
    assert!(counters.is_empty());
}

#[tokio::test]
async fn home_is_throttled_by_ip_when_enabled() {
    let mut settings = settings();
    settings.throttle.throttle_anonymous_by_ip = true;
    settings.throttle.max_requests = 1;
    let (app, counters) = test_app_with(settings);

    let from_peer = || {
        Request::builder()
            .uri("/")
            .extension(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 40000))))
            .body(Body::empty())
            .unwrap()
    };
    for _ in 0..2 {
        let response = app.clone().oneshot(from_peer()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(counters.get("ip:10.0.0.7").await.unwrap(), Some(1));

    let response = app.oneshot(from_peer()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

// -- Store failures -------------------------------------------------------------

#[derive(Debug)]
struct DownCounters;

#[async_trait]
impl CounterStore for DownCounters {
    async fn get(&self, _: &str) -> Result<Option<u64>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set_with_expiry(&self, _: &str, _: u64, _: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn increment(&self, _: &str) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn time_to_live(&self, _: &str) -> Result<Option<Duration>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn hit(&self, _: &str, _: &WindowPolicy) -> Result<WindowHit, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn backend(&self) -> &'static str {
        "down"
    }
}

fn app_over_down_counters(failure_mode: FailureMode) -> axum::Router {
    let mut settings = settings();
    settings.throttle.failure_mode = failure_mode;
    let identities = Arc::new(MemoryIdentityStore::new(settings.principals.clone()));
    let state = AppState::new(settings, identities, Arc::new(DownCounters)).unwrap();
    keygate_api::app(state)
}

#[tokio::test]
async fn counter_store_down_fails_closed_by_default() {
    let app = app_over_down_counters(FailureMode::Closed);
    let response = app.oneshot(get_with_token("/v1/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_string(response).await,
        r#"{"message":"Service temporarily unavailable"}"#
    );
}

#[tokio::test]
async fn counter_store_down_fails_open_when_configured() {
    let app = app_over_down_counters(FailureMode::Open);
    let response = app.oneshot(get_with_token("/v1/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_fails_when_counter_store_is_down() {
    let app = app_over_down_counters(FailureMode::Closed);
    let response = app.oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
