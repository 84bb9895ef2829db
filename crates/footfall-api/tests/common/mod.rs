//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use footfall_core::store::EventStore;
use footfall_test_support::{FixedClock, FixedIdentitySource, RecordingEventStore};
use http_body_util::BodyExt;
use tower::ServiceExt;

use footfall_api::build_app;
use footfall_api::state::{AppState, CaptureSettings};

/// Identity minted for visitors that present none.
pub const MINTED_IDENTITY: &str = "minted-visitor-token";

/// Socket peer address attached to every test request.
pub const PEER: &str = "192.0.2.10:40000";

/// Build the full app (middleware chain included) over `event_store`, with a
/// fixed clock and identity source.
pub fn build_test_app_with(event_store: Arc<dyn EventStore>) -> Router {
    build_test_app_with_settings(event_store, CaptureSettings::default())
}

/// Like [`build_test_app_with`] with explicit capture settings.
pub fn build_test_app_with_settings(
    event_store: Arc<dyn EventStore>,
    settings: CaptureSettings,
) -> Router {
    let app_state = AppState::new(
        Arc::new(FixedClock::default()),
        Arc::new(FixedIdentitySource::new(MINTED_IDENTITY)),
        event_store,
        settings,
    );
    build_app(app_state)
}

/// Build the full app over a fresh recording store, returning both.
pub fn build_test_app() -> (Router, Arc<RecordingEventStore>) {
    let store = Arc::new(RecordingEventStore::new());
    (build_test_app_with(store.clone()), store)
}

/// Serve `app` on an ephemeral loopback port, as `main` does, and return the
/// bound address.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Attach the socket peer that `into_make_service_with_connect_info` would.
pub fn with_peer(mut request: Request<Body>) -> Request<Body> {
    let peer: SocketAddr = PEER.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

/// Send a request and return status, headers and raw body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.oneshot(with_peer(request)).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body.to_vec())
}

/// POST a raw capture body to `/a/ev`.
pub fn capture_request(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/plain;charset=UTF-8")
        .header("referer", "https://example.com/landing")
        .header("user-agent", "integration-test/1.0")
        .body(body.into())
        .unwrap()
}

/// GET `uri` with extra headers.
pub fn get_request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

/// The identity a response asserted, checking cookie and `ETag` agree.
pub fn asserted_identity(headers: &HeaderMap) -> String {
    let etag = headers["etag"].to_str().unwrap().to_string();
    let cookie = headers["set-cookie"].to_str().unwrap();
    let expected_prefix = format!("t={etag}; Expires=");
    assert!(
        cookie.starts_with(&expected_prefix),
        "cookie {cookie:?} does not match etag {etag:?}"
    );
    etag
}
