//! One-shot HTTP capture: `POST /a/ev`.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Router, routing::post};
use tracing::instrument;

use footfall_capture::application::capture_handlers;
use footfall_capture::domain::payload::CapturePayload;
use footfall_core::identity::Identity;

use super::{PageQuery, capture_context};
use crate::error::ApiError;
use crate::middleware::remote_addr::RemoteAddr;
use crate::state::AppState;

/// POST /a/ev
///
/// The body is decoded from raw bytes whatever its `Content-Type`, since the
/// browser client posts `text/plain`. A storage failure is logged and the
/// client still gets `200`.
#[instrument(skip_all, fields(identity = %identity))]
async fn capture_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(remote): Extension<RemoteAddr>,
    query: PageQuery,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, ApiError> {
    let body = body.inspect_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "rejecting unreadable capture body");
    })?;
    let payload = CapturePayload::decode(&body).inspect_err(|err| {
        tracing::warn!(error = %err, "rejecting malformed capture payload");
    })?;

    let context = capture_context(identity, remote, &query, &headers);
    if let Err(err) = capture_handlers::handle_capture(
        &context,
        payload,
        state.clock.as_ref(),
        state.event_store.as_ref(),
    )
    .await
    {
        tracing::error!(error = %err, "failed to store captured event");
    }

    Ok(StatusCode::OK)
}

/// Returns the router for HTTP capture.
pub fn router() -> Router<AppState> {
    Router::new().route("/a/ev", post(capture_event))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use footfall_core::store::EventStore;
    use footfall_test_support::{
        FailingEventStore, FixedClock, FixedIdentitySource, RecordingEventStore,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::state::CaptureSettings;

    fn app_state_with(event_store: Arc<dyn EventStore>) -> AppState {
        AppState::new(
            Arc::new(FixedClock::default()),
            Arc::new(FixedIdentitySource::new("minted")),
            event_store,
            CaptureSettings::default(),
        )
    }

    fn capture_request(uri: &str, body: &'static str) -> Request<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "text/plain;charset=UTF-8")
            .header("referer", "https://example.com/from-referer")
            .header("user-agent", "test-agent/1.0")
            .body(Body::from(body))
            .unwrap();
        request
            .extensions_mut()
            .insert(Identity::new("visitor-1").unwrap());
        request
            .extensions_mut()
            .insert(RemoteAddr("203.0.113.7".into()));
        request
    }

    #[tokio::test]
    async fn test_capture_returns_200_with_empty_body_and_stores_event() {
        // Arrange
        let store = Arc::new(RecordingEventStore::new());
        let app = router().with_state(app_state_with(store.clone()));

        // Act
        let response = app
            .oneshot(capture_request(
                "/a/ev",
                r#"{"action":"click","vars":{"button":"buy"}}"#,
            ))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());

        let events = store.events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.identity.as_str(), "visitor-1");
        assert_eq!(event.remote, "203.0.113.7");
        assert_eq!(event.url, "https://example.com/from-referer");
        assert_eq!(event.action, "click");
        assert_eq!(event.vars["button"], "buy");
        assert_eq!(event.vars["user_agent"], "test-agent/1.0");
    }

    #[tokio::test]
    async fn test_url_query_overrides_referer() {
        let store = Arc::new(RecordingEventStore::new());
        let app = router().with_state(app_state_with(store.clone()));

        let response = app
            .oneshot(capture_request(
                "/a/ev?url=https%3A%2F%2Fexample.com%2Fpricing&referer=",
                r#"{"action":"view"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.events()[0].url, "https://example.com/pricing");
    }

    #[tokio::test]
    async fn test_malformed_body_returns_400_and_stores_nothing() {
        let store = Arc::new(RecordingEventStore::new());
        let app = router().with_state(app_state_with(store.clone()));

        let response = app
            .oneshot(capture_request("/a/ev", "{\"action\": oops"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "malformed_payload");
        assert!(store.events().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_url_param_keeps_first_and_still_captures() {
        let store = Arc::new(RecordingEventStore::new());
        let app = router().with_state(app_state_with(store.clone()));

        let response = app
            .oneshot(capture_request(
                "/a/ev?url=https%3A%2F%2Fa%2F&url=https%3A%2F%2Fb%2F",
                r#"{"action":"view"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.events()[0].url, "https://a/");
    }

    #[tokio::test]
    async fn test_oversized_body_is_a_json_error() {
        let store = Arc::new(RecordingEventStore::new());
        let app = router().with_state(app_state_with(store.clone()));
        let mut request = capture_request("/a/ev", "");
        *request.body_mut() = Body::from(vec![b' '; 3 * 1024 * 1024]);

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "unreadable_body");
        assert!(store.events().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_surfaced() {
        let app = router().with_state(app_state_with(Arc::new(FailingEventStore)));

        let response = app
            .oneshot(capture_request("/a/ev", r#"{"action":"view"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
