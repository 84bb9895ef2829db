//! Streaming capture: `GET /a/ws`.
//!
//! The upgraded socket is adapted to a [`FrameSource`] and handed to the
//! capture crate's session runner, which owns the connect/disconnect
//! bracketing. No frames are ever sent back to the client.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::ORIGIN;
use axum::response::Response;
use axum::{Extension, Router, routing::get};
use tracing::instrument;

use footfall_capture::application::session_handlers::{FrameSource, Inbound, run_session};
use footfall_core::identity::Identity;

use super::{PageQuery, capture_context};
use crate::error::ApiError;
use crate::middleware::remote_addr::RemoteAddr;
use crate::state::AppState;

/// Adapts an axum WebSocket to the session runner, skipping control frames.
struct SocketFrames(WebSocket);

#[async_trait]
impl FrameSource for SocketFrames {
    async fn next_inbound(&mut self) -> Inbound {
        loop {
            match self.0.recv().await {
                Some(Ok(Message::Text(text))) => {
                    return Inbound::Payload(text.as_str().as_bytes().to_vec());
                }
                Some(Ok(Message::Binary(bytes))) => return Inbound::Payload(bytes.to_vec()),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | None => return Inbound::Closed,
                Some(Err(err)) => return Inbound::Failed(err.to_string()),
            }
        }
    }
}

/// GET /a/ws
#[instrument(skip_all, fields(identity = %identity))]
async fn stream_events(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(remote): Extension<RemoteAddr>,
    query: PageQuery,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
    if !state.settings.origin_allowed(origin) {
        let origin = origin.unwrap_or_default().to_owned();
        tracing::warn!(origin = %origin, "websocket origin rejected");
        return Err(ApiError::OriginRejected(origin));
    }

    let upgrade = upgrade.inspect_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "websocket upgrade refused");
    })?;

    let context = capture_context(identity, remote, &query, &headers);
    let clock = Arc::clone(&state.clock);
    let store = Arc::clone(&state.event_store);

    Ok(upgrade
        .on_failed_upgrade(|err| tracing::warn!(error = %err, "websocket upgrade failed"))
        .on_upgrade(move |socket| async move {
            run_session(
                context,
                SocketFrames(socket),
                clock.as_ref(),
                store.as_ref(),
            )
            .await;
        }))
}

/// Returns the router for streaming capture.
pub fn router() -> Router<AppState> {
    Router::new().route("/a/ws", get(stream_events))
}
