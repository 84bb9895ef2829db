//! Request/response logging hooks for `tower_http::trace::TraceLayer`.

use std::time::Duration;

use axum::http::{Request, Response};
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::Span;

use super::remote_addr::RemoteAddr;

/// Opens one span per request carrying method, path and resolved client
/// address.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let remote = request
            .extensions()
            .get::<RemoteAddr>()
            .map_or("unknown", |r| r.0.as_str());
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            remote = %remote,
        )
    }
}

/// Logs status and elapsed time once the response is produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogResponse;

impl<B> OnResponse<B> for LogResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = latency.as_secs_f64() * 1000.0,
            "request completed"
        );
    }
}
