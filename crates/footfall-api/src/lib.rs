//! Footfall API — the HTTP and WebSocket surface of the analytics collector.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::logging::{LogResponse, RequestSpan};
use crate::state::AppState;

/// Builds the full application: routes wrapped in the middleware chain.
///
/// Layers listed last run first, so a request passes remote-address
/// resolution, then logging, then panic recovery, then identity resolution
/// before reaching a route. Identity is re-asserted outside panic recovery
/// too, so a recovered 500 still carries the visitor's cookie and `ETag`.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::events::router())
        .merge(routes::stream::router())
        .merge(routes::script::router())
        .fallback(routes::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::identity::resolve_identity,
        ))
        .layer(CatchPanicLayer::custom(middleware::recovery::handle_panic))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::identity::reassert_after_fault,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(RequestSpan)
                .on_response(LogResponse),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::remote_addr::resolve_remote_addr,
        ))
        .with_state(state)
}
