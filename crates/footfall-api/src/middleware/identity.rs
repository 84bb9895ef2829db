//! Identity middleware: resolves the visitor identity once per request,
//! hands it to handlers as a typed extension, and re-asserts it on the
//! response as both the `t` cookie and the `ETag` header.
//!
//! A response built by the panic recovery layer never passes back through
//! [`resolve_identity`], so [`reassert_after_fault`] wraps the recovery layer
//! and stamps the identity resolved for that request onto it.

use std::sync::{Arc, OnceLock};

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, ETAG, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use footfall_capture::domain::identity::{identity_cookie, resolve};
use footfall_core::identity::Identity;

use crate::state::AppState;

/// Middleware: inserts an [`Identity`] extension and refreshes it on the way
/// out, whatever the handler returned.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = {
        let headers = request.headers();
        let cookies = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok());
        let etag = headers.get(ETAG).and_then(|v| v.to_str().ok());
        resolve(cookies, etag, state.identity_source.as_ref())
    };
    tracing::debug!(origin = ?resolved.origin, "visitor identity resolved");

    let identity = resolved.identity;
    if let Some(slot) = request.extensions().get::<IdentitySlot>() {
        slot.fill(&identity);
    }
    request.extensions_mut().insert(identity.clone());

    let mut response = next.run(request).await;
    assert_identity(response.headers_mut(), &identity, state.clock.now());
    response
}

/// Carries the resolved identity back out past the recovery layer.
#[derive(Debug, Clone, Default)]
pub struct IdentitySlot(Arc<OnceLock<Identity>>);

impl IdentitySlot {
    fn fill(&self, identity: &Identity) {
        // First resolution wins; a request is resolved once.
        let _ = self.0.set(identity.clone());
    }

    /// The identity resolved for this request, if resolution ran.
    #[must_use]
    pub fn get(&self) -> Option<&Identity> {
        self.0.get()
    }
}

/// Middleware, outside panic recovery: re-asserts the request's identity on
/// responses that skipped [`resolve_identity`] on the way out.
pub async fn reassert_after_fault(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let slot = IdentitySlot::default();
    request.extensions_mut().insert(slot.clone());

    let mut response = next.run(request).await;
    if !response.headers().contains_key(ETAG) {
        if let Some(identity) = slot.get() {
            assert_identity(response.headers_mut(), identity, state.clock.now());
        }
    }
    response
}

/// Writes the identity cookie and `ETag` into `headers`.
pub fn assert_identity(headers: &mut HeaderMap, identity: &Identity, now: DateTime<Utc>) {
    match (
        HeaderValue::from_str(&identity_cookie(identity, now)),
        HeaderValue::from_str(identity.as_str()),
    ) {
        (Ok(cookie), Ok(etag)) => {
            headers.append(SET_COOKIE, cookie);
            headers.insert(ETAG, etag);
        }
        _ => tracing::warn!(identity = %identity, "identity is not a valid header value"),
    }
}
