//! Route modules: capture over HTTP and WebSocket, the client script, and
//! the health check.

pub mod events;
pub mod health;
pub mod script;
pub mod stream;

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::header::{REFERER, USER_AGENT};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Uri};
use footfall_capture::domain::normalizer::{CaptureContext, resolve_page_url};
use footfall_core::identity::Identity;

use crate::error::ApiError;
use crate::middleware::remote_addr::RemoteAddr;

const URL_PARAM: &str = "url";

/// Query parameters accepted by the capture endpoints.
///
/// Extraction never rejects: a repeated `url` keeps its first value and an
/// undecodable query string is treated as carrying no override.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Page URL override; takes precedence over `Referer`.
    pub url: Option<String>,
}

impl PageQuery {
    /// Reads the query parameters from `uri`.
    #[must_use]
    pub fn from_uri(uri: &Uri) -> Self {
        match Query::<Vec<(String, String)>>::try_from_uri(uri) {
            Ok(Query(pairs)) => Self {
                url: pairs
                    .into_iter()
                    .find_map(|(key, value)| (key == URL_PARAM).then_some(value)),
            },
            Err(rejection) => {
                tracing::debug!(error = %rejection, "ignoring undecodable query string");
                Self::default()
            }
        }
    }
}

impl<S> FromRequestParts<S> for PageQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_uri(&parts.uri))
    }
}

/// Builds the capture context shared by every event of one request or
/// streaming session.
pub(crate) fn capture_context(
    identity: Identity,
    remote: RemoteAddr,
    query: &PageQuery,
    headers: &HeaderMap,
) -> CaptureContext {
    let header = |name| headers.get(name).and_then(|v| v.to_str().ok());
    CaptureContext {
        identity,
        remote: remote.0,
        url: resolve_page_url(query.url.as_deref(), header(REFERER)),
        user_agent: header(USER_AGENT).unwrap_or_default().to_owned(),
    }
}

/// Fallback for unmatched paths.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_owned())
}
