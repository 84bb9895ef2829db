//! Proxy-aware client address resolution.
//!
//! When forwarded headers are trusted, the first public address in
//! `X-Forwarded-For` wins, then `X-Real-IP`; otherwise, or when neither
//! yields a public address, the socket peer is used.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::state::AppState;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// The resolved client address, carried as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddr(pub String);

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Middleware: inserts a [`RemoteAddr`] extension for downstream stages.
pub async fn resolve_remote_addr(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let remote = remote_addr(
        request.headers(),
        peer,
        state.settings.trust_forwarded,
    );
    request.extensions_mut().insert(remote);
    next.run(request).await
}

/// Picks the client address for a request.
#[must_use]
pub fn remote_addr(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> RemoteAddr {
    if trust_forwarded {
        if let Some(ip) = forwarded_ip(headers) {
            return RemoteAddr(ip.to_string());
        }
    }
    RemoteAddr(peer.map_or_else(|| "unknown".to_string(), |addr| addr.to_string()))
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_xff = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|entry| entry.trim().parse::<IpAddr>().ok())
        .find(is_public);

    from_xff.or_else(|| {
        headers
            .get(X_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
            .filter(is_public)
    })
}

fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            let unique_local = (first & 0xfe00) == 0xfc00;
            let link_local = (first & 0xffc0) == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}
