//! Visitor identity resolution.
//!
//! Precedence, first match wins: the `t` cookie, then an echoed `ETag`
//! request header, then a freshly minted token. Whatever the origin, the
//! response re-asserts the identity as a one-year cookie and an `ETag`.

use chrono::{DateTime, Utc};
use footfall_core::identity::{Identity, IdentitySource};
use footfall_core::time::{http_date, identity_expiry};

/// Name of the identity cookie.
pub const IDENTITY_COOKIE: &str = "t";

/// Where a resolved identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOrigin {
    /// Non-empty `t` cookie.
    Cookie,
    /// Non-empty `ETag` request header.
    ETag,
    /// Minted for this request.
    Generated,
}

/// An identity together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// The visitor identity.
    pub identity: Identity,
    /// Which rule produced it.
    pub origin: IdentityOrigin,
}

/// Resolves the visitor identity from the request's `Cookie` header values
/// and `ETag` header.
///
/// Only the first cookie named `t` is considered; if its value is empty or
/// not a valid token the `ETag` header is tried next. A quoted `ETag` is
/// unquoted.
pub fn resolve<'a>(
    cookie_headers: impl IntoIterator<Item = &'a str>,
    etag: Option<&str>,
    source: &dyn IdentitySource,
) -> ResolvedIdentity {
    let from_cookie = cookie_headers
        .into_iter()
        .find_map(|header| cookie_value(header, IDENTITY_COOKIE))
        .and_then(Identity::new);
    if let Some(identity) = from_cookie {
        return ResolvedIdentity {
            identity,
            origin: IdentityOrigin::Cookie,
        };
    }

    if let Some(identity) = etag.map(unquote).and_then(Identity::new) {
        return ResolvedIdentity {
            identity,
            origin: IdentityOrigin::ETag,
        };
    }

    ResolvedIdentity {
        identity: source.generate(),
        origin: IdentityOrigin::Generated,
    }
}

/// Extracts the value of cookie `name` from one `Cookie` header value.
///
/// Surrounding double quotes are stripped from the value.
#[must_use]
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| unquote(value))
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// `Set-Cookie` header value that refreshes `identity` for another year.
#[must_use]
pub fn identity_cookie(identity: &Identity, now: DateTime<Utc>) -> String {
    format!(
        "{IDENTITY_COOKIE}={identity}; Expires={}",
        http_date(identity_expiry(now))
    )
}
