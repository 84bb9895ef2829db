//! Clock abstraction and the date arithmetic built on it.

use chrono::{DateTime, Duration, Utc};

/// How long an identity cookie stays valid after each visit.
pub const IDENTITY_TTL_DAYS: i64 = 365;

/// Abstraction over system time so captured timestamps and cookie expiry are
/// deterministic under test.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Expiry instant for an identity cookie issued at `now`.
#[must_use]
pub fn identity_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(IDENTITY_TTL_DAYS)
}

/// Formats a timestamp as an RFC 1123 HTTP date, e.g.
/// `Sun, 06 Nov 1994 08:49:37 GMT`.
#[must_use]
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
