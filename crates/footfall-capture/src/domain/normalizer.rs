//! Event normalization: request context + client payload → canonical event.

use chrono::{DateTime, Utc};
use footfall_core::event::{Event, USER_AGENT_VAR, Vars};
use footfall_core::identity::Identity;

/// Everything about the originating request that an event inherits.
///
/// Built once per HTTP request or per streaming session and reused for every
/// event it produces, so all events of a session share identity and URL.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureContext {
    /// Resolved visitor identity.
    pub identity: Identity,
    /// Resolved client address.
    pub remote: String,
    /// Page the events are reported from.
    pub url: String,
    /// Request `User-Agent`, empty when absent.
    pub user_agent: String,
}

impl CaptureContext {
    /// Builds an event for `action`.
    ///
    /// `user_agent` is always written into vars, replacing any value the
    /// client supplied under that key. `None` vars yields a map holding only
    /// `user_agent`.
    #[must_use]
    pub fn normalize(&self, now: DateTime<Utc>, action: String, vars: Option<Vars>) -> Event {
        let mut vars = vars.unwrap_or_default();
        vars.insert(USER_AGENT_VAR.to_owned(), self.user_agent.clone().into());

        Event {
            identity: self.identity.clone(),
            time: now,
            remote: self.remote.clone(),
            url: self.url.clone(),
            action,
            vars,
        }
    }
}

/// Page URL for an event: a non-empty `url` query override, else the
/// `Referer` header, else empty.
#[must_use]
pub fn resolve_page_url(query_url: Option<&str>, referer: Option<&str>) -> String {
    query_url
        .filter(|u| !u.is_empty())
        .or(referer)
        .unwrap_or_default()
        .to_owned()
}
