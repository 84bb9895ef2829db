//! The captured event record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Schema-less key/value document attached to every event.
pub type Vars = serde_json::Map<String, serde_json::Value>;

/// Action recorded when a streaming session opens.
pub const SESSION_CONNECT: &str = "ws-connect";

/// Action recorded when a streaming session ends, whatever the cause.
pub const SESSION_DISCONNECT: &str = "ws-disconnect";

/// Vars key the server owns; client-supplied values under it are replaced.
pub const USER_AGENT_VAR: &str = "user_agent";

/// One recorded visitor action. Events are append-only: once built they are
/// written exactly once and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Visitor the event is attributed to.
    pub identity: Identity,
    /// Server wall-clock time at capture.
    pub time: DateTime<Utc>,
    /// Resolved client address.
    pub remote: String,
    /// Page the event was reported from.
    pub url: String,
    /// Free-form action name.
    pub action: String,
    /// Client payload plus server enrichment.
    pub vars: Vars,
}

impl Event {
    /// Returns `true` for the synthetic events that bracket a streaming session.
    #[must_use]
    pub fn is_session_marker(&self) -> bool {
        self.action == SESSION_CONNECT || self.action == SESSION_DISCONNECT
    }
}
