//! Shared application state.

use std::sync::Arc;

use footfall_core::identity::IdentitySource;
use footfall_core::store::EventStore;
use footfall_core::time::Clock;

/// Request-handling policy decided once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Prefer `X-Forwarded-For` / `X-Real-IP` over the socket peer address.
    pub trust_forwarded: bool,
    /// Origins allowed to open a streaming session. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl CaptureSettings {
    /// Whether a streaming upgrade from `origin` is allowed. Requests without
    /// an `Origin` header are not browser cross-origin requests and pass.
    #[must_use]
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            _ if self.allowed_origins.is_empty() => true,
            None => true,
            Some(origin) => self.allowed_origins.iter().any(|allowed| allowed == origin),
        }
    }
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for event timestamps and cookie expiry.
    pub clock: Arc<dyn Clock>,
    /// Mints identities for first-time visitors.
    pub identity_source: Arc<dyn IdentitySource>,
    /// Append-only event store.
    pub event_store: Arc<dyn EventStore>,
    /// Request-handling policy.
    pub settings: Arc<CaptureSettings>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        identity_source: Arc<dyn IdentitySource>,
        event_store: Arc<dyn EventStore>,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            clock,
            identity_source,
            event_store,
            settings: Arc::new(settings),
        }
    }
}
