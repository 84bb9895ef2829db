//! Event store abstraction.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::event::Event;

/// Append-only sink for captured events.
///
/// Each call writes exactly one event and commits it independently; there is
/// no batching and no read path. Implementations may block the caller while
/// waiting for a pooled connection.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Durably append one event.
    async fn append(&self, event: &Event) -> Result<(), StoreError>;
}
