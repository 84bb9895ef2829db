//! Storage error types.

use std::time::Duration;

use thiserror::Error;

/// Error returned by an [`EventStore`](crate::store::EventStore) write.
///
/// This is the only error the capture pipeline produces once a payload has
/// been decoded. Callers log it and move on; it is never surfaced to the
/// visitor.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The event's vars could not be encoded as a JSON document.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No pooled connection became available within the acquire timeout.
    #[error("connection pool exhausted after {0:?}")]
    PoolTimeout(Duration),

    /// The database rejected or failed the insert.
    #[error("write failed: {0}")]
    Write(String),
}
