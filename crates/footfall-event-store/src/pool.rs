//! The process-wide bounded connection pool.
//!
//! The pool is the collector's only backpressure mechanism: when every
//! connection is checked out, writers wait up to `acquire_timeout` and then
//! fail with [`StoreError::PoolTimeout`].

use std::time::Duration;

use footfall_core::error::StoreError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Default number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Default time a writer waits for a free connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Sizing and wait policy for the connection pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Upper bound on open connections.
    pub max_connections: u32,
    /// How long a writer blocks on checkout before giving up.
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

impl PoolSettings {
    /// Pool options carrying these settings.
    #[must_use]
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
    }
}

/// Opens the pool and verifies a connection can be established.
///
/// # Errors
///
/// Returns the underlying `sqlx::Error` when the database is unreachable.
pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    let pool = settings.pool_options().connect(database_url).await?;
    tracing::info!(
        max_connections = settings.max_connections,
        acquire_timeout_secs = settings.acquire_timeout.as_secs(),
        "database pool ready"
    );
    Ok(pool)
}

/// Classifies a driver error as a [`StoreError`].
pub(crate) fn store_error(err: sqlx::Error, acquire_timeout: Duration) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => StoreError::PoolTimeout(acquire_timeout),
        other => StoreError::Write(other.to_string()),
    }
}
