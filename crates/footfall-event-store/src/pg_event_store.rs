//! `PostgreSQL` implementation of the `EventStore` trait.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use footfall_core::error::StoreError;
use footfall_core::event::Event;
use footfall_core::store::EventStore;

use crate::pool::store_error;

const INSERT_EVENT: &str = r#"
INSERT INTO events ("identity", "time", "remote", "url", "action", "vars")
VALUES ($1, $2, $3, $4, $5, $6::jsonb)
"#;

/// PostgreSQL-backed append-only event store.
///
/// Every append checks a connection out of the shared pool, runs one
/// autocommitted insert and returns the connection.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
    acquire_timeout: Duration,
}

impl PgEventStore {
    /// Creates a new `PgEventStore` over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let acquire_timeout = pool.options().get_acquire_timeout();
        Self {
            pool,
            acquire_timeout,
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn append(&self, event: &Event) -> Result<(), StoreError> {
        let vars = serde_json::to_string(&event.vars)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query(INSERT_EVENT)
            .bind(event.identity.as_str())
            .bind(event.time)
            .bind(&event.remote)
            .bind(&event.url)
            .bind(&event.action)
            .bind(vars)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error(e, self.acquire_timeout))?;

        Ok(())
    }
}
