//! Event store database schema.

use sqlx::PgPool;

/// SQL to create the events table. Safe to run on every startup.
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    "identity"  TEXT NOT NULL,
    "time"      TIMESTAMPTZ NOT NULL,
    "remote"    TEXT NOT NULL,
    "url"       TEXT NOT NULL,
    "action"    TEXT NOT NULL,
    "vars"      JSONB NOT NULL
)
"#;

/// Creates the events table if it does not already exist.
///
/// Must complete before the server accepts connections.
///
/// # Errors
///
/// Returns the underlying `sqlx::Error` if the statement fails; callers treat
/// this as fatal.
pub async fn provision(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_EVENTS_TABLE).execute(pool).await?;
    tracing::info!("events table provisioned");
    Ok(())
}
