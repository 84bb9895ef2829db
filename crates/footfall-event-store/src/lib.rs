//! Footfall Event Store — PostgreSQL persistence for captured events.
//!
//! Provides idempotent schema provisioning, the bounded connection pool the
//! whole process shares, and the append-only [`PgEventStore`].

pub mod pg_event_store;
pub mod pool;
pub mod schema;

pub use pg_event_store::PgEventStore;
