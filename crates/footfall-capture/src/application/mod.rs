//! Capture handlers that write events through an `EventStore`.

pub mod capture_handlers;
pub mod session_handlers;
