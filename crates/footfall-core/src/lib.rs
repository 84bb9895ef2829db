//! Footfall Core — shared event and identity abstractions.
//!
//! This crate defines the event record, the visitor identity token and the
//! seams (clock, identity source, event store) that the capture pipeline is
//! written against. It contains no infrastructure code.

pub mod error;
pub mod event;
pub mod identity;
pub mod store;
pub mod time;
