//! Footfall — the capture pipeline.
//!
//! Responsible for resolving visitor identity, normalizing client payloads
//! into events, writing them through the event store, and driving the
//! connect/message/disconnect lifecycle of streaming sessions.

pub mod application;
pub mod domain;
