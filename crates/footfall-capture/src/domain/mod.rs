//! Capture domain: identity resolution, payloads, normalization and the
//! streaming session state machine.

pub mod identity;
pub mod normalizer;
pub mod payload;
pub mod session;
