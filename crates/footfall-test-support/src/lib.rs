//! Shared test doubles and utilities for the Footfall analytics collector.

mod clock;
mod identity;
mod store;

pub use clock::{FixedClock, fixed_now};
pub use identity::FixedIdentitySource;
pub use store::{FailingEventStore, GatedEventStore, RecordingEventStore};
