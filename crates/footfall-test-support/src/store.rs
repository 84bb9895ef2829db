//! Test stores — in-memory `EventStore` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use footfall_core::error::StoreError;
use footfall_core::event::Event;
use footfall_core::store::EventStore;
use tokio::sync::Semaphore;

/// An event store that records every appended event in arrival order and
/// always succeeds.
#[derive(Debug, Default)]
pub struct RecordingEventStore {
    appended: Mutex<Vec<Event>>,
}

impl RecordingEventStore {
    /// Create an empty recording store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all events that were appended.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<Event> {
        self.appended.lock().unwrap().clone()
    }

    /// Returns the action names of all appended events, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn actions(&self) -> Vec<String> {
        self.appended
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }
}

#[async_trait]
impl EventStore for RecordingEventStore {
    async fn append(&self, event: &Event) -> Result<(), StoreError> {
        self.appended.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// An event store that always fails with a write error. Useful for testing
/// that storage failures are absorbed.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn append(&self, _event: &Event) -> Result<(), StoreError> {
        Err(StoreError::Write("connection refused".into()))
    }
}

/// A recording store that admits at most `capacity` concurrent writes and
/// holds each one for `hold`, standing in for a small connection pool.
/// Writers beyond capacity wait for a permit rather than failing.
#[derive(Debug)]
pub struct GatedEventStore {
    inner: RecordingEventStore,
    permits: Semaphore,
    hold: Duration,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl GatedEventStore {
    /// Create a gated store with `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize, hold: Duration) -> Self {
        Self {
            inner: RecordingEventStore::new(),
            permits: Semaphore::new(capacity),
            hold,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Returns a snapshot of all events that were appended.
    pub fn events(&self) -> Vec<Event> {
        self.inner.events()
    }

    /// Highest number of writes observed inside the gate at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for GatedEventStore {
    async fn append(&self, event: &Event) -> Result<(), StoreError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        let result = self.inner.append(event).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result
    }
}
