//! Command handlers for one-shot HTTP capture.
//!
//! Normalize the payload against the request context, then write the single
//! resulting event through the store.

use footfall_core::error::StoreError;
use footfall_core::event::Event;
use footfall_core::store::EventStore;
use footfall_core::time::Clock;

use crate::domain::normalizer::CaptureContext;
use crate::domain::payload::CapturePayload;

/// Handles one captured payload: builds exactly one event and appends it.
///
/// # Errors
///
/// Returns the `StoreError` if the write fails. The event is not retried.
pub async fn handle_capture(
    context: &CaptureContext,
    payload: CapturePayload,
    clock: &dyn Clock,
    store: &dyn EventStore,
) -> Result<Event, StoreError> {
    let event = context.normalize(clock.now(), payload.action, payload.vars);
    store.append(&event).await?;
    Ok(event)
}

/// Appends `event`, logging and absorbing any storage failure.
///
/// Returns whether the write succeeded.
pub async fn record(store: &dyn EventStore, event: &Event) -> bool {
    match store.append(event).await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(
                error = %err,
                identity = %event.identity,
                action = %event.action,
                "failed to store event"
            );
            false
        }
    }
}
