//! Drives one streaming session from upgrade to disconnect.
//!
//! The connect event is written before the first read. The read loop then
//! records one event per decoded frame, in receipt order, until the client
//! closes, the transport fails, a frame fails to decode, or the loop panics.
//! Whichever way the loop ends, the disconnect event is written exactly once
//! before [`run_session`] returns.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::Instrument;
use uuid::Uuid;

use footfall_core::store::EventStore;
use footfall_core::time::Clock;

use crate::application::capture_handlers::record;
use crate::domain::normalizer::CaptureContext;
use crate::domain::payload::CapturePayload;
use crate::domain::session::{SessionEnd, StreamingSession};

/// The next thing read from a streaming connection, with control frames
/// already filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A data frame's bytes (text or binary).
    Payload(Vec<u8>),
    /// Close frame received or the stream ended.
    Closed,
    /// The transport failed.
    Failed(String),
}

/// Source of inbound frames for one session.
#[async_trait]
pub trait FrameSource: Send {
    /// Waits for the next data frame, close or failure.
    async fn next_inbound(&mut self) -> Inbound;
}

/// What happened during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: Uuid,
    /// Message events produced, excluding connect and disconnect.
    pub messages: u64,
    /// Why the session ended.
    pub end: SessionEnd,
}

/// Runs a session to completion over `frames`.
///
/// Storage failures are logged and do not end the session.
pub async fn run_session<S: FrameSource>(
    context: CaptureContext,
    mut frames: S,
    clock: &dyn Clock,
    store: &dyn EventStore,
) -> SessionSummary {
    let mut session = StreamingSession::new(context);
    let span = tracing::info_span!(
        "stream_session",
        session_id = %session.id(),
        identity = %session.context().identity,
        url = %session.context().url,
    );

    async move {
        match session.open(clock.now()) {
            Ok(connect) => {
                record(store, &connect).await;
            }
            Err(err) => tracing::warn!(error = %err, "session could not open"),
        }
        tracing::debug!("session opened");

        let end = AssertUnwindSafe(read_loop(&mut session, &mut frames, clock, store))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let reason = panic_message(panic.as_ref());
                tracing::error!(reason = %reason, "session read loop panicked");
                SessionEnd::Aborted(reason)
            });

        match session.close(clock.now()) {
            Ok(disconnect) => {
                record(store, &disconnect).await;
            }
            Err(err) => tracing::warn!(error = %err, "session could not close"),
        }
        tracing::info!(
            end = end.label(),
            messages = session.messages(),
            "session closed"
        );

        SessionSummary {
            session_id: session.id(),
            messages: session.messages(),
            end,
        }
    }
    .instrument(span)
    .await
}

async fn read_loop<S: FrameSource>(
    session: &mut StreamingSession,
    frames: &mut S,
    clock: &dyn Clock,
    store: &dyn EventStore,
) -> SessionEnd {
    loop {
        let bytes = match frames.next_inbound().await {
            Inbound::Payload(bytes) => bytes,
            Inbound::Closed => return SessionEnd::ClientClosed,
            Inbound::Failed(reason) => return SessionEnd::ReadFailed(reason),
        };

        let payload = match CapturePayload::decode(&bytes) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(error = %err, "malformed frame ends session");
                return SessionEnd::MalformedFrame(err.to_string());
            }
        };

        match session.message(payload, clock.now()) {
            Ok(event) => {
                record(store, &event).await;
            }
            Err(err) => {
                tracing::error!(error = %err, "session refused a message while reading");
                return SessionEnd::Rejected(err.to_string());
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use footfall_core::identity::Identity;
    use footfall_test_support::{FailingEventStore, FixedClock, RecordingEventStore};

    use super::*;

    /// Replays a fixed script, then reports the stream as closed.
    struct ScriptedFrames(VecDeque<Inbound>);

    impl ScriptedFrames {
        fn new(script: impl IntoIterator<Item = Inbound>) -> Self {
            Self(script.into_iter().collect())
        }
    }

    #[async_trait]
    impl FrameSource for ScriptedFrames {
        async fn next_inbound(&mut self) -> Inbound {
            self.0.pop_front().unwrap_or(Inbound::Closed)
        }
    }

    /// Yields one valid frame, then panics on the next read.
    struct PanickingFrames {
        served: bool,
    }

    #[async_trait]
    impl FrameSource for PanickingFrames {
        async fn next_inbound(&mut self) -> Inbound {
            if self.served {
                panic!("socket exploded");
            }
            self.served = true;
            frame(r#"{"action":"click"}"#)
        }
    }

    fn frame(json: &str) -> Inbound {
        Inbound::Payload(json.as_bytes().to_vec())
    }

    fn context() -> CaptureContext {
        CaptureContext {
            identity: Identity::new("visitor-1").unwrap(),
            remote: "198.51.100.4".into(),
            url: "https://example.com/blog".into(),
            user_agent: "Mozilla/5.0".into(),
        }
    }

    #[tokio::test]
    async fn test_session_records_connect_messages_disconnect_in_order() {
        // Arrange
        let store = RecordingEventStore::new();
        let frames = ScriptedFrames::new([
            frame(r#"{"action":"click"}"#),
            frame(r#"{"action":"scroll","vars":{"depth":0.5}}"#),
            Inbound::Closed,
        ]);

        // Act
        let summary = run_session(context(), frames, &FixedClock::default(), &store).await;

        // Assert
        assert_eq!(
            store.actions(),
            vec!["ws-connect", "click", "scroll", "ws-disconnect"]
        );
        assert_eq!(summary.messages, 2);
        assert_eq!(summary.end, SessionEnd::ClientClosed);
        for event in store.events() {
            assert_eq!(event.identity.as_str(), "visitor-1");
            assert_eq!(event.url, "https://example.com/blog");
            assert_eq!(event.vars["user_agent"], "Mozilla/5.0");
        }
        assert_eq!(store.events()[2].vars["depth"], 0.5);
    }

    #[tokio::test]
    async fn test_malformed_frame_ends_session_with_single_disconnect() {
        let store = RecordingEventStore::new();
        let frames = ScriptedFrames::new([
            frame(r#"{"action":"view"}"#),
            frame("{not json"),
            frame(r#"{"action":"never-read"}"#),
        ]);

        let summary = run_session(context(), frames, &FixedClock::default(), &store).await;

        assert_eq!(store.actions(), vec!["ws-connect", "view", "ws-disconnect"]);
        assert!(matches!(summary.end, SessionEnd::MalformedFrame(_)));
    }

    #[tokio::test]
    async fn test_read_failure_ends_session_with_single_disconnect() {
        let store = RecordingEventStore::new();
        let frames = ScriptedFrames::new([Inbound::Failed("connection reset".into())]);

        let summary = run_session(context(), frames, &FixedClock::default(), &store).await;

        assert_eq!(store.actions(), vec!["ws-connect", "ws-disconnect"]);
        assert_eq!(
            summary.end,
            SessionEnd::ReadFailed("connection reset".into())
        );
    }

    #[tokio::test]
    async fn test_panic_in_read_loop_still_records_disconnect() {
        let store = RecordingEventStore::new();

        let summary = run_session(
            context(),
            PanickingFrames { served: false },
            &FixedClock::default(),
            &store,
        )
        .await;

        assert_eq!(store.actions(), vec!["ws-connect", "click", "ws-disconnect"]);
        assert_eq!(summary.end, SessionEnd::Aborted("socket exploded".into()));
    }

    #[tokio::test]
    async fn test_read_loop_on_unopened_session_ends_as_rejected() {
        let store = RecordingEventStore::new();
        let mut session = StreamingSession::new(context());
        let mut frames = ScriptedFrames::new([frame(r#"{"action":"click"}"#)]);

        let end = read_loop(&mut session, &mut frames, &FixedClock::default(), &store).await;

        assert!(matches!(end, SessionEnd::Rejected(_)));
        assert_eq!(end.label(), "rejected");
        assert!(store.events().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failures_do_not_end_session() {
        let frames = ScriptedFrames::new([
            frame(r#"{"action":"a"}"#),
            frame(r#"{"action":"b"}"#),
        ]);

        let summary =
            run_session(context(), frames, &FixedClock::default(), &FailingEventStore).await;

        assert_eq!(summary.messages, 2);
        assert_eq!(summary.end, SessionEnd::ClientClosed);
    }

    #[tokio::test]
    async fn test_concurrent_sessions_keep_their_own_order() {
        let store = RecordingEventStore::new();
        let clock = FixedClock::default();
        let make = |n: usize| {
            ScriptedFrames::new((0..n).map(|i| frame(&format!(r#"{{"action":"m{i}"}}"#))))
        };
        let mut other = context();
        other.identity = Identity::new("visitor-2").unwrap();

        let (a, b) = tokio::join!(
            run_session(context(), make(5), &clock, &store),
            run_session(other, make(3), &clock, &store),
        );

        assert_eq!(a.messages, 5);
        assert_eq!(b.messages, 3);
        for (who, expected) in [("visitor-1", 5), ("visitor-2", 3)] {
            let actions: Vec<String> = store
                .events()
                .into_iter()
                .filter(|e| e.identity.as_str() == who)
                .map(|e| e.action)
                .collect();
            let mut want = vec!["ws-connect".to_string()];
            want.extend((0..expected).map(|i| format!("m{i}")));
            want.push("ws-disconnect".to_string());
            assert_eq!(actions, want);
        }
    }
}
