//! The streaming session state machine.
//!
//! `Connecting → Open → Closed`. Opening emits the connect event, each
//! decoded message emits one event, closing emits the disconnect event.
//! `Closed` is terminal, so the disconnect event can only be produced once.

use std::fmt;

use chrono::{DateTime, Utc};
use footfall_core::event::{Event, SESSION_CONNECT, SESSION_DISCONNECT};
use thiserror::Error;
use uuid::Uuid;

use super::normalizer::CaptureContext;
use super::payload::CapturePayload;

/// Lifecycle state of a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Upgrade accepted, connect event not yet produced.
    Connecting,
    /// Reading messages.
    Open,
    /// Disconnect event produced; no further events.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Why a session's read loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Close frame received or the stream ended.
    ClientClosed,
    /// The transport reported an error.
    ReadFailed(String),
    /// A frame did not decode as a capture payload.
    MalformedFrame(String),
    /// The read loop panicked.
    Aborted(String),
    /// The session refused a message in its current state.
    Rejected(String),
}

impl SessionEnd {
    /// Short label for logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClientClosed => "client_closed",
            Self::ReadFailed(_) => "read_failed",
            Self::MalformedFrame(_) => "malformed_frame",
            Self::Aborted(_) => "aborted",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// A transition was requested from a state that does not allow it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("session {session_id}: cannot {transition} while {state}")]
pub struct SessionError {
    /// The session.
    pub session_id: Uuid,
    /// State at the time of the request.
    pub state: SessionState,
    /// The rejected transition.
    pub transition: &'static str,
}

/// One streaming session: bound to a single identity and page URL for its
/// whole lifetime.
#[derive(Debug)]
pub struct StreamingSession {
    id: Uuid,
    context: CaptureContext,
    state: SessionState,
    messages: u64,
}

impl StreamingSession {
    /// Creates a session in the `Connecting` state.
    #[must_use]
    pub fn new(context: CaptureContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            context,
            state: SessionState::Connecting,
            messages: 0,
        }
    }

    /// Session identifier, used to correlate log lines.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of message events produced so far.
    #[must_use]
    pub fn messages(&self) -> u64 {
        self.messages
    }

    /// The context every event of this session inherits.
    #[must_use]
    pub fn context(&self) -> &CaptureContext {
        &self.context
    }

    /// `Connecting → Open`, producing the connect event.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` unless the session is `Connecting`.
    pub fn open(&mut self, now: DateTime<Utc>) -> Result<Event, SessionError> {
        self.expect_state(SessionState::Connecting, "open")?;
        self.state = SessionState::Open;
        Ok(self.context.normalize(now, SESSION_CONNECT.to_owned(), None))
    }

    /// `Open → Open`, producing one event for a decoded message.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` unless the session is `Open`.
    pub fn message(
        &mut self,
        payload: CapturePayload,
        now: DateTime<Utc>,
    ) -> Result<Event, SessionError> {
        self.expect_state(SessionState::Open, "record a message")?;
        self.messages += 1;
        Ok(self.context.normalize(now, payload.action, payload.vars))
    }

    /// `Open → Closed`, producing the disconnect event.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` unless the session is `Open`; in particular a
    /// second close is rejected.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<Event, SessionError> {
        self.expect_state(SessionState::Open, "close")?;
        self.state = SessionState::Closed;
        Ok(self
            .context
            .normalize(now, SESSION_DISCONNECT.to_owned(), None))
    }

    fn expect_state(
        &self,
        expected: SessionState,
        transition: &'static str,
    ) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError {
                session_id: self.id,
                state: self.state,
                transition,
            })
        }
    }
}
