//! Driver inputs, outputs and the updates published to the session owner.

use std::{fmt, time::Duration};

use credo_core::{Phase, ResponseError, TimerId};
use credo_proto::{GameEvent, GameState, RequestUserEvent, UserEvent};

use crate::error::TransportError;

/// Input to [`SessionDriver::handle`](crate::SessionDriver::handle).
#[derive(Debug)]
pub enum SessionEvent<I> {
    /// Message delivered by the game stream.
    Message(GameEvent),

    /// The user answers request `seqnum`.
    Submit {
        /// Sequence number the answer is meant for.
        seqnum: u64,
        /// The answer.
        event: UserEvent,
    },

    /// Countdown tick from the ticker.
    Tick {
        /// Countdown the tick was scheduled for.
        timer: TimerId,
        /// When the tick fired.
        now: I,
    },

    /// The game stream ended. `None` means a clean end of stream.
    StreamClosed {
        /// Failure that ended the stream.
        error: Option<TransportError>,
    },

    /// The user leaves the session.
    Leave,
}

/// Log severity of a [`SessionAction::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal progress.
    Info,
    /// Something unexpected but survivable.
    Warn,
    /// Session-ending failure.
    Error,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// Stream ended before the game finished.
    StreamClosed,
    /// Stream failed.
    StreamFailed {
        /// Failure description.
        reason: String,
    },
    /// Stream ended after the game finished.
    GameFinished,
    /// The user left.
    Left,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamClosed => f.write_str("stream closed"),
            Self::StreamFailed { reason } => write!(f, "stream failed: {reason}"),
            Self::GameFinished => f.write_str("game finished"),
            Self::Left => f.write_str("left"),
        }
    }
}

/// Output of the driver. The caller performs these in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Held state was replaced by a snapshot.
    StateReplaced {
        /// Phase after the replace.
        phase: Phase,
    },

    /// A new request needs an answer.
    Prompt(RequestUserEvent),

    /// (Re)start the ticker for this countdown, cancelling any running one.
    StartTimer {
        /// Countdown to tag ticks with.
        timer: TimerId,
    },

    /// Stop the ticker.
    StopTimer,

    /// Time left on the tracked request.
    Countdown {
        /// Request being counted down.
        seqnum: u64,
        /// Time left.
        remaining: Duration,
    },

    /// Submit an answer to the server.
    Send {
        /// Request being answered.
        seqnum: u64,
        /// The answer.
        event: UserEvent,
    },

    /// The session is over. No further actions follow.
    Ended(EndReason),

    /// Log a message.
    Log {
        /// Severity.
        level: LogLevel,
        /// Message text.
        message: String,
    },
}

/// Notification published by the session loop to the session owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// A snapshot replaced the held state.
    State {
        /// The new state.
        state: GameState,
        /// Phase after the replace.
        phase: Phase,
    },
    /// A request needs an answer.
    Prompt(RequestUserEvent),
    /// Time left on the tracked request.
    Countdown {
        /// Request being counted down.
        seqnum: u64,
        /// Time left.
        remaining: Duration,
    },
    /// An answer was handed to the transport.
    Submitted {
        /// Request answered.
        seqnum: u64,
        /// The answer.
        event: UserEvent,
    },
    /// The transport failed to deliver an answer.
    SubmitFailed {
        /// Request answered.
        seqnum: u64,
        /// Failure description.
        error: String,
    },
    /// An answer was rejected locally. The request is still open.
    Rejected {
        /// Request the answer was meant for.
        seqnum: u64,
        /// Why.
        error: ResponseError,
    },
    /// The session is over.
    Ended(EndReason),
}
