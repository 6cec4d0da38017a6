//! Client error types.

use credo_core::ResponseError;
use credo_proto::FrameError;
use thiserror::Error;

/// Errors from talking to the game server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying byte stream failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame could not be encoded or decoded.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Connection or subscription is gone.
    #[error("connection closed")]
    Closed,

    /// Connection is carrying a game stream and cannot serve request/reply
    /// calls.
    #[error("connection busy with a game stream")]
    Busy,

    /// Server refused the request.
    #[error("rejected by server: {message}")]
    Rejected {
        /// Server-provided reason.
        message: String,
    },

    /// Server answered with a message of the wrong kind.
    #[error("unexpected reply: expected {expected}, got {actual}")]
    UnexpectedReply {
        /// Reply the call waits for.
        expected: &'static str,
        /// Debug rendering of what arrived.
        actual: String,
    },
}

/// Errors from client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Operation needs a token from `login`.
    #[error("not logged in")]
    NotLoggedIn,

    /// Operation needs a joined room.
    #[error("no room joined")]
    NotJoined,

    /// A session loop from this client is still running.
    #[error("game already entered")]
    AlreadyEntered,

    /// The session already ended.
    #[error("session ended")]
    SessionEnded,

    /// Response does not fit the tracked request.
    #[error("invalid response: {0}")]
    InvalidResponse(#[from] ResponseError),

    /// Talking to the server failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Returns true if this error is fatal (unrecoverable).
    ///
    /// Fatal errors are usage errors or a dead session.
    /// Transient errors leave the session intact; the user can answer again.
    pub fn is_fatal(&self) -> bool {
        match self {
            // Fatal: precondition violations, session gone
            Self::NotLoggedIn
            | Self::NotJoined
            | Self::AlreadyEntered
            | Self::SessionEnded
            | Self::Transport(_) => true,

            // Transient: request is still tracked
            Self::InvalidResponse(_) => false,
        }
    }
}
