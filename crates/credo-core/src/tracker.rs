//! Outstanding request slot.
//!
//! Holds at most one [`RequestUserEvent`]. A new request replaces the old one
//! unconditionally; a response is only accepted for the sequence number of
//! the request currently held.

use credo_proto::RequestUserEvent;

/// Tracks the single request the client still has to answer.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    current: Option<RequestUserEvent>,
}

impl RequestTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `request`, returning the one it supersedes.
    ///
    /// A replayed sequence number is tracked like any other request.
    pub fn set(&mut self, request: RequestUserEvent) -> Option<RequestUserEvent> {
        self.current.replace(request)
    }

    /// Forget the tracked request.
    pub fn clear(&mut self) -> Option<RequestUserEvent> {
        self.current.take()
    }

    /// The tracked request, if any.
    pub fn current(&self) -> Option<&RequestUserEvent> {
        self.current.as_ref()
    }

    /// Whether `seqnum` is the tracked request.
    pub fn is_current(&self, seqnum: u64) -> bool {
        self.current.as_ref().is_some_and(|r| r.seqnum == seqnum)
    }

    /// Remove and return the tracked request if it carries `seqnum`.
    ///
    /// Leaves the tracker untouched otherwise. Whoever gets `Some` owns the
    /// single response to that request.
    pub fn take_matching(&mut self, seqnum: u64) -> Option<RequestUserEvent> {
        if self.is_current(seqnum) { self.current.take() } else { None }
    }
}
