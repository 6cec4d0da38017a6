//! Session protocol driver.
//!
//! The `SessionDriver` is the state machine of one joined game session. It
//! routes stream messages to the reconciler or the request tracker, runs the
//! countdown of the tracked request and decides what gets submitted. It
//! performs no I/O: every effect is returned as a [`SessionAction`].
//!
//! # Invariants
//!
//! - At most one request is tracked; a newer request supersedes it.
//! - At most one [`SessionAction::Send`] per tracked request, whether the
//!   answer comes from the user or from the countdown expiring.
//! - A submission for any sequence number other than the tracked one is
//!   dropped and never reaches the transport.
//! - After [`SessionAction::Ended`] every event is rejected with
//!   [`ClientError::SessionEnded`].

use std::time::Duration;

use credo_core::{
    CountdownTimer, Environment, Phase, RequestTracker, StateReconciler, TickOutcome, TimerId,
    validate_response,
};
use credo_proto::{GameEvent, GameState, RequestUserEvent, UserEvent};

use crate::{
    error::{ClientError, TransportError},
    event::{EndReason, LogLevel, SessionAction, SessionEvent},
    session::Session,
};

/// Session protocol state machine.
///
/// # Type Parameters
///
/// - `E`: Environment implementation for time
pub struct SessionDriver<E: Environment> {
    /// Joined room.
    session: Session,

    /// Held snapshot and phase.
    reconciler: StateReconciler,

    /// Outstanding request.
    tracker: RequestTracker,

    /// Deadline of the outstanding request.
    countdown: CountdownTimer<E::Instant>,

    /// Set once the session is over.
    ended: Option<EndReason>,

    /// Environment for time.
    env: E,
}

impl<E: Environment> SessionDriver<E> {
    /// Create a driver for a joined session.
    pub fn new(env: E, session: Session) -> Self {
        Self {
            session,
            reconciler: StateReconciler::new(),
            tracker: RequestTracker::new(),
            countdown: CountdownTimer::new(),
            ended: None,
            env,
        }
    }

    /// The joined room.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Latest snapshot.
    pub fn state(&self) -> Option<&GameState> {
        self.reconciler.state()
    }

    /// Phase of the game view.
    pub fn phase(&self) -> Phase {
        self.reconciler.phase()
    }

    /// True until the first snapshot arrives.
    pub fn is_waiting(&self) -> bool {
        self.reconciler.is_waiting()
    }

    /// The request waiting for an answer.
    pub fn current_request(&self) -> Option<&RequestUserEvent> {
        self.tracker.current()
    }

    /// Countdown of the tracked request.
    pub fn active_timer(&self) -> Option<TimerId> {
        self.countdown.active()
    }

    /// Time left to answer the tracked request.
    pub fn remaining(&self) -> Option<Duration> {
        self.countdown.remaining()
    }

    /// Why the session ended, once it has.
    pub fn end_reason(&self) -> Option<&EndReason> {
        self.ended.as_ref()
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidResponse`] if a submission does not fit the
    ///   tracked request. The request stays tracked.
    /// - [`ClientError::SessionEnded`] once the session is over.
    pub fn handle(
        &mut self,
        event: SessionEvent<E::Instant>,
    ) -> Result<Vec<SessionAction>, ClientError> {
        if self.ended.is_some() {
            return Err(ClientError::SessionEnded);
        }

        match event {
            SessionEvent::Message(GameEvent::StateUpdate(snapshot)) => {
                Ok(self.handle_snapshot(snapshot))
            },
            SessionEvent::Message(GameEvent::RequestUserEvent(request)) => {
                Ok(self.handle_request(request))
            },
            SessionEvent::Submit { seqnum, event } => self.handle_submit(seqnum, event),
            SessionEvent::Tick { timer, now } => Ok(self.handle_tick(timer, now)),
            SessionEvent::StreamClosed { error } => Ok(self.handle_stream_closed(error)),
            SessionEvent::Leave => Ok(self.end(EndReason::Left)),
        }
    }

    fn handle_snapshot(&mut self, snapshot: GameState) -> Vec<SessionAction> {
        let round = snapshot.round_number;
        let before = self.reconciler.phase();
        let phase = self.reconciler.apply(snapshot);

        let mut actions = vec![SessionAction::StateReplaced { phase }];
        if phase != before {
            actions.push(log(
                LogLevel::Info,
                format!("room {}: {before:?} -> {phase:?} at round {round}", self.session.room_id()),
            ));
        }
        actions
    }

    fn handle_request(&mut self, request: RequestUserEvent) -> Vec<SessionAction> {
        let mut actions = Vec::with_capacity(3);

        if let Some(superseded) = self.tracker.set(request.clone()) {
            actions.push(log(
                LogLevel::Debug,
                format!("request {} superseded by {}", superseded.seqnum, request.seqnum),
            ));
        }

        let timer = self.countdown.start(request.seqnum, request.timeout(), self.env.now());
        actions.push(SessionAction::Prompt(request));
        actions.push(SessionAction::StartTimer { timer });
        actions
    }

    fn handle_submit(
        &mut self,
        seqnum: u64,
        event: UserEvent,
    ) -> Result<Vec<SessionAction>, ClientError> {
        let Some(request) = self.tracker.current().filter(|r| r.seqnum == seqnum) else {
            let current = self.tracker.current().map(|r| r.seqnum);
            return Ok(vec![log(
                LogLevel::Debug,
                format!("dropping {} for stale request {seqnum} (tracked: {current:?})", event.name()),
            )]);
        };

        validate_response(request, &event)?;

        self.tracker.take_matching(seqnum);
        self.countdown.stop();
        Ok(vec![SessionAction::StopTimer, SessionAction::Send { seqnum, event }])
    }

    fn handle_tick(&mut self, timer: TimerId, now: E::Instant) -> Vec<SessionAction> {
        match self.countdown.tick(timer, now) {
            TickOutcome::Stale => Vec::new(),
            TickOutcome::Running { remaining, .. } => self
                .countdown
                .seqnum()
                .map(|seqnum| SessionAction::Countdown { seqnum, remaining })
                .into_iter()
                .collect(),
            TickOutcome::Expired { seqnum } => {
                let mut actions = vec![SessionAction::StopTimer];
                if self.tracker.take_matching(seqnum).is_some() {
                    actions.push(log(LogLevel::Info, format!("request {seqnum} timed out")));
                    actions.push(SessionAction::Send { seqnum, event: UserEvent::Empty });
                }
                actions
            },
        }
    }

    fn handle_stream_closed(&mut self, error: Option<TransportError>) -> Vec<SessionAction> {
        let reason = match error {
            Some(error) => EndReason::StreamFailed { reason: error.to_string() },
            None if self.reconciler.phase() == Phase::Finished => EndReason::GameFinished,
            None => EndReason::StreamClosed,
        };
        self.end(reason)
    }

    fn end(&mut self, reason: EndReason) -> Vec<SessionAction> {
        self.tracker.clear();
        self.countdown.stop();
        self.ended = Some(reason.clone());

        let level = match reason {
            EndReason::StreamFailed { .. } => LogLevel::Error,
            EndReason::StreamClosed => LogLevel::Warn,
            EndReason::GameFinished | EndReason::Left => LogLevel::Info,
        };

        vec![
            SessionAction::StopTimer,
            log(level, format!("session in room {} ended: {reason}", self.session.room_id())),
            SessionAction::Ended(reason),
        ]
    }
}

fn log(level: LogLevel, message: String) -> SessionAction {
    SessionAction::Log { level, message }
}
