//! Real driver wrapper mirroring [`ModelSession`](crate::ModelSession)'s
//! interface.

use std::time::Duration;

use credo_client::{
    AuthToken, ClientError, RoomId, Session, SessionAction, SessionDriver, SessionEvent,
    TransportError,
};
use credo_core::{Environment, Phase, TimerId};
use credo_proto::{GameEvent, UserEvent};

use crate::{
    model::{ObservableState, Operation, OperationError, OperationResult},
    sim_env::SimEnv,
};

/// Never handed out by a countdown.
const UNISSUED_TIMER: TimerId = TimerId(u64::MAX);

/// A [`SessionDriver`] on a virtual clock, driven by [`Operation`]s.
pub struct RealSession {
    driver: SessionDriver<SimEnv>,
    env: SimEnv,
    sent: Vec<(u64, UserEvent)>,
    actions: Vec<SessionAction>,
}

impl Default for RealSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RealSession {
    /// Driver for a freshly joined room.
    pub fn new() -> Self {
        let env = SimEnv::new();
        let session = Session::new(AuthToken::new("token:model"), RoomId::new("room-1"), "model");
        Self {
            driver: SessionDriver::new(env.clone(), session),
            env,
            sent: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// The wrapped driver.
    pub fn driver(&self) -> &SessionDriver<SimEnv> {
        &self.driver
    }

    /// Actions returned by the last operation.
    pub fn last_actions(&self) -> &[SessionAction] {
        &self.actions
    }

    /// Observable state, comparable with the model's.
    pub fn observe(&self) -> ObservableState {
        ObservableState {
            state: self.driver.state().cloned(),
            finished: self.driver.phase() == Phase::Finished,
            tracked: self.driver.current_request().map(|r| r.seqnum),
            sent: self.sent.clone(),
            ended: self.driver.end_reason().cloned(),
        }
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        let event = match op {
            Operation::Snapshot(snapshot) => {
                SessionEvent::Message(GameEvent::StateUpdate(snapshot.to_state()))
            },
            Operation::TurnRequest { .. } | Operation::CostRequest { .. } => match op.request() {
                Some(request) => SessionEvent::Message(GameEvent::RequestUserEvent(request)),
                None => return OperationResult::Ok,
            },
            Operation::Submit { seqnum, choice } => {
                SessionEvent::Submit { seqnum: u64::from(*seqnum), event: choice.to_event() }
            },
            Operation::SubmitCurrent { choice } => SessionEvent::Submit {
                seqnum: self.driver.current_request().map_or(0, |r| r.seqnum),
                event: choice.to_event(),
            },
            Operation::AdvanceTime { millis } => {
                let now = self.env.advance(Duration::from_millis(u64::from(*millis)));
                let timer = self.driver.active_timer().unwrap_or(UNISSUED_TIMER);
                SessionEvent::Tick { timer, now }
            },
            Operation::StaleTick => SessionEvent::Tick { timer: UNISSUED_TIMER, now: self.env.now() },
            Operation::CloseStream { failed } => SessionEvent::StreamClosed {
                error: failed.then_some(TransportError::Closed),
            },
            Operation::Leave => SessionEvent::Leave,
        };

        match self.driver.handle(event) {
            Ok(actions) => {
                self.sent.extend(actions.iter().filter_map(|action| match action {
                    SessionAction::Send { seqnum, event } => Some((*seqnum, event.clone())),
                    _ => None,
                }));
                self.actions = actions;
                OperationResult::Ok
            },
            Err(ClientError::InvalidResponse(_)) => {
                self.actions.clear();
                OperationResult::Error(OperationError::InvalidResponse)
            },
            Err(_) => {
                self.actions.clear();
                OperationResult::Error(OperationError::SessionEnded)
            },
        }
    }
}
