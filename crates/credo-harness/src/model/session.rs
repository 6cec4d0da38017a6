//! Model session - the reference implementation.
//!
//! Tracks the same observable state as the real driver with the simplest
//! possible rules: the last snapshot wins, the last request wins, an answer
//! is sent once if it fits, and a deadline that runs out sends an empty
//! answer. No timers, no actions, no phases.

use std::{collections::BTreeSet, time::Duration};

use credo_client::EndReason;
use credo_proto::{GameState, RequestKind, RequestUserEvent, UserEvent};

use super::operation::{Operation, OperationError, OperationResult};

/// Reason used by the real side when a stream failure is injected.
pub const INJECTED_FAILURE: &str = "connection closed";

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Latest snapshot.
    pub state: Option<GameState>,
    /// Whether any snapshot reported the game finished.
    pub finished: bool,
    /// Sequence number of the tracked request.
    pub tracked: Option<u64>,
    /// Everything submitted, in order.
    pub sent: Vec<(u64, UserEvent)>,
    /// Why the session ended.
    pub ended: Option<EndReason>,
}

/// Reference session.
#[derive(Debug, Clone, Default)]
pub struct ModelSession {
    state: Option<GameState>,
    finished: bool,
    tracked: Option<(RequestUserEvent, Duration)>,
    sent: Vec<(u64, UserEvent)>,
    ended: Option<EndReason>,
}

impl ModelSession {
    /// Create a session that has seen nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observable state.
    pub fn observe(&self) -> ObservableState {
        ObservableState {
            state: self.state.clone(),
            finished: self.finished,
            tracked: self.tracked.as_ref().map(|(r, _)| r.seqnum),
            sent: self.sent.clone(),
            ended: self.ended.clone(),
        }
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        if self.ended.is_some() {
            return OperationResult::Error(OperationError::SessionEnded);
        }

        match op {
            Operation::Snapshot(snapshot) => {
                let state = snapshot.to_state();
                self.finished |= state.game_finished;
                self.state = Some(state);
            },
            Operation::TurnRequest { .. } | Operation::CostRequest { .. } => {
                if let Some(request) = op.request() {
                    let timeout = request.timeout();
                    self.tracked = Some((request, timeout));
                }
            },
            Operation::Submit { seqnum, choice } => {
                return self.submit(u64::from(*seqnum), choice.to_event());
            },
            Operation::SubmitCurrent { choice } => {
                let seqnum = self.tracked.as_ref().map_or(0, |(r, _)| r.seqnum);
                return self.submit(seqnum, choice.to_event());
            },
            Operation::AdvanceTime { millis } => {
                let elapsed = Duration::from_millis(u64::from(*millis));
                if let Some((request, remaining)) = self.tracked.as_mut() {
                    if elapsed >= *remaining {
                        self.sent.push((request.seqnum, UserEvent::Empty));
                        self.tracked = None;
                    } else {
                        *remaining -= elapsed;
                    }
                }
            },
            Operation::StaleTick => {},
            Operation::CloseStream { failed } => {
                self.ended = Some(if *failed {
                    EndReason::StreamFailed { reason: INJECTED_FAILURE.to_string() }
                } else if self.finished {
                    EndReason::GameFinished
                } else {
                    EndReason::StreamClosed
                });
                self.tracked = None;
            },
            Operation::Leave => {
                self.ended = Some(EndReason::Left);
                self.tracked = None;
            },
        }

        OperationResult::Ok
    }

    fn submit(&mut self, seqnum: u64, event: UserEvent) -> OperationResult {
        let Some((request, _)) = self.tracked.as_ref().filter(|(r, _)| r.seqnum == seqnum) else {
            return OperationResult::Ok;
        };

        if !fits(request, &event) {
            return OperationResult::Error(OperationError::InvalidResponse);
        }

        self.sent.push((seqnum, event));
        self.tracked = None;
        OperationResult::Ok
    }
}

fn fits(request: &RequestUserEvent, event: &UserEvent) -> bool {
    match (&request.kind, event) {
        (_, UserEvent::Empty) | (RequestKind::TurnAction { .. }, UserEvent::EndTurn) => true,
        (RequestKind::TurnAction { playable_cards }, UserEvent::PlayCard { entity }) => {
            playable_cards.contains(entity)
        },
        (RequestKind::CostAction { cost, providers }, UserEvent::PayCost { providers: selected }) => {
            let required = u64::from(cost.map_or(1, |c| c.any));
            let distinct = selected.iter().collect::<BTreeSet<_>>().len() == selected.len();

            let mut total = 0u64;
            for entity in selected {
                match providers.iter().find(|p| p.entity == *entity) {
                    Some(p) => total += u64::from(p.provided.map_or(0, |c| c.any)),
                    None => return false,
                }
            }
            distinct && total == required
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::operation::Choice;

    #[test]
    fn timeout_sends_empty_once() {
        let mut model = ModelSession::new();
        model.apply(&Operation::TurnRequest { seqnum: 5, timeout_ticks: 2, playable: 0b11 });

        model.apply(&Operation::AdvanceTime { millis: 150 });
        assert!(model.observe().sent.is_empty());

        model.apply(&Operation::AdvanceTime { millis: 50 });
        model.apply(&Operation::AdvanceTime { millis: 500 });
        assert_eq!(model.observe().sent, vec![(5, UserEvent::Empty)]);
    }

    #[test]
    fn ended_session_refuses_everything() {
        let mut model = ModelSession::new();
        model.apply(&Operation::Leave);

        assert_eq!(
            model.apply(&Operation::SubmitCurrent { choice: Choice::EndTurn }),
            OperationResult::Error(OperationError::SessionEnded)
        );
        assert_eq!(model.observe().ended, Some(EndReason::Left));
    }
}
