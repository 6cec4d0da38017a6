//! Operations for model-based testing.
//!
//! Operations represent everything that can happen to one session: stream
//! messages, user answers, time passing and teardown. They are generated by
//! proptest (or a fuzzer) and applied to both the model and the real driver.

use arbitrary::Arbitrary;
use credo_proto::{
    CardId, CardRef, Cost, CostProvider, EntityId, GameState, RequestKind, RequestUserEvent,
    UserEvent,
};

/// Entity ids are drawn from this small range so answers often hit.
pub const ENTITY_SPACE: u8 = 8;

/// Entity for a generated byte.
pub fn entity(raw: u8) -> EntityId {
    EntityId(u32::from(raw % ENTITY_SPACE))
}

/// Operations that can be applied to a session.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Server sends a snapshot.
    Snapshot(SmallSnapshot),

    /// Server asks for a turn action.
    TurnRequest {
        /// Sequence number.
        seqnum: u8,
        /// Deadline in units of 100 ms.
        timeout_ticks: u8,
        /// Bit `i` set means entity `i` is playable.
        playable: u8,
    },

    /// Server asks for a cost payment.
    CostRequest {
        /// Sequence number.
        seqnum: u8,
        /// Deadline in units of 100 ms.
        timeout_ticks: u8,
        /// Required amount; `None` leaves it implicit.
        cost: Option<u8>,
        /// Candidate providers as `(entity, amount)`.
        providers: Vec<(u8, Option<u8>)>,
    },

    /// User answers.
    Submit {
        /// Sequence number the answer is tagged with.
        seqnum: u8,
        /// The answer.
        choice: Choice,
    },

    /// Answer the tracked request, whatever its sequence number.
    SubmitCurrent {
        /// The answer.
        choice: Choice,
    },

    /// Advance time and deliver a tick for the running countdown.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },

    /// Deliver a tick for a countdown that is no longer running.
    StaleTick,

    /// Server ends the stream.
    CloseStream {
        /// Whether the stream fails rather than ending cleanly.
        failed: bool,
    },

    /// User leaves.
    Leave,
}

/// Compact snapshot description.
#[derive(Debug, Clone, Arbitrary)]
pub struct SmallSnapshot {
    /// Round number.
    pub round: u8,
    /// Turn-owner flag.
    pub my_turn: bool,
    /// Game-finished flag.
    pub finished: bool,
    /// Hand as entity bytes.
    pub hand: Vec<u8>,
    /// Deck size.
    pub deck: u8,
}

impl SmallSnapshot {
    /// Expand to a full snapshot.
    pub fn to_state(&self) -> GameState {
        GameState {
            debug_log: vec![format!("round {}", self.round)],
            self_hand: self
                .hand
                .iter()
                .map(|&raw| CardRef { card_id: CardId(7000 + u32::from(raw)), entity: entity(raw) })
                .collect(),
            self_deck_count: u32::from(self.deck),
            round_number: u32::from(self.round),
            is_my_turn: self.my_turn,
            game_finished: self.finished,
            ..GameState::default()
        }
    }
}

/// A user answer.
#[derive(Debug, Clone, Arbitrary)]
pub enum Choice {
    /// Play an entity.
    PlayCard(u8),
    /// End the turn.
    EndTurn,
    /// Pay with these entities.
    PayCost(Vec<u8>),
    /// Empty answer.
    Empty,
}

impl Choice {
    /// Expand to a user event.
    pub fn to_event(&self) -> UserEvent {
        match self {
            Self::PlayCard(raw) => UserEvent::PlayCard { entity: entity(*raw) },
            Self::EndTurn => UserEvent::EndTurn,
            Self::PayCost(raw) => {
                UserEvent::PayCost { providers: raw.iter().copied().map(entity).collect() }
            },
            Self::Empty => UserEvent::Empty,
        }
    }
}

fn timeout_ms(ticks: u8) -> u64 {
    u64::from(ticks) * 100
}

impl Operation {
    /// The request carried by request operations.
    pub fn request(&self) -> Option<RequestUserEvent> {
        match self {
            Self::TurnRequest { seqnum, timeout_ticks, playable } => Some(RequestUserEvent {
                seqnum: u64::from(*seqnum),
                timeout_ms: timeout_ms(*timeout_ticks),
                kind: RequestKind::TurnAction {
                    playable_cards: (0..ENTITY_SPACE)
                        .filter(|bit| playable & (1 << bit) != 0)
                        .map(entity)
                        .collect(),
                },
            }),
            Self::CostRequest { seqnum, timeout_ticks, cost, providers } => {
                Some(RequestUserEvent {
                    seqnum: u64::from(*seqnum),
                    timeout_ms: timeout_ms(*timeout_ticks),
                    kind: RequestKind::CostAction {
                        cost: cost.map(|any| Cost { any: u32::from(any % 8) }),
                        providers: providers
                            .iter()
                            .take(usize::from(ENTITY_SPACE))
                            .map(|&(raw, amount)| CostProvider {
                                entity: entity(raw),
                                provided: amount.map(|any| Cost { any: u32::from(any % 4) }),
                            })
                            .collect(),
                    },
                })
            },
            _ => None,
        }
    }
}

/// Result of applying an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation processed.
    Ok,
    /// Operation refused.
    Error(OperationError),
}

/// Expected refusals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Answer does not fit the tracked request.
    InvalidResponse,
    /// Session already ended.
    SessionEnded,
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}
