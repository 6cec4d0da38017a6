//! Fuzz target for [`SessionDriver`] state machine
//!
//! Prevent double submissions and answers to requests the server no longer
//! waits for.
//!
//! # Strategy
//!
//! - Event sequences: arbitrary snapshots, requests, answers, ticks and
//!   stream closure
//! - Stale input: answers and ticks for superseded requests and timers
//! - Timeout testing: advance time past request deadlines
//!
//! # Invariants
//!
//! - At most one `Send` per request message
//! - `Send` only for the seqnum tracked before the event
//! - Nothing is tracked after a `Send`
//! - `Finished` phase is sticky
//! - No event is accepted after `Ended` (terminal invariant)
//! - NEVER panic on any input

#![no_main]

use std::{future::Future, ops::Sub, time::Duration};

use arbitrary::Arbitrary;
use credo_client::{
    AuthToken, ClientError, RoomId, Session, SessionAction, SessionDriver, SessionEvent,
    TransportError,
};
use credo_core::{Environment, Phase, TimerId};
use credo_proto::{
    CardId, CardRef, Cost, CostProvider, EntityId, GameEvent, GameState, RequestKind,
    RequestUserEvent, UserEvent,
};
use libfuzzer_sys::fuzz_target;

/// Represents time as Duration since epoch 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FuzzInstant(Duration);

impl Sub for FuzzInstant {
    type Output = Duration;

    fn sub(self, other: Self) -> Duration {
        self.0.saturating_sub(other.0)
    }
}

/// Clock that stays where the input puts it.
#[derive(Debug, Clone, Copy)]
struct FuzzEnv;

impl Environment for FuzzEnv {
    type Instant = FuzzInstant;

    fn now(&self) -> FuzzInstant {
        FuzzInstant(Duration::ZERO)
    }

    fn sleep(&self, _duration: Duration) -> impl Future<Output = ()> + Send {
        std::future::ready(())
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum DriverEvent {
    Snapshot { round: u8, finished: bool, hand: Vec<u8> },
    Request { seqnum: u8, timeout_ms: u16, kind: FuzzedKind },
    Submit { seqnum: u8, answer: FuzzedAnswer },
    Tick { timer: u8, advance_ms: u16 },
    CurrentTick { advance_ms: u16 },
    StreamClosed { failed: bool },
    Leave,
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzedKind {
    Turn { playable: Vec<u8> },
    Cost { cost: Option<u8>, providers: Vec<(u8, Option<u8>)> },
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzedAnswer {
    PlayCard(u8),
    EndTurn,
    PayCost(Vec<u8>),
    Empty,
}

fn entity(raw: u8) -> EntityId {
    EntityId(u32::from(raw % 16))
}

fn request(seqnum: u8, timeout_ms: u16, kind: &FuzzedKind) -> RequestUserEvent {
    let kind = match kind {
        FuzzedKind::Turn { playable } => {
            RequestKind::TurnAction { playable_cards: playable.iter().copied().map(entity).collect() }
        },
        FuzzedKind::Cost { cost, providers } => RequestKind::CostAction {
            cost: cost.map(|any| Cost { any: u32::from(any % 16) }),
            providers: providers
                .iter()
                .map(|&(raw, amount)| CostProvider {
                    entity: entity(raw),
                    provided: amount.map(|any| Cost { any: u32::from(any % 8) }),
                })
                .collect(),
        },
    };
    RequestUserEvent { seqnum: u64::from(seqnum), timeout_ms: u64::from(timeout_ms), kind }
}

fn answer(fuzzed: &FuzzedAnswer) -> UserEvent {
    match fuzzed {
        FuzzedAnswer::PlayCard(raw) => UserEvent::PlayCard { entity: entity(*raw) },
        FuzzedAnswer::EndTurn => UserEvent::EndTurn,
        FuzzedAnswer::PayCost(raw) => {
            UserEvent::PayCost { providers: raw.iter().copied().map(entity).collect() }
        },
        FuzzedAnswer::Empty => UserEvent::Empty,
    }
}

fuzz_target!(|events: Vec<DriverEvent>| {
    let session = Session::new(AuthToken::new("token:fuzz"), RoomId::new("room-1"), "fuzz");
    let mut driver = SessionDriver::new(FuzzEnv, session);
    let mut now = FuzzInstant(Duration::ZERO);
    let mut answered = false;
    let mut ended = false;

    for event in events {
        let tracked_before = driver.current_request().map(|r| r.seqnum);
        let phase_before = driver.phase();

        let event = match event {
            DriverEvent::Snapshot { round, finished, hand } => {
                SessionEvent::Message(GameEvent::StateUpdate(GameState {
                    round_number: u32::from(round),
                    game_finished: finished,
                    self_hand: hand
                        .iter()
                        .map(|&raw| CardRef { card_id: CardId(u32::from(raw)), entity: entity(raw) })
                        .collect(),
                    ..GameState::default()
                }))
            },
            DriverEvent::Request { seqnum, timeout_ms, kind } => {
                answered = false;
                SessionEvent::Message(GameEvent::RequestUserEvent(request(seqnum, timeout_ms, &kind)))
            },
            DriverEvent::Submit { seqnum, answer: fuzzed } => {
                SessionEvent::Submit { seqnum: u64::from(seqnum), event: answer(&fuzzed) }
            },
            DriverEvent::Tick { timer, advance_ms } => {
                now = FuzzInstant(now.0 + Duration::from_millis(u64::from(advance_ms)));
                SessionEvent::Tick { timer: TimerId(u64::from(timer)), now }
            },
            DriverEvent::CurrentTick { advance_ms } => {
                now = FuzzInstant(now.0 + Duration::from_millis(u64::from(advance_ms)));
                let timer = driver.active_timer().unwrap_or(TimerId(u64::MAX));
                SessionEvent::Tick { timer, now }
            },
            DriverEvent::StreamClosed { failed } => {
                SessionEvent::StreamClosed { error: failed.then_some(TransportError::Closed) }
            },
            DriverEvent::Leave => SessionEvent::Leave,
        };

        match driver.handle(event) {
            Ok(actions) => {
                assert!(!ended, "event accepted after the session ended");

                let sends: Vec<u64> = actions
                    .iter()
                    .filter_map(|action| match action {
                        SessionAction::Send { seqnum, .. } => Some(*seqnum),
                        _ => None,
                    })
                    .collect();

                assert!(sends.len() <= 1, "several sends for one event: {sends:?}");
                if let Some(&seqnum) = sends.first() {
                    assert_eq!(Some(seqnum), tracked_before, "send for untracked request");
                    assert!(!answered, "request {seqnum} answered twice");
                    assert!(driver.current_request().is_none());
                    answered = true;
                }

                for action in &actions {
                    if let SessionAction::Countdown { seqnum, .. } = action {
                        assert_eq!(Some(*seqnum), tracked_before);
                    }
                }

                ended = actions.iter().any(|a| matches!(a, SessionAction::Ended(_)));
                if ended {
                    assert!(driver.current_request().is_none());
                    assert!(driver.active_timer().is_none());
                }
            },
            Err(ClientError::InvalidResponse(_)) => {
                assert!(!ended);
                assert_eq!(driver.current_request().map(|r| r.seqnum), tracked_before);
            },
            Err(error) => {
                assert!(ended, "unexpected error before end: {error}");
                assert!(matches!(error, ClientError::SessionEnded));
            },
        }

        if phase_before == Phase::Finished {
            assert_eq!(driver.phase(), Phase::Finished, "left Finished phase");
        }
    }
});
