//! Seeded game scripts.
//!
//! Same seed, same script. Used to check that whole sessions replay
//! identically under simulation.

use std::time::Duration;

use credo_proto::{
    CardId, CardRef, Cost, CostProvider, EntityId, GameEvent, GameState, RequestKind,
    RequestUserEvent,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::framed_server::ScriptStep;

/// Longest pause the script inserts after a request.
pub const MAX_PAUSE: Duration = Duration::from_secs(3);

/// Longest request deadline the script issues.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(2);

fn hand(rng: &mut ChaCha8Rng) -> Vec<CardRef> {
    (0..rng.gen_range(1..=5u32))
        .map(|i| CardRef { card_id: CardId(7000 + rng.gen_range(0..20)), entity: EntityId(10 + i) })
        .collect()
}

/// A game of `requests` rounds, each a snapshot followed by one request and
/// a pause, closed by a finished snapshot once every deadline has passed.
pub fn random_game(seed: u64, requests: u32) -> Vec<ScriptStep> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut steps = Vec::new();

    for round in 1..=requests {
        let self_hand = hand(&mut rng);
        let entities: Vec<EntityId> = self_hand.iter().map(|c| c.entity).collect();

        steps.push(ScriptStep::Send(GameEvent::StateUpdate(GameState {
            debug_log: vec![format!("round {round} begins")],
            self_hand,
            other_hand_count: rng.gen_range(0..7),
            self_deck_count: rng.gen_range(0..30),
            other_deck_count: rng.gen_range(0..30),
            round_number: round,
            is_my_turn: true,
            ..GameState::default()
        })));

        let kind = if rng.gen_bool(0.5) {
            RequestKind::TurnAction {
                playable_cards: entities.into_iter().filter(|_| rng.gen_bool(0.6)).collect(),
            }
        } else {
            RequestKind::CostAction {
                cost: rng.gen_bool(0.8).then(|| Cost { any: rng.gen_range(0..4) }),
                providers: entities
                    .into_iter()
                    .map(|entity| CostProvider {
                        entity,
                        provided: Some(Cost { any: rng.gen_range(0..3) }),
                    })
                    .collect(),
            }
        };

        steps.push(ScriptStep::Send(GameEvent::RequestUserEvent(RequestUserEvent {
            seqnum: u64::from(round),
            timeout_ms: rng.gen_range(100..=millis(MAX_TIMEOUT)),
            kind,
        })));
        steps.push(ScriptStep::Pause(Duration::from_millis(rng.gen_range(0..=millis(MAX_PAUSE)))));
    }

    steps.push(ScriptStep::Pause(MAX_TIMEOUT * 2));
    steps.push(ScriptStep::Send(GameEvent::StateUpdate(GameState {
        debug_log: vec!["game over".to_string()],
        round_number: requests + 1,
        game_finished: true,
        ..GameState::default()
    })));
    steps
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(steps: &[ScriptStep]) -> Vec<String> {
        steps.iter().map(|s| format!("{s:?}")).collect()
    }

    #[test]
    fn same_seed_same_script() {
        assert_eq!(summary(&random_game(7, 5)), summary(&random_game(7, 5)));
        assert_ne!(summary(&random_game(7, 5)), summary(&random_game(8, 5)));
    }

    #[test]
    fn ends_with_finished_snapshot() {
        let steps = random_game(1, 3);
        assert!(matches!(
            steps.last(),
            Some(ScriptStep::Send(GameEvent::StateUpdate(state))) if state.game_finished
        ));
        assert_eq!(steps.len(), 3 * 3 + 2);
    }
}
