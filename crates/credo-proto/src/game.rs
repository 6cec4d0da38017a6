//! Game state snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a card instance (or any other game entity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier of a card prototype (what the card is, not which copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A visible card: its prototype and the entity carrying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardRef {
    /// Card prototype.
    pub card_id: CardId,
    /// Entity in the game world.
    pub entity: EntityId,
}

/// Full authoritative game view from one player's perspective.
///
/// A snapshot is never a delta. Fields absent on the wire decode to their
/// defaults so that replacing the held state with a new snapshot cannot
/// leave a value from an earlier one behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    /// Server debug log, oldest first.
    pub debug_log: Vec<String>,
    /// Our hand, left to right.
    pub self_hand: Vec<CardRef>,
    /// Number of cards in the opponent's hand.
    pub other_hand_count: u32,
    /// Cards left in our deck.
    pub self_deck_count: u32,
    /// Cards left in the opponent's deck.
    pub other_deck_count: u32,
    /// Current round.
    pub round_number: u32,
    /// Whether the current turn is ours.
    pub is_my_turn: bool,
    /// Whether the game has ended.
    pub game_finished: bool,
    /// Our faith cards.
    pub self_faith: Vec<CardRef>,
    /// The opponent's faith cards.
    pub other_faith: Vec<CardRef>,
}

impl GameState {
    /// Finds a card in our hand by entity.
    pub fn hand_card(&self, entity: EntityId) -> Option<&CardRef> {
        self.self_hand.iter().find(|card| card.entity == entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct PartialState {
        round_number: u32,
        is_my_turn: bool,
    }

    #[test]
    fn missing_fields_decode_to_defaults() {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&PartialState { round_number: 3, is_my_turn: true }, &mut bytes)
            .expect("encode");

        let state: GameState = ciborium::de::from_reader(&bytes[..]).expect("decode");

        assert_eq!(state.round_number, 3);
        assert!(state.is_my_turn);
        assert!(state.self_hand.is_empty());
        assert_eq!(state.other_deck_count, 0);
        assert!(!state.game_finished);
    }

    #[test]
    fn hand_card_lookup() {
        let state = GameState {
            self_hand: vec![
                CardRef { card_id: CardId(7001), entity: EntityId(10) },
                CardRef { card_id: CardId(7002), entity: EntityId(11) },
            ],
            ..GameState::default()
        };

        assert_eq!(state.hand_card(EntityId(11)).map(|c| c.card_id), Some(CardId(7002)));
        assert!(state.hand_card(EntityId(12)).is_none());
    }
}
