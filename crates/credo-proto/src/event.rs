//! Stream messages and client responses.

use serde::{Deserialize, Serialize};

use crate::{
    game::{EntityId, GameState},
    request::RequestUserEvent,
};

/// Message delivered on the game event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    /// Complete replacement of the client's game view.
    StateUpdate(GameState),
    /// The server wants a decision.
    RequestUserEvent(RequestUserEvent),
}

/// Client response to a [`RequestUserEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserEvent {
    /// Play a card from hand.
    PlayCard {
        /// Card entity being played.
        entity: EntityId,
    },
    /// End the current turn.
    EndTurn,
    /// Pay a cost with the selected providers.
    PayCost {
        /// Selected provider entities, each at most once.
        providers: Vec<EntityId>,
    },
    /// No decision. Sent when the deadline elapses.
    Empty,
}

impl UserEvent {
    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayCard { .. } => "play_card",
            Self::EndTurn => "end_turn",
            Self::PayCost { .. } => "pay_cost",
            Self::Empty => "empty",
        }
    }
}
