//! Server-issued prompts for a client decision.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::game::EntityId;

/// Deadline used when a request arrives without one.
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Amount required to pay for something, or contributed by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    /// Generic amount that any provider can pay.
    pub any: u32,
}

impl Cost {
    /// Cost assumed when a cost action omits its requirement.
    pub const IMPLICIT: Self = Self { any: 1 };
}

/// An entity that can contribute toward a cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostProvider {
    /// Providing entity.
    pub entity: EntityId,
    /// What it contributes. Missing means nothing.
    #[serde(default)]
    pub provided: Option<Cost>,
}

impl CostProvider {
    /// Generic amount this provider contributes.
    pub fn contribution(&self) -> u32 {
        self.provided.map_or(0, |cost| cost.any)
    }
}

/// Payload of a [`RequestUserEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Our turn: play one of these cards or end the turn.
    TurnAction {
        /// Entities that may be played.
        playable_cards: Vec<EntityId>,
    },

    /// Choose providers that pay exactly `cost`.
    CostAction {
        /// Requirement. Missing means [`Cost::IMPLICIT`].
        #[serde(default)]
        cost: Option<Cost>,
        /// Everything that may be selected.
        providers: Vec<CostProvider>,
    },
}

impl RequestKind {
    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TurnAction { .. } => "turn_action",
            Self::CostAction { .. } => "cost_action",
        }
    }
}

/// Prompt for a client decision, answered by exactly one submission tagged
/// with `seqnum`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestUserEvent {
    /// Ties the response to this request.
    pub seqnum: u64,
    /// Time the client has to answer, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// What is being asked.
    pub kind: RequestKind,
}

impl RequestUserEvent {
    /// Deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Required cost when this is a cost action.
    pub fn required_cost(&self) -> Option<Cost> {
        match &self.kind {
            RequestKind::CostAction { cost, .. } => Some(cost.unwrap_or(Cost::IMPLICIT)),
            RequestKind::TurnAction { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_without_amount_contributes_nothing() {
        let provider = CostProvider { entity: EntityId(1), provided: None };
        assert_eq!(provider.contribution(), 0);
    }

    #[test]
    fn missing_cost_is_implicit_one() {
        let request = RequestUserEvent {
            seqnum: 1,
            timeout_ms: 1000,
            kind: RequestKind::CostAction { cost: None, providers: vec![] },
        };
        assert_eq!(request.required_cost(), Some(Cost { any: 1 }));
    }

    #[test]
    fn turn_action_has_no_cost() {
        let request = RequestUserEvent {
            seqnum: 1,
            timeout_ms: 1000,
            kind: RequestKind::TurnAction { playable_cards: vec![EntityId(3)] },
        };
        assert_eq!(request.required_cost(), None);
        assert_eq!(request.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn missing_timeout_uses_default() {
        #[derive(Serialize)]
        struct NoTimeout {
            seqnum: u64,
            kind: RequestKind,
        }

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(
            &NoTimeout { seqnum: 9, kind: RequestKind::TurnAction { playable_cards: vec![] } },
            &mut bytes,
        )
        .expect("encode");

        let decoded: RequestUserEvent = ciborium::de::from_reader(&bytes[..]).expect("decode");
        assert_eq!(decoded.seqnum, 9);
        assert_eq!(decoded.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
