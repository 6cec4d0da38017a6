//! Local validation of a response before it is sent.
//!
//! A response must fit the request it answers: turn actions accept a
//! playable card or ending the turn, cost actions accept an exact payment.
//! The empty response fits every request.

use credo_proto::{EntityId, RequestKind, RequestUserEvent, UserEvent};
use thiserror::Error;

use crate::cost;

/// Why a response was rejected locally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponseError {
    /// A selected provider is not among the candidates.
    #[error("unknown cost provider: {entity}")]
    UnknownProvider {
        /// Offending entity.
        entity: EntityId,
    },

    /// A provider was selected more than once.
    #[error("cost provider selected twice: {entity}")]
    DuplicateProvider {
        /// Offending entity.
        entity: EntityId,
    },

    /// Selected providers do not add up to the required amount.
    #[error("cost not satisfied: required {required}, provided {provided}")]
    CostNotSatisfied {
        /// Required generic amount.
        required: u64,
        /// Sum of the selection.
        provided: u64,
    },

    /// Card is not in the request's playable set.
    #[error("card {entity} is not playable")]
    UnplayableCard {
        /// Offending entity.
        entity: EntityId,
    },

    /// Response kind does not answer this request kind.
    #[error("{event} does not answer a {request} request")]
    KindMismatch {
        /// Request kind name.
        request: &'static str,
        /// Response kind name.
        event: &'static str,
    },
}

/// Check that `event` is an acceptable answer to `request`.
pub fn validate_response(request: &RequestUserEvent, event: &UserEvent) -> Result<(), ResponseError> {
    match (&request.kind, event) {
        (_, UserEvent::Empty) | (RequestKind::TurnAction { .. }, UserEvent::EndTurn) => Ok(()),

        (RequestKind::TurnAction { playable_cards }, UserEvent::PlayCard { entity }) => {
            if playable_cards.contains(entity) {
                Ok(())
            } else {
                Err(ResponseError::UnplayableCard { entity: *entity })
            }
        },

        (RequestKind::CostAction { providers: candidates, .. }, UserEvent::PayCost { providers }) => {
            let required = request.required_cost().unwrap_or_default();
            validate_payment(required, candidates, providers)
        },

        (kind, event) => {
            Err(ResponseError::KindMismatch { request: kind.name(), event: event.name() })
        },
    }
}

fn validate_payment(
    required: credo_proto::Cost,
    candidates: &[credo_proto::CostProvider],
    selected: &[EntityId],
) -> Result<(), ResponseError> {
    if cost::is_satisfied(required, candidates, selected) {
        return Ok(());
    }

    // Explain the rejection.
    for (index, entity) in selected.iter().enumerate() {
        if !candidates.iter().any(|p| p.entity == *entity) {
            return Err(ResponseError::UnknownProvider { entity: *entity });
        }
        if selected[..index].contains(entity) {
            return Err(ResponseError::DuplicateProvider { entity: *entity });
        }
    }

    Err(ResponseError::CostNotSatisfied {
        required: u64::from(required.any),
        provided: cost::provided_total(candidates, selected).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use credo_proto::{Cost, CostProvider};

    use super::*;

    fn turn(playable: &[u32]) -> RequestUserEvent {
        RequestUserEvent {
            seqnum: 5,
            timeout_ms: 20_000,
            kind: RequestKind::TurnAction {
                playable_cards: playable.iter().copied().map(EntityId).collect(),
            },
        }
    }

    fn pay(cost: Option<u32>, providers: &[(u32, u32)]) -> RequestUserEvent {
        RequestUserEvent {
            seqnum: 6,
            timeout_ms: 20_000,
            kind: RequestKind::CostAction {
                cost: cost.map(|any| Cost { any }),
                providers: providers
                    .iter()
                    .map(|&(entity, any)| CostProvider {
                        entity: EntityId(entity),
                        provided: Some(Cost { any }),
                    })
                    .collect(),
            },
        }
    }

    fn pay_with(ids: &[u32]) -> UserEvent {
        UserEvent::PayCost { providers: ids.iter().copied().map(EntityId).collect() }
    }

    #[test]
    fn turn_action_accepts_playable_card_and_end_turn() {
        let request = turn(&[10, 11]);
        assert_eq!(validate_response(&request, &UserEvent::PlayCard { entity: EntityId(10) }), Ok(()));
        assert_eq!(validate_response(&request, &UserEvent::EndTurn), Ok(()));
        assert_eq!(
            validate_response(&request, &UserEvent::PlayCard { entity: EntityId(12) }),
            Err(ResponseError::UnplayableCard { entity: EntityId(12) })
        );
    }

    #[test]
    fn empty_answers_anything() {
        assert_eq!(validate_response(&turn(&[]), &UserEvent::Empty), Ok(()));
        assert_eq!(validate_response(&pay(Some(3), &[]), &UserEvent::Empty), Ok(()));
    }

    #[test]
    fn mismatched_kind_rejected() {
        assert_eq!(
            validate_response(&turn(&[10]), &pay_with(&[1])),
            Err(ResponseError::KindMismatch { request: "turn_action", event: "pay_cost" })
        );
        assert_eq!(
            validate_response(&pay(None, &[(1, 1)]), &UserEvent::EndTurn),
            Err(ResponseError::KindMismatch { request: "cost_action", event: "end_turn" })
        );
    }

    #[test]
    fn payment_errors_explain_rejection() {
        let request = pay(Some(3), &[(1, 2), (2, 1)]);

        assert_eq!(validate_response(&request, &pay_with(&[1, 2])), Ok(()));
        assert_eq!(
            validate_response(&request, &pay_with(&[1])),
            Err(ResponseError::CostNotSatisfied { required: 3, provided: 2 })
        );
        assert_eq!(
            validate_response(&request, &pay_with(&[1, 2, 99])),
            Err(ResponseError::UnknownProvider { entity: EntityId(99) })
        );
        assert_eq!(
            validate_response(&request, &pay_with(&[2, 2, 2])),
            Err(ResponseError::DuplicateProvider { entity: EntityId(2) })
        );
    }

    #[test]
    fn missing_cost_requires_one() {
        let request = pay(None, &[(1, 1), (2, 2)]);
        assert_eq!(validate_response(&request, &pay_with(&[1])), Ok(()));
        assert_eq!(
            validate_response(&request, &pay_with(&[2])),
            Err(ResponseError::CostNotSatisfied { required: 1, provided: 2 })
        );
    }
}
