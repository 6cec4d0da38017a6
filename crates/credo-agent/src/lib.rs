//! Credo auto-player.
//!
//! Answers every request with the first legal move it can find: the first
//! playable card, otherwise end the turn; for costs, any exact payment,
//! otherwise an empty answer that the server treats like a timeout.
//!
//! ## Architecture
//!
//! ```text
//! credo-agent
//!   ├─ AutoPlayer   (request → answer, pure; play drives a session)
//!   └─ main         (TCP → FramedTransport → GameClient → session loop)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use credo_client::{CardCatalog, EndReason, SessionHandle, SessionUpdate};
use credo_core::cost;
use credo_proto::{EntityId, GameState, RequestKind, RequestUserEvent, UserEvent};

/// Stateless request answerer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPlayer;

impl AutoPlayer {
    /// Pick an answer for `request`. The answer always passes
    /// [`validate_response`](credo_core::validate_response).
    pub fn decide(&self, request: &RequestUserEvent) -> UserEvent {
        match &request.kind {
            RequestKind::TurnAction { playable_cards } => playable_cards
                .first()
                .map_or(UserEvent::EndTurn, |&entity| UserEvent::PlayCard { entity }),
            RequestKind::CostAction { providers, .. } => {
                let Some(required) = request.required_cost() else {
                    return UserEvent::Empty;
                };
                cost::find_exact_selection(required, providers)
                    .map_or(UserEvent::Empty, |providers| UserEvent::PayCost { providers })
            },
        }
    }

    /// Answer every prompt of `handle` until the session ends.
    ///
    /// Returns the end reason, or `None` if the loop stopped without
    /// reporting one. An answer that finds the session already gone is
    /// skipped; the `Ended` update that follows carries the reason.
    pub async fn play(&self, handle: &mut SessionHandle, catalog: &CardCatalog) -> Option<EndReason> {
        while let Some(update) = handle.next_update().await {
            match update {
                SessionUpdate::State { state, phase } => {
                    tracing::info!(
                        "round {} ({phase:?}): {} cards in hand, {} in deck",
                        state.round_number,
                        state.self_hand.len(),
                        state.self_deck_count,
                    );
                },
                SessionUpdate::Prompt(request) => {
                    let answer = self.decide(&request);
                    if let (UserEvent::PlayCard { entity }, Some(state)) = (&answer, handle.state()) {
                        tracing::info!("playing {}", card_name(catalog, &state, *entity));
                    }
                    if let Err(error) = handle.submit(request.seqnum, answer) {
                        tracing::debug!("request {} not answered: {error}", request.seqnum);
                    }
                },
                SessionUpdate::Countdown { .. } => {},
                SessionUpdate::Submitted { seqnum, event } => {
                    tracing::debug!("answered request {seqnum} with {}", event.name());
                },
                SessionUpdate::SubmitFailed { seqnum, error } => {
                    tracing::warn!("answer to request {seqnum} was lost: {error}");
                },
                SessionUpdate::Rejected { seqnum, error } => {
                    tracing::warn!("answer to request {seqnum} rejected: {error}");
                },
                SessionUpdate::Ended(reason) => {
                    tracing::info!("Session ended: {reason}");
                    return Some(reason);
                },
            }
        }

        None
    }
}

fn card_name(catalog: &CardCatalog, state: &GameState, entity: EntityId) -> String {
    state
        .hand_card(entity)
        .map_or_else(|| format!("entity {}", entity.0), |card| catalog.display_name(card.card_id))
}
