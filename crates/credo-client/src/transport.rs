//! Transport seams.
//!
//! The client reaches the server through three traits: [`RoomService`] for
//! login and room membership, [`CardService`] for card metadata and
//! [`GameTransport`] for the game stream and submissions. Implementations
//! map these calls onto a concrete wire.

use std::collections::BTreeMap;

use async_trait::async_trait;
use credo_proto::{CardId, CardPrototype, GameEvent, UserEvent};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    error::TransportError,
    session::{AuthToken, RoomId, Session},
};

/// Login and room membership.
#[async_trait]
pub trait RoomService: Send + Sync {
    /// Obtain a token for `username`.
    async fn login(&self, username: &str) -> Result<AuthToken, TransportError>;

    /// Join (or create) the room called `room_name`.
    ///
    /// A refused join is [`TransportError::Rejected`] carrying the server's
    /// message.
    async fn join_room(&self, token: &AuthToken, room_name: &str)
    -> Result<RoomId, TransportError>;
}

/// Card metadata.
#[async_trait]
pub trait CardService: Send + Sync {
    /// Display metadata for every card prototype.
    async fn card_prototypes(&self) -> Result<BTreeMap<CardId, CardPrototype>, TransportError>;
}

/// Game stream and submissions.
#[async_trait]
pub trait GameTransport: Send + Sync {
    /// Open the game stream of the joined room.
    async fn enter_game(&self, session: &Session) -> Result<Subscription, TransportError>;

    /// Answer request `seqnum`. Fire-and-forget: no reply beyond delivery.
    async fn submit_user_event(
        &self,
        session: &Session,
        seqnum: u64,
        event: UserEvent,
    ) -> Result<(), TransportError>;
}

/// Item delivered by a [`Subscription`].
pub type StreamItem = Result<GameEvent, TransportError>;

/// Receiving end of one game stream.
///
/// Closing or dropping the subscription stops delivery and aborts the task
/// feeding it, so the producer observes the cancellation.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<StreamItem>,
    pump: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Create a subscription and the sender that feeds it.
    pub fn channel(capacity: usize) -> (mpsc::Sender<StreamItem>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { events: rx, pump: None })
    }

    /// Attach the task producing events. It is aborted when the subscription
    /// closes.
    #[must_use]
    pub fn with_pump(mut self, pump: JoinHandle<()>) -> Self {
        self.pump = Some(pump);
        self
    }

    /// Next stream item. `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<StreamItem> {
        self.events.recv().await
    }

    /// Stop receiving. Buffered items are discarded.
    pub fn close(&mut self) {
        self.events.close();
        while self.events.try_recv().is_ok() {}
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}
