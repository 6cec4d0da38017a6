//! In-memory scripted game server.
//!
//! Implements the client's transport traits directly, without a wire. Tests
//! push stream messages, end or fail the stream, and inspect what the client
//! submitted.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use credo_client::{
    AuthToken, CardService, GameTransport, RoomId, RoomService, Session, StreamItem, Subscription,
    TransportError,
};
use credo_proto::{CardId, CardPrototype, GameEvent, UserEvent};
use tokio::sync::{Notify, mpsc};

/// One `submit_user_event` call seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Room the submission was addressed to.
    pub room_id: String,
    /// Request answered.
    pub seqnum: u64,
    /// The answer.
    pub event: UserEvent,
}

#[derive(Default)]
struct ServerState {
    next_room: u32,
    rooms: BTreeMap<String, RoomId>,
    refused_rooms: BTreeSet<String>,
    prototypes: BTreeMap<CardId, CardPrototype>,
    stream: Option<mpsc::Sender<StreamItem>>,
    submissions: Vec<Submission>,
    fail_submissions: bool,
}

/// Scripted in-memory server. Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedServer {
    state: Arc<Mutex<ServerState>>,
    submitted: Arc<Notify>,
}

impl ScriptedServer {
    /// Create a server with no rooms.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve these card prototypes.
    #[must_use]
    pub fn with_prototypes(self, prototypes: BTreeMap<CardId, CardPrototype>) -> Self {
        self.lock().prototypes = prototypes;
        self
    }

    /// Refuse joins to `room_name`.
    pub fn refuse_room(&self, room_name: &str) {
        self.lock().refused_rooms.insert(room_name.to_string());
    }

    /// Make every later submission fail with [`TransportError::Closed`].
    pub fn fail_submissions(&self, fail: bool) {
        self.lock().fail_submissions = fail;
    }

    /// Deliver a message on the open stream.
    ///
    /// Returns false if no client is subscribed.
    pub async fn push(&self, event: GameEvent) -> bool {
        self.push_item(Ok(event)).await
    }

    /// Fail the open stream with `error`.
    pub async fn fail_stream(&self, error: TransportError) -> bool {
        let delivered = self.push_item(Err(error)).await;
        self.lock().stream = None;
        delivered
    }

    /// End the open stream cleanly.
    pub fn close_stream(&self) {
        self.lock().stream = None;
    }

    async fn push_item(&self, item: StreamItem) -> bool {
        let Some(stream) = self.lock().stream.clone() else {
            return false;
        };
        stream.send(item).await.is_ok()
    }

    /// Whether a client holds the stream open.
    pub fn is_subscribed(&self) -> bool {
        self.lock().stream.as_ref().is_some_and(|s| !s.is_closed())
    }

    /// Everything submitted so far.
    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    /// Wait until at least `count` submissions arrived, then return them all.
    pub async fn wait_for_submissions(&self, count: usize) -> Vec<Submission> {
        loop {
            let notified = self.submitted.notified();
            {
                let state = self.lock();
                if state.submissions.len() >= count {
                    return state.submissions.clone();
                }
            }
            notified.await;
        }
    }
}

fn token_for(username: &str) -> String {
    format!("token:{username}")
}

#[async_trait]
impl RoomService for ScriptedServer {
    async fn login(&self, username: &str) -> Result<AuthToken, TransportError> {
        if username.is_empty() {
            return Err(TransportError::Rejected { message: "empty username".to_string() });
        }
        Ok(AuthToken::new(token_for(username)))
    }

    async fn join_room(
        &self,
        token: &AuthToken,
        room_name: &str,
    ) -> Result<RoomId, TransportError> {
        if !token.as_str().starts_with("token:") {
            return Err(TransportError::Rejected { message: "invalid token".to_string() });
        }

        let mut state = self.lock();
        if state.refused_rooms.contains(room_name) {
            return Err(TransportError::Rejected { message: format!("room {room_name} is full") });
        }

        if let Some(room_id) = state.rooms.get(room_name) {
            return Ok(room_id.clone());
        }
        state.next_room += 1;
        let room_id = RoomId::new(format!("room-{}", state.next_room));
        state.rooms.insert(room_name.to_string(), room_id.clone());
        Ok(room_id)
    }
}

#[async_trait]
impl CardService for ScriptedServer {
    async fn card_prototypes(&self) -> Result<BTreeMap<CardId, CardPrototype>, TransportError> {
        Ok(self.lock().prototypes.clone())
    }
}

#[async_trait]
impl GameTransport for ScriptedServer {
    async fn enter_game(&self, session: &Session) -> Result<Subscription, TransportError> {
        let mut state = self.lock();
        if !state.rooms.values().any(|id| id == session.room_id()) {
            return Err(TransportError::Rejected { message: "unknown room".to_string() });
        }

        let (tx, subscription) = Subscription::channel(64);
        state.stream = Some(tx);
        Ok(subscription)
    }

    async fn submit_user_event(
        &self,
        session: &Session,
        seqnum: u64,
        event: UserEvent,
    ) -> Result<(), TransportError> {
        {
            let mut state = self.lock();
            if state.fail_submissions {
                return Err(TransportError::Closed);
            }
            state.submissions.push(Submission {
                room_id: session.room_id().to_string(),
                seqnum,
                event,
            });
        }
        self.submitted.notify_waiters();
        Ok(())
    }
}
