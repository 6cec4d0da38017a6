//! Client entry point.
//!
//! `GameClient` walks the setup sequence (login, join a room, enter the
//! game) and enforces its preconditions. Entering the game hands the
//! joined [`Session`] to a spawned session loop and returns the
//! [`SessionHandle`] that owns it. A client runs at most one session loop
//! at a time.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use credo_core::Environment;
use credo_proto::UserEvent;

use crate::{
    catalog::CardCatalog,
    config::SessionConfig,
    error::ClientError,
    runtime::{self, SessionHandle},
    session::{AuthToken, Session},
    transport::{CardService, GameTransport, RoomService},
};

/// Shown when no room has been joined.
const UNKNOWN_ROOM: &str = "unknown";

/// Game client over a transport `T`.
pub struct GameClient<T> {
    /// Connection to the server, shared with running sessions.
    transport: Arc<T>,

    /// Session runtime configuration.
    config: SessionConfig,

    /// Token from the last successful login.
    token: Option<AuthToken>,

    /// Room joined with that token.
    session: Option<Session>,

    /// Card metadata, fetched on first use.
    catalog: Option<CardCatalog>,

    /// Alive while a session loop is running.
    live: Mutex<Weak<()>>,
}

impl<T> GameClient<T>
where
    T: RoomService + CardService + GameTransport + 'static,
{
    /// Create a client with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a client.
    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config,
            token: None,
            session: None,
            catalog: None,
            live: Mutex::new(Weak::new()),
        }
    }

    /// Log in as `username`. Forgets any joined room.
    pub async fn login(&mut self, username: &str) -> Result<(), ClientError> {
        let token = self.transport.login(username).await?;
        tracing::info!("logged in as {username}");

        self.token = Some(token);
        self.session = None;
        Ok(())
    }

    /// Join (or create) the room called `room_name`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotLoggedIn`] before [`login`](Self::login).
    /// - [`ClientError::Transport`] with
    ///   [`TransportError::Rejected`](crate::TransportError::Rejected) when
    ///   the server refuses the join.
    pub async fn join_room(&mut self, room_name: &str) -> Result<&Session, ClientError> {
        let token = self.token.clone().ok_or(ClientError::NotLoggedIn)?;
        let room_id = self.transport.join_room(&token, room_name).await?;
        tracing::info!("joined room {room_name} ({room_id})");

        Ok(self.session.insert(Session::new(token, room_id, room_name)))
    }

    /// Name of the joined room, or `"unknown"`.
    pub fn room_name(&self) -> &str {
        self.session.as_ref().map_or(UNKNOWN_ROOM, Session::room_name)
    }

    /// The joined room.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Open the game stream of the joined room and start the session loop.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotJoined`] before [`join_room`](Self::join_room).
    /// - [`ClientError::AlreadyEntered`] while an earlier session loop is
    ///   still running.
    /// - [`ClientError::Transport`] if the stream cannot be opened.
    pub async fn enter_game<E: Environment>(&self, env: E) -> Result<SessionHandle, ClientError> {
        let session = self.session.clone().ok_or(ClientError::NotJoined)?;
        let live = self.claim_session()?;
        let subscription = self.transport.enter_game(&session).await?;

        Ok(runtime::spawn(env, &self.config, session, subscription, Arc::clone(&self.transport), live))
    }

    /// True while a session loop started by this client is running.
    pub fn in_game(&self) -> bool {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).strong_count() > 0
    }

    /// Reserve the single session slot. The slot frees itself when the
    /// returned marker drops: with the loop, or here if entering fails.
    fn claim_session(&self) -> Result<Arc<()>, ClientError> {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if live.strong_count() > 0 {
            return Err(ClientError::AlreadyEntered);
        }

        let marker = Arc::new(());
        *live = Arc::downgrade(&marker);
        Ok(marker)
    }

    /// Submit `event` for request `seqnum` directly, bypassing any session
    /// loop.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotJoined`] before [`join_room`](Self::join_room).
    pub async fn submit_user_event(&self, seqnum: u64, event: UserEvent) -> Result<(), ClientError> {
        let session = self.session.as_ref().ok_or(ClientError::NotJoined)?;
        self.transport.submit_user_event(session, seqnum, event).await?;
        Ok(())
    }

    /// Card metadata, fetched once and cached.
    pub async fn card_catalog(&mut self) -> Result<&CardCatalog, ClientError> {
        if self.catalog.is_none() {
            let prototypes = self.transport.card_prototypes().await?;
            tracing::debug!("loaded {} card prototypes", prototypes.len());
            self.catalog = Some(CardCatalog::from(prototypes));
        }

        Ok(self.catalog.get_or_insert_with(CardCatalog::default))
    }
}
