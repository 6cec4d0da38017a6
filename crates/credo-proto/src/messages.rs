//! Request and reply envelopes exchanged over a connection.
//!
//! # Security
//!
//! - **Debug Redaction**: messages carrying an authentication token implement
//!   `Debug` by hand and print `<redacted N bytes>` instead of the token.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    event::{GameEvent, UserEvent},
    game::CardId,
};

/// Display metadata for a card prototype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPrototype {
    /// Card name.
    pub name: String,
    /// Rules text.
    pub description: String,
}

/// Message sent by a client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientMessage {
    /// Obtain a token for `username`.
    Login {
        /// Player name.
        username: String,
    },
    /// Join (or create) a room by display name.
    JoinRoom {
        /// Token from [`ServerMessage::LoginReply`].
        token: String,
        /// Client-chosen room name.
        room_name: String,
    },
    /// Subscribe to the game stream of a joined room.
    ///
    /// After this message the connection carries [`ServerMessage::Event`]
    /// frames until the game ends.
    EnterGame {
        /// Token from [`ServerMessage::LoginReply`].
        token: String,
        /// Room identifier from [`ServerMessage::JoinRoomReply`].
        room_id: String,
    },
    /// Answer a pending request.
    SubmitUserEvent {
        /// Token from [`ServerMessage::LoginReply`].
        token: String,
        /// Room identifier.
        room_id: String,
        /// Sequence number of the request being answered.
        seqnum: u64,
        /// The decision.
        event: UserEvent,
    },
    /// Fetch display metadata for every card.
    GetCardPrototypes,
}

fn redacted(token: &str) -> String {
    format!("<redacted {} bytes>", token.len())
}

impl std::fmt::Debug for ClientMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login { username } => f.debug_struct("Login").field("username", username).finish(),
            Self::JoinRoom { token, room_name } => f
                .debug_struct("JoinRoom")
                .field("token", &redacted(token))
                .field("room_name", room_name)
                .finish(),
            Self::EnterGame { token, room_id } => f
                .debug_struct("EnterGame")
                .field("token", &redacted(token))
                .field("room_id", room_id)
                .finish(),
            Self::SubmitUserEvent { token, room_id, seqnum, event } => f
                .debug_struct("SubmitUserEvent")
                .field("token", &redacted(token))
                .field("room_id", room_id)
                .field("seqnum", seqnum)
                .field("event", event)
                .finish(),
            Self::GetCardPrototypes => f.write_str("GetCardPrototypes"),
        }
    }
}

/// Message sent by the server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to [`ClientMessage::Login`].
    LoginReply {
        /// Greeting.
        message: String,
        /// Opaque authentication token.
        token: String,
    },
    /// Reply to [`ClientMessage::JoinRoom`].
    JoinRoomReply {
        /// Whether the join succeeded.
        success: bool,
        /// Human-readable outcome.
        message: String,
        /// Assigned room identifier (empty on failure).
        room_id: String,
    },
    /// Reply to [`ClientMessage::GetCardPrototypes`].
    CardPrototypes {
        /// Metadata by card prototype.
        prototypes: BTreeMap<CardId, CardPrototype>,
    },
    /// One message of the game stream.
    Event(GameEvent),
    /// Request failed.
    Error {
        /// Reason.
        message: String,
    },
}

impl std::fmt::Debug for ServerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoginReply { message, token } => f
                .debug_struct("LoginReply")
                .field("message", message)
                .field("token", &redacted(token))
                .finish(),
            Self::JoinRoomReply { success, message, room_id } => f
                .debug_struct("JoinRoomReply")
                .field("success", success)
                .field("message", message)
                .field("room_id", room_id)
                .finish(),
            Self::CardPrototypes { prototypes } => {
                f.debug_struct("CardPrototypes").field("count", &prototypes.len()).finish()
            },
            Self::Event(event) => f.debug_tuple("Event").field(event).finish(),
            Self::Error { message } => f.debug_struct("Error").field("message", message).finish(),
        }
    }
}
