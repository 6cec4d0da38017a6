//! Credo Protocol
//!
//! Wire types shared by the game server and its clients.
//!
//! # Message flow
//!
//! ```text
//! client                                   server
//!   │ Login { username } ───────────────────▶ │
//!   │ ◀─────────────────── LoginReply { token }│
//!   │ JoinRoom { token, room_name } ────────▶ │
//!   │ ◀────────── JoinRoomReply { room_id }    │
//!   │ EnterGame { token, room_id } ─────────▶ │
//!   │ ◀──────────── Event(StateUpdate)         │
//!   │ ◀──────────── Event(RequestUserEvent)    │
//!   │ SubmitUserEvent { seqnum, event } ────▶ │
//! ```
//!
//! Every message travels in a [`frame`]: a 4-byte big-endian length followed
//! by a CBOR body.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod event;
pub mod frame;
pub mod game;
pub mod messages;
pub mod request;

pub use event::{GameEvent, UserEvent};
pub use frame::{FrameError, HEADER_LEN, MAX_FRAME_LEN, decode, decode_payload, encode, payload_len};
pub use game::{CardId, CardRef, EntityId, GameState};
pub use messages::{CardPrototype, ClientMessage, ServerMessage};
pub use request::{Cost, CostProvider, DEFAULT_TIMEOUT_MS, RequestKind, RequestUserEvent};
