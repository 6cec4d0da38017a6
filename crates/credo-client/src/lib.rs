//! Credo Client
//!
//! Action-based session driver plus the async pieces that run it.
//!
//! ## Architecture
//!
//! ```text
//! credo-client
//!   ├─ GameClient        (login → join → enter game)
//!   ├─ SessionHandle     (owner's end of a running session)
//!   ├─ session loop      (select! over stream, ticks, commands)
//!   │    ├─ SessionDriver   (Sans-IO protocol state machine)
//!   │    ├─ Ticker          (owned countdown task)
//!   │    └─ Subscription    (game stream, cancelled on drop)
//!   ├─ FramedTransport   (CBOR frames over any async byte stream)
//!   └─ SystemEnv         (tokio clock)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod client;
mod config;
mod driver;
mod error;
mod event;
mod framed;
mod runtime;
mod session;
mod system_env;
mod ticker;
mod transport;

pub use catalog::CardCatalog;
pub use client::GameClient;
pub use config::{SessionConfig, TransportConfig};
pub use driver::SessionDriver;
pub use error::{ClientError, TransportError};
pub use event::{EndReason, LogLevel, SessionAction, SessionEvent, SessionUpdate};
pub use framed::FramedTransport;
pub use runtime::SessionHandle;
pub use session::{AuthToken, RoomId, Session};
pub use system_env::SystemEnv;
pub use ticker::{Tick, Ticker};
pub use transport::{CardService, GameTransport, RoomService, StreamItem, Subscription};
