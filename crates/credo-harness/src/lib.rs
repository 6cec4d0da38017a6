//! Deterministic simulation harness for the Credo client.
//!
//! - [`SimEnv`]: virtual clock implementing `Environment`
//! - [`ScriptedServer`]: in-memory server implementing the transport traits
//! - [`FramedGameServer`]: wire-level server for one connection, usable over
//!   turmoil's simulated TCP
//! - [`model`]: reference implementation for model-based testing, with
//!   [`RealSession`] wrapping the real driver behind the same interface

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod framed_server;
pub mod model;
pub mod real_session;
pub mod scenario;
pub mod sim_env;
pub mod sim_server;

pub use framed_server::{FramedGameServer, ScriptStep, ServerLog};
pub use model::{
    Choice, ModelSession, ObservableState, Operation, OperationError, OperationResult,
    SmallSnapshot,
};
pub use real_session::RealSession;
pub use scenario::random_game;
pub use sim_env::{SimEnv, SimInstant};
pub use sim_server::{ScriptedServer, Submission};
