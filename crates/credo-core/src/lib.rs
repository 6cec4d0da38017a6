//! Credo Core
//!
//! Sans-IO building blocks of the session synchronization core. Nothing in
//! this crate performs I/O or reads a clock; callers pass instants in and act
//! on the values returned.
//!
//! ## Components
//!
//! ```text
//! credo-core
//!   ├─ CountdownTimer    (deadline of the tracked request)
//!   ├─ RequestTracker    (at most one outstanding request)
//!   ├─ cost              (exact payment checks)
//!   ├─ response          (response fits request)
//!   └─ StateReconciler   (full-replace snapshots, phase)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cost;
pub mod env;
pub mod reconciler;
pub mod response;
pub mod timer;
pub mod tracker;

pub use env::Environment;
pub use reconciler::{Phase, StateReconciler};
pub use response::{ResponseError, validate_response};
pub use timer::{CountdownTimer, TickOutcome, TimerId};
pub use tracker::RequestTracker;
