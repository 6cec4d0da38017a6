//! Environment abstraction for deterministic testing.
//!
//! Protocol logic never reads the clock directly. It receives instants from
//! an [`Environment`], so the same code runs against tokio time in production
//! and a virtual clock in simulation.
//!
//! # Invariants
//!
//! - Monotonicity: `env.now()` must never go backwards
//! - Isolation: implementations must not share global state

use std::{fmt::Debug, future::Future, ops::Sub, time::Duration};

/// Abstract environment providing time and async sleeping.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Point in time. Subtracting two instants yields the elapsed duration.
    type Instant: Copy + Ord + Send + Sync + Debug + Sub<Output = Duration> + 'static;

    /// Returns the current time.
    ///
    /// # Invariants
    ///
    /// - Monotonicity: subsequent calls return times `>=` previous calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this; state machines take instants as input.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
