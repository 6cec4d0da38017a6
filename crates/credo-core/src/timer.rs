//! Countdown for the deadline of the tracked request.
//!
//! Pure state: the owner feeds it instants, it never reads a clock. At most
//! one countdown is active; starting a new one cancels the old one and hands
//! out a fresh [`TimerId`], so a tick scheduled for the old countdown is
//! recognised as [`TickOutcome::Stale`] even if it was already in flight.
//!
//! # Invariants
//!
//! - At most one active countdown.
//! - `Expired` is returned at most once per [`TimerId`].
//! - Elapsed time is measured between actual tick instants, never assumed
//!   from the nominal tick interval.

use std::{fmt, ops::Sub, time::Duration};

/// Identifies one started countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Result of delivering a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick belongs to a cancelled, expired or replaced countdown.
    Stale,
    /// Countdown still running.
    Running {
        /// Time since the previous tick (or the start).
        elapsed: Duration,
        /// Time left before expiry.
        remaining: Duration,
    },
    /// Remaining time reached zero. The countdown is gone.
    Expired {
        /// Sequence number the countdown was started for.
        seqnum: u64,
    },
}

#[derive(Debug, Clone, Copy)]
struct Countdown<I> {
    id: TimerId,
    seqnum: u64,
    remaining: Duration,
    last_tick: I,
}

/// Single-instance countdown, generic over the instant type so it runs under
/// any [`Environment`](crate::env::Environment).
#[derive(Debug, Clone)]
pub struct CountdownTimer<I> {
    next_id: u64,
    active: Option<Countdown<I>>,
}

impl<I> Default for CountdownTimer<I> {
    fn default() -> Self {
        Self { next_id: 0, active: None }
    }
}

impl<I> CountdownTimer<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a countdown of `timeout` for `seqnum`, cancelling any running one.
    pub fn start(&mut self, seqnum: u64, timeout: Duration, now: I) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.active = Some(Countdown { id, seqnum, remaining: timeout, last_tick: now });
        id
    }

    /// Deliver a tick for `timer` observed at `now`.
    pub fn tick(&mut self, timer: TimerId, now: I) -> TickOutcome {
        let Some(countdown) = self.active.as_mut().filter(|c| c.id == timer) else {
            return TickOutcome::Stale;
        };

        // Out-of-order instants count as no time passing.
        let elapsed = if now > countdown.last_tick { now - countdown.last_tick } else { Duration::ZERO };
        countdown.last_tick = countdown.last_tick.max(now);
        countdown.remaining = countdown.remaining.saturating_sub(elapsed);

        if countdown.remaining.is_zero() {
            let seqnum = countdown.seqnum;
            self.active = None;
            TickOutcome::Expired { seqnum }
        } else {
            TickOutcome::Running { elapsed, remaining: countdown.remaining }
        }
    }

    /// Cancel the running countdown without expiring it.
    ///
    /// Returns the cancelled id, if any.
    pub fn stop(&mut self) -> Option<TimerId> {
        self.active.take().map(|c| c.id)
    }

    /// Id of the running countdown.
    pub fn active(&self) -> Option<TimerId> {
        self.active.as_ref().map(|c| c.id)
    }

    /// Sequence number the running countdown belongs to.
    pub fn seqnum(&self) -> Option<u64> {
        self.active.as_ref().map(|c| c.seqnum)
    }

    /// Time left on the running countdown.
    pub fn remaining(&self) -> Option<Duration> {
        self.active.as_ref().map(|c| c.remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct TestInstant(Duration);

    impl Sub for TestInstant {
        type Output = Duration;

        fn sub(self, other: Self) -> Duration {
            self.0.saturating_sub(other.0)
        }
    }

    fn at(ms: u64) -> TestInstant {
        TestInstant(Duration::from_millis(ms))
    }

    #[test]
    fn reports_actual_elapsed_time() {
        let mut timer = CountdownTimer::new();
        let id = timer.start(5, Duration::from_millis(1000), at(0));

        assert_eq!(
            timer.tick(id, at(130)),
            TickOutcome::Running {
                elapsed: Duration::from_millis(130),
                remaining: Duration::from_millis(870)
            }
        );
        assert_eq!(
            timer.tick(id, at(210)),
            TickOutcome::Running {
                elapsed: Duration::from_millis(80),
                remaining: Duration::from_millis(790)
            }
        );
    }

    #[test]
    fn expires_exactly_once() {
        let mut timer = CountdownTimer::new();
        let id = timer.start(9, Duration::from_millis(200), at(0));

        assert!(matches!(timer.tick(id, at(100)), TickOutcome::Running { .. }));
        assert_eq!(timer.tick(id, at(250)), TickOutcome::Expired { seqnum: 9 });
        assert_eq!(timer.tick(id, at(300)), TickOutcome::Stale);
        assert_eq!(timer.active(), None);
    }

    #[test]
    fn restart_makes_old_ticks_stale() {
        let mut timer = CountdownTimer::new();
        let first = timer.start(1, Duration::from_millis(100), at(0));
        let second = timer.start(2, Duration::from_millis(500), at(50));

        assert_ne!(first, second);
        assert_eq!(timer.active(), Some(second));
        assert_eq!(timer.tick(first, at(200)), TickOutcome::Stale);
        assert_eq!(timer.seqnum(), Some(2));
        assert!(matches!(timer.tick(second, at(200)), TickOutcome::Running { .. }));
    }

    #[test]
    fn stop_cancels_without_expiry() {
        let mut timer = CountdownTimer::new();
        let id = timer.start(3, Duration::from_millis(100), at(0));

        assert_eq!(timer.stop(), Some(id));
        assert_eq!(timer.tick(id, at(1000)), TickOutcome::Stale);
        assert_eq!(timer.stop(), None);
    }

    #[test]
    fn zero_timeout_expires_on_first_tick() {
        let mut timer = CountdownTimer::new();
        let id = timer.start(4, Duration::ZERO, at(10));

        assert_eq!(timer.tick(id, at(10)), TickOutcome::Expired { seqnum: 4 });
    }

    #[test]
    fn backwards_instant_counts_as_no_time() {
        let mut timer = CountdownTimer::new();
        let id = timer.start(4, Duration::from_millis(100), at(50));

        assert_eq!(
            timer.tick(id, at(20)),
            TickOutcome::Running { elapsed: Duration::ZERO, remaining: Duration::from_millis(100) }
        );
    }
}
