//! Owned countdown ticker.
//!
//! One tokio task that sleeps for the tick interval and reports
//! `(timer, now)` until it is stopped. There is never more than one task per
//! ticker: [`Ticker::restart`] aborts the running task before spawning the
//! next, and dropping the ticker aborts it too.

use std::time::Duration;

use credo_core::{Environment, TimerId};
use tokio::{sync::mpsc, task::JoinHandle};

/// A tick delivered to the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick<I> {
    /// Countdown the tick belongs to.
    pub timer: TimerId,
    /// When the tick fired.
    pub now: I,
}

/// Cancellable periodic task feeding ticks into a channel.
pub struct Ticker<E: Environment> {
    env: E,
    interval: Duration,
    ticks: mpsc::UnboundedSender<Tick<E::Instant>>,
    task: Option<JoinHandle<()>>,
}

impl<E: Environment> Ticker<E> {
    /// Create an idle ticker and the receiving end of its ticks.
    pub fn new(env: E, interval: Duration) -> (Self, mpsc::UnboundedReceiver<Tick<E::Instant>>) {
        let (ticks, rx) = mpsc::unbounded_channel();
        (Self { env, interval, ticks, task: None }, rx)
    }

    /// Cancel the running task, if any, and start ticking for `timer`.
    pub fn restart(&mut self, timer: TimerId) {
        self.stop();

        let env = self.env.clone();
        let ticks = self.ticks.clone();
        let interval = self.interval;

        self.task = Some(tokio::spawn(async move {
            loop {
                env.sleep(interval).await;
                if ticks.send(Tick { timer, now: env.now() }).is_err() {
                    break;
                }
            }
        }));
    }

    /// Abort the running task.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether a task is ticking.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl<E: Environment> Drop for Ticker<E> {
    fn drop(&mut self) {
        self.stop();
    }
}
