//! Session loop.
//!
//! Owns one [`SessionDriver`], its [`Subscription`] and its [`Ticker`], and
//! multiplexes stream messages, ticks and user commands into the driver one
//! at a time. Actions returned by the driver are executed here: submissions
//! go to the transport, logs go to `tracing`, everything the owner needs to
//! see is published through [`SessionHandle`].
//!
//! # Teardown
//!
//! The loop ends on [`SessionAction::Ended`]. Returning drops the
//! subscription and the ticker, which cancels the stream and the timer task.
//! [`SessionHandle::close`] waits for that to happen; dropping the handle
//! aborts the loop, which drops the same resources.

use std::sync::Arc;

use credo_core::Environment;
use credo_proto::{GameState, RequestUserEvent, UserEvent};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    config::SessionConfig,
    driver::SessionDriver,
    error::ClientError,
    event::{EndReason, LogLevel, SessionAction, SessionEvent, SessionUpdate},
    session::Session,
    ticker::{Tick, Ticker},
    transport::{GameTransport, Subscription},
};

#[derive(Debug)]
enum Command {
    Submit { seqnum: u64, event: UserEvent },
    Leave,
}

/// Owner's end of a running session.
///
/// Presentation code reads through [`state`](Self::state) and
/// [`current_request`](Self::current_request); it never writes the session's
/// state directly.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    updates: mpsc::UnboundedReceiver<SessionUpdate>,
    state: watch::Receiver<Option<GameState>>,
    request: watch::Receiver<Option<RequestUserEvent>>,
    task: Option<JoinHandle<EndReason>>,
}

impl SessionHandle {
    /// Answer request `seqnum`.
    ///
    /// Returns immediately. The outcome arrives as a [`SessionUpdate`]:
    /// `Submitted`, `SubmitFailed` or `Rejected`. Answers for a request that
    /// is no longer tracked are dropped without an update.
    pub fn submit(&self, seqnum: u64, event: UserEvent) -> Result<(), ClientError> {
        self.commands.send(Command::Submit { seqnum, event }).map_err(|_| ClientError::SessionEnded)
    }

    /// Ask the session to end. The loop finishes with [`EndReason::Left`].
    pub fn leave(&self) {
        let _ = self.commands.send(Command::Leave);
    }

    /// Next update. `None` after the loop has finished and all updates were
    /// read.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        self.updates.recv().await
    }

    /// Latest snapshot.
    pub fn state(&self) -> Option<GameState> {
        self.state.borrow().clone()
    }

    /// True until the first snapshot arrives.
    pub fn is_waiting(&self) -> bool {
        self.state.borrow().is_none()
    }

    /// Request waiting for an answer.
    pub fn current_request(&self) -> Option<RequestUserEvent> {
        self.request.borrow().clone()
    }

    /// Watch the latest snapshot.
    pub fn watch_state(&self) -> watch::Receiver<Option<GameState>> {
        self.state.clone()
    }

    /// End the session and wait for teardown to complete.
    ///
    /// Returns why the session ended; if the stream ended first, that reason
    /// is reported rather than [`EndReason::Left`].
    pub async fn close(mut self) -> EndReason {
        let _ = self.commands.send(Command::Leave);
        match self.task.take() {
            Some(task) => task.await.unwrap_or(EndReason::Left),
            None => EndReason::Left,
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn the loop for an entered game.
pub(crate) fn spawn<E, T>(
    env: E,
    config: &SessionConfig,
    session: Session,
    subscription: Subscription,
    transport: Arc<T>,
    live: Arc<()>,
) -> SessionHandle
where
    E: Environment,
    T: GameTransport + 'static,
{
    let (commands_tx, commands) = mpsc::unbounded_channel();
    let (updates, updates_rx) = mpsc::unbounded_channel();
    let (state, state_rx) = watch::channel(None);
    let (request, request_rx) = watch::channel(None);
    let (ticker, ticks) = Ticker::new(env.clone(), config.tick_interval);

    let session_loop = SessionLoop {
        driver: SessionDriver::new(env, session),
        transport,
        ticker,
        updates,
        state,
        request,
        _live: live,
    };
    let task = tokio::spawn(session_loop.run(subscription, ticks, commands));

    SessionHandle {
        commands: commands_tx,
        updates: updates_rx,
        state: state_rx,
        request: request_rx,
        task: Some(task),
    }
}

struct SessionLoop<E: Environment, T> {
    driver: SessionDriver<E>,
    transport: Arc<T>,
    ticker: Ticker<E>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
    state: watch::Sender<Option<GameState>>,
    request: watch::Sender<Option<RequestUserEvent>>,
    /// Released when the loop is dropped, so the client may enter again.
    _live: Arc<()>,
}

impl<E, T> SessionLoop<E, T>
where
    E: Environment,
    T: GameTransport + 'static,
{
    async fn run(
        mut self,
        mut subscription: Subscription,
        mut ticks: mpsc::UnboundedReceiver<Tick<E::Instant>>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> EndReason {
        tracing::info!(room = %self.driver.session().room_id(), "session started");

        loop {
            let event = tokio::select! {
                biased;

                item = subscription.next() => match item {
                    Some(Ok(message)) => SessionEvent::Message(message),
                    Some(Err(error)) => SessionEvent::StreamClosed { error: Some(error) },
                    None => SessionEvent::StreamClosed { error: None },
                },
                command = commands.recv() => match command {
                    Some(Command::Submit { seqnum, event }) => SessionEvent::Submit { seqnum, event },
                    Some(Command::Leave) | None => SessionEvent::Leave,
                },
                Some(tick) = ticks.recv() => SessionEvent::Tick { timer: tick.timer, now: tick.now },
            };

            let submitted = match &event {
                SessionEvent::Submit { seqnum, .. } => Some(*seqnum),
                _ => None,
            };

            let actions = match self.driver.handle(event) {
                Ok(actions) => actions,
                Err(ClientError::InvalidResponse(error)) => {
                    tracing::warn!("rejected response: {error}");
                    if let Some(seqnum) = submitted {
                        let _ = self.updates.send(SessionUpdate::Rejected { seqnum, error });
                    }
                    continue;
                },
                Err(error) => {
                    tracing::error!("session driver failed: {error}");
                    break;
                },
            };

            if let Some(reason) = self.execute(actions).await {
                subscription.close();
                return reason;
            }
        }

        subscription.close();
        self.driver.end_reason().cloned().unwrap_or(EndReason::Left)
    }

    /// Perform driver actions in order. Returns the end reason once the
    /// session is over.
    async fn execute(&mut self, actions: Vec<SessionAction>) -> Option<EndReason> {
        let mut ended = None;

        for action in actions {
            match action {
                SessionAction::StateReplaced { phase } => {
                    let state = self.driver.state().cloned();
                    self.state.send_replace(state.clone());
                    if let Some(state) = state {
                        let _ = self.updates.send(SessionUpdate::State { state, phase });
                    }
                },
                SessionAction::Prompt(request) => {
                    let _ = self.updates.send(SessionUpdate::Prompt(request));
                },
                SessionAction::StartTimer { timer } => self.ticker.restart(timer),
                SessionAction::StopTimer => self.ticker.stop(),
                SessionAction::Countdown { seqnum, remaining } => {
                    let _ = self.updates.send(SessionUpdate::Countdown { seqnum, remaining });
                },
                SessionAction::Send { seqnum, event } => self.submit(seqnum, event).await,
                SessionAction::Ended(reason) => {
                    let _ = self.updates.send(SessionUpdate::Ended(reason.clone()));
                    ended = Some(reason);
                },
                SessionAction::Log { level, message } => {
                    let room = self.driver.session().room_id();
                    match level {
                        LogLevel::Debug => tracing::debug!(%room, "{message}"),
                        LogLevel::Info => tracing::info!(%room, "{message}"),
                        LogLevel::Warn => tracing::warn!(%room, "{message}"),
                        LogLevel::Error => tracing::error!(%room, "{message}"),
                    }
                },
            }
        }

        let current = self.driver.current_request().cloned();
        self.request.send_if_modified(|held| {
            if *held == current {
                false
            } else {
                *held = current;
                true
            }
        });

        ended
    }

    async fn submit(&self, seqnum: u64, event: UserEvent) {
        let result =
            self.transport.submit_user_event(self.driver.session(), seqnum, event.clone()).await;

        let update = match result {
            Ok(()) => SessionUpdate::Submitted { seqnum, event },
            Err(error) => {
                tracing::warn!("submit for request {seqnum} failed: {error}");
                SessionUpdate::SubmitFailed { seqnum, error: error.to_string() }
            },
        };
        let _ = self.updates.send(update);
    }
}
