//! Session player - drives one playback session from one clock
//!
//! **Responsibilities:**
//! - Own the `PlaybackSession`, its `Clock`, gallery sync and completion reporter
//! - Serialize user commands and clock ticks through a single task, so a tick
//!   that crosses a step boundary is fully resolved before the next is awaited
//! - Publish `SessionEvent`s on the event bus
//! - Cancel the clock on teardown (no tick after the host navigates away)

use crate::error::{Error, Result};
use crate::playback::clock::Clock;
use crate::playback::completion::CompletionReporter;
use crate::playback::media_sync::MediaSync;
use crate::playback::session::{Command, Effect, PlaybackSession, SessionSnapshot};
use serde::Serialize;
use serene_common::events::{EventBus, PlaybackState, SessionEvent};
use serene_common::time;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument, Span};
use uuid::Uuid;

/// Longest a completed session waits on its completion report
pub const COMPLETION_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a finished session task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub activity_id: String,
    pub completed: bool,
    pub final_step_index: usize,
    /// Clock ticks handled while running
    pub ticks_observed: u64,
}

enum Request {
    Apply(Command, oneshot::Sender<SessionSnapshot>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// Playback driver, consumed by `spawn`
pub struct SessionPlayer<C: Clock> {
    session_id: Uuid,
    activity_id: String,
    session: PlaybackSession,
    clock: C,
    media: MediaSync,
    reporter: CompletionReporter,
    events: EventBus,
    ticks_observed: u64,
}

impl<C: Clock + 'static> SessionPlayer<C> {
    pub fn new(
        activity_id: impl Into<String>,
        session: PlaybackSession,
        clock: C,
        media: MediaSync,
        reporter: CompletionReporter,
        events: EventBus,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            activity_id: activity_id.into(),
            session,
            clock,
            media,
            reporter,
            events,
            ticks_observed: 0,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run the session on its own task and return the controlling handle
    pub fn spawn(self) -> SessionHandle {
        self.spawn_in(Span::current())
    }

    /// `spawn`, with the task's logs recorded under `span`
    pub fn spawn_in(self, span: Span) -> SessionHandle {
        let session_id = self.session_id;
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(requests_rx, cancel.clone()).instrument(span));

        SessionHandle {
            session_id,
            requests: requests_tx,
            cancel,
            task: Some(task),
        }
    }

    async fn run(
        mut self,
        mut requests: mpsc::UnboundedReceiver<Request>,
        cancel: CancellationToken,
    ) -> SessionSummary {
        info!(
            "Session {} ready for activity {} ({} steps)",
            self.session_id,
            self.activity_id,
            self.session.step_count()
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.abandon();
                    break;
                }

                _ = self.clock.tick(), if self.session.is_running() => {
                    self.ticks_observed += 1;
                    self.apply(Command::Tick);
                }

                request = requests.recv() => match request {
                    Some(Request::Apply(command, reply)) => {
                        self.apply(command);
                        let _ = reply.send(self.session.snapshot());
                        if command == Command::Start && self.session.step_count() == 0 {
                            info!(
                                "Activity {} has no steps, nothing to play",
                                self.activity_id
                            );
                            break;
                        }
                    }
                    Some(Request::Snapshot(reply)) => {
                        let _ = reply.send(self.session.snapshot());
                    }
                    None => {
                        debug!("All handles for session {} dropped", self.session_id);
                        self.abandon();
                        break;
                    }
                },
            }

            if self.session.is_complete() {
                self.settle(&mut requests, &cancel).await;
                break;
            }
        }

        self.clock.disarm();
        SessionSummary {
            session_id: self.session_id,
            activity_id: self.activity_id,
            completed: self.session.is_complete(),
            final_step_index: self.session.current_step_index(),
            ticks_observed: self.ticks_observed,
        }
    }

    /// Give the completion report a bounded chance to land
    ///
    /// Requests are still answered meanwhile. Cancellation or the deadline
    /// leaves the sink call running detached.
    async fn settle(
        &mut self,
        requests: &mut mpsc::UnboundedReceiver<Request>,
        cancel: &CancellationToken,
    ) {
        let snapshot = self.session.snapshot();
        let flush = self.reporter.flush();
        tokio::pin!(flush);
        let deadline = tokio::time::sleep(COMPLETION_FLUSH_TIMEOUT);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,
                _ = &mut flush => break,
                _ = &mut deadline => {
                    warn!(
                        "Completion report for {} still pending after {:?}, not waiting",
                        self.activity_id, COMPLETION_FLUSH_TIMEOUT
                    );
                    break;
                }
                Some(request) = requests.recv() => match request {
                    Request::Apply(_, reply) | Request::Snapshot(reply) => {
                        let _ = reply.send(snapshot);
                    }
                },
            }
        }
    }

    /// Run one transition and carry out its effects in order
    fn apply(&mut self, command: Command) {
        let old_state = self.session.state();
        let effects = self.session.apply(command);
        if effects.is_empty() {
            return;
        }

        if old_state == PlaybackState::Idle {
            info!(
                "Session {} started for activity {}",
                self.session_id, self.activity_id
            );
            self.events.emit_lossy(SessionEvent::SessionStarted {
                session_id: self.session_id,
                activity_id: self.activity_id.clone(),
                step_count: self.session.step_count(),
                timestamp: time::now(),
            });
        }

        for effect in effects {
            match effect {
                Effect::ClockArmed => self.clock.arm(),
                Effect::ClockDisarmed => self.clock.disarm(),
                Effect::Countdown { time_left_seconds } => {
                    self.events.emit_lossy(SessionEvent::TimerTick {
                        session_id: self.session_id,
                        step_index: self.session.current_step_index(),
                        time_left_seconds,
                    });
                }
                Effect::StepChanged { from, to } => {
                    debug!("Session {} step {:?} -> {}", self.session_id, from, to);
                    let gallery_position = self.media.sync(to);
                    self.events.emit_lossy(SessionEvent::StepChanged {
                        session_id: self.session_id,
                        step_index: to,
                        step_number: to + 1,
                        time_left_seconds: self.session.time_left_seconds(),
                        gallery_position,
                        timestamp: time::now(),
                    });
                }
                Effect::Completed => {
                    info!(
                        "Session {} completed activity {}",
                        self.session_id, self.activity_id
                    );
                    self.reporter.report(&self.activity_id);
                    self.events.emit_lossy(SessionEvent::SessionCompleted {
                        session_id: self.session_id,
                        activity_id: self.activity_id.clone(),
                        timestamp: time::now(),
                    });
                }
            }
        }

        let new_state = self.session.state();
        if new_state != old_state {
            self.events.emit_lossy(SessionEvent::PlaybackStateChanged {
                session_id: self.session_id,
                old_state,
                new_state,
                timestamp: time::now(),
            });
        }
    }

    fn abandon(&mut self) {
        self.clock.disarm();
        if self.session.is_complete() {
            return;
        }
        info!(
            "Session {} abandoned at step {}",
            self.session_id,
            self.session.current_step_index()
        );
        self.events.emit_lossy(SessionEvent::SessionAbandoned {
            session_id: self.session_id,
            activity_id: self.activity_id.clone(),
            step_index: self.session.current_step_index(),
            timestamp: time::now(),
        });
    }
}

/// Controls a spawned session
///
/// Dropping the handle tears the session down.
pub struct SessionHandle {
    session_id: Uuid,
    requests: mpsc::UnboundedSender<Request>,
    cancel: CancellationToken,
    task: Option<JoinHandle<SessionSummary>>,
}

impl SessionHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub async fn start(&self) -> Result<SessionSnapshot> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<SessionSnapshot> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<SessionSnapshot> {
        self.send(Command::Resume).await
    }

    pub async fn toggle_pause(&self) -> Result<SessionSnapshot> {
        self.send(Command::TogglePause).await
    }

    pub async fn next(&self) -> Result<SessionSnapshot> {
        self.send(Command::Advance).await
    }

    pub async fn previous(&self) -> Result<SessionSnapshot> {
        self.send(Command::Retreat).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(Request::Snapshot(tx))
            .map_err(|_| self.closed())?;
        rx.await.map_err(|_| self.closed())
    }

    /// True once the session task has ended (completed or torn down)
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Wait for the session to end on its own (completion)
    ///
    /// Cancel-safe: if this future is dropped the task stays joinable.
    pub async fn join(&mut self) -> Result<SessionSummary> {
        let session_id = self.session_id;
        let task = self
            .task
            .as_mut()
            .ok_or_else(|| Error::SessionClosed(session_id.to_string()))?;
        let result = task.await;
        self.task = None;
        result.map_err(|e| Error::Internal(format!("Session task failed: {e}")))
    }

    /// Cancel the session and wait for its task to exit
    pub async fn teardown(&mut self) -> Result<SessionSummary> {
        self.cancel.cancel();
        self.join().await
    }

    async fn send(&self, command: Command) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(Request::Apply(command, tx))
            .map_err(|_| self.closed())?;
        rx.await.map_err(|_| self.closed())
    }

    fn closed(&self) -> Error {
        Error::SessionClosed(self.session_id.to_string())
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .field("finished", &self.is_finished())
            .finish()
    }
}
