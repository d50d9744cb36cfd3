//! Client session state machine.
//!
//! [`ClientSession`] owns the single connection to the game server. `open`
//! hands the blocking connect to a background thread, and every other
//! transition happens inside [`ClientSession::process_messages`], which the
//! main loop calls once per tick:
//!
//! ```text
//! NotOpened ──open──▶ InProgress ──connected──▶ Open ──close-session──▶ Lost
//!     ▲                   │                      │ ──server full──────▶ FailedServerFull
//!     │                   └──connect failed──▶ Failed                  │ ──send failed──▶ Error
//!     └──────────── reset_state / open from any terminal state ◀───────┘
//! ```

use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};

use crate::engine::SocketEngine;
use crate::protocol::{AnswerKind, Request, TypedAnswer};
use crate::queue::{DEFAULT_STALE_AFTER, PendingQueue};
use crate::registry::AnswerRegistry;
use crate::wire::{SessionId, WireKind, WireMessage};

/// Lifecycle state of the client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No connection attempted since creation or the last reset.
    NotOpened,
    /// The background connect is running.
    InProgress,
    /// Connected; messages flow both ways.
    Open,
    /// The connect attempt failed.
    Failed,
    /// The server refused the connection because it is full.
    FailedServerFull,
    /// Sending to the server failed.
    Error,
    /// The server closed the session or the link dropped.
    Lost,
}

impl SessionState {
    /// States `process_messages` never leaves on its own.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Failed | Self::FailedServerFull | Self::Error | Self::Lost
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotOpened => "not opened",
            Self::InProgress => "in progress",
            Self::Open => "open",
            Self::Failed => "failed",
            Self::FailedServerFull => "failed (server full)",
            Self::Error => "error",
            Self::Lost => "lost",
        };
        f.write_str(name)
    }
}

/// Misuse of the session API.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// `open` called while a connection is in progress or open.
    #[error("trying to reopen a connection that is {state}")]
    AlreadyOpen {
        /// State at the time of the call (left unchanged).
        state: SessionState,
    },

    /// The OS refused to start the connect thread.
    #[error("failed to spawn connect thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Outcome published once by the connect thread.
#[derive(Debug, Clone, Copy)]
struct ConnectOutcome {
    session: Option<SessionId>,
}

/// Target of one connect attempt, moved into the connect thread.
struct ConnectAttempt {
    address: String,
    port: u16,
}

impl ConnectAttempt {
    fn run<E: SocketEngine>(self, engine: &E, outcome: Sender<ConnectOutcome>) {
        let session = match engine.connect(&self.address, self.port) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Connection to {}:{} failed: {e}", self.address, self.port);
                None
            }
        };
        let _ = outcome.send(ConnectOutcome { session });
    }
}

/// Handle to the running connect thread.
struct PendingConnect {
    handle: JoinHandle<()>,
    outcome: Receiver<ConnectOutcome>,
}

impl PendingConnect {
    /// Non-blocking check. `None` while the thread is still connecting.
    fn poll(&self) -> Option<ConnectOutcome> {
        match self.outcome.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::error!("Connect thread exited without reporting a result");
                Some(ConnectOutcome { session: None })
            }
        }
    }

    /// Block until the thread reports, then join it.
    fn wait(self) -> ConnectOutcome {
        let outcome = self
            .outcome
            .recv()
            .unwrap_or(ConnectOutcome { session: None });
        self.join();
        outcome
    }

    fn join(self) {
        if self.handle.join().is_err() {
            tracing::error!("Connect thread panicked");
        }
    }
}

/// The client's single session with the game server.
pub struct ClientSession<E: SocketEngine> {
    engine: Arc<E>,
    registry: AnswerRegistry,
    state: SessionState,
    session_id: Option<SessionId>,
    target: Option<(String, u16)>,
    pending: PendingQueue,
    connect: Option<PendingConnect>,
    stale_after: Duration,
    app_connected: bool,
}

impl<E: SocketEngine> ClientSession<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            registry: AnswerRegistry::new(),
            state: SessionState::NotOpened,
            session_id: None,
            target: None,
            pending: PendingQueue::new(),
            connect: None,
            stale_after: DEFAULT_STALE_AFTER,
            app_connected: false,
        }
    }

    /// Age after which unclaimed answers are dropped. Default: 10s.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Replace the answer dispatch table.
    pub fn with_registry(mut self, registry: AnswerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Start connecting to `address:port` in the background.
    ///
    /// Reopening after a terminal state clears both queues; requests queued
    /// while [`SessionState::NotOpened`] are kept and flushed first. The outcome
    /// shows up as a state change on a later
    /// [`process_messages`](Self::process_messages).
    pub fn open(&mut self, address: &str, port: u16) -> Result<(), SessionError> {
        match self.state {
            SessionState::InProgress | SessionState::Open => {
                return Err(SessionError::AlreadyOpen { state: self.state });
            }
            SessionState::NotOpened => {}
            SessionState::Failed
            | SessionState::FailedServerFull
            | SessionState::Error
            | SessionState::Lost => self.pending.clear(),
        }

        self.session_id = None;
        self.app_connected = false;
        self.target = Some((address.to_string(), port));

        let attempt = ConnectAttempt {
            address: address.to_string(),
            port,
        };
        let engine = Arc::clone(&self.engine);
        let (outcome_tx, outcome_rx) = bounded(1);
        let spawned = std::thread::Builder::new()
            .name("hoo-net-connect".into())
            .spawn(move || attempt.run(engine.as_ref(), outcome_tx));

        match spawned {
            Ok(handle) => {
                self.connect = Some(PendingConnect {
                    handle,
                    outcome: outcome_rx,
                });
                self.state = SessionState::InProgress;
                tracing::info!("Connecting to {address}:{port}");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(SessionError::Spawn(e))
            }
        }
    }

    /// Advance the session by one tick. Call once per frame.
    pub fn process_messages(&mut self) {
        match self.state {
            SessionState::InProgress => self.connection_in_progress(),
            SessionState::Open => self.connection_open(Instant::now()),
            SessionState::NotOpened
            | SessionState::Failed
            | SessionState::FailedServerFull
            | SessionState::Error
            | SessionState::Lost => {}
        }
    }

    /// Queue a request. Delivered in call order once the session is open.
    pub fn send(&mut self, request: impl Into<Request>) {
        self.pending.outgoing.push(request.into());
    }

    /// Whether an answer of one of the `filter` kinds is waiting.
    pub fn has_pending_message(&self, filter: &[AnswerKind]) -> bool {
        self.pending.incoming.contains_any(filter)
    }

    /// Take the first waiting answer whose kind is in `filter`.
    pub fn pop_message(&mut self, filter: &[AnswerKind]) -> Option<TypedAnswer> {
        self.pending.incoming.take_first(filter)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Established session id; `Some` only while [`SessionState::Open`].
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    /// Address and port of the last `open`.
    pub fn target(&self) -> Option<(&str, u16)> {
        self.target.as_ref().map(|(a, p)| (a.as_str(), *p))
    }

    /// Force the state back to [`SessionState::NotOpened`].
    ///
    /// An in-flight connect is waited for first. Both queues are cleared.
    pub fn reset_state(&mut self) {
        self.release();
        self.pending.clear();
        self.state = SessionState::NotOpened;
        self.session_id = None;
        self.app_connected = false;
    }

    /// Block until any in-flight connect finishes and join its thread.
    ///
    /// An attempt that was still in progress is abandoned: the session goes
    /// back to [`SessionState::NotOpened`] and a connection it established is
    /// closed.
    pub fn release(&mut self) {
        let Some(pending) = self.connect.take() else {
            return;
        };

        let outcome = pending.wait();
        if let Some(session) = outcome.session {
            let close = WireMessage::control(WireKind::CloseSession, Some(session));
            if let Err(e) = self.engine.send_message(&close) {
                tracing::warn!("Failed to close abandoned session {session}: {e}");
            }
        }
        if self.state == SessionState::InProgress {
            self.state = SessionState::NotOpened;
        }
    }

    /// Close the session from the client side.
    ///
    /// Unsent requests and unclaimed answers are dropped.
    pub fn close(&mut self) {
        match self.state {
            SessionState::InProgress => self.release(),
            SessionState::Open => {
                let close = WireMessage::control(WireKind::CloseSession, self.session_id);
                if let Err(e) = self.engine.send_message(&close) {
                    tracing::warn!("Failed to notify server of close: {e}");
                }
                self.pending.clear();
                self.session_id = None;
                self.app_connected = false;
                self.state = SessionState::NotOpened;
                tracing::info!("Connection closed");
            }
            _ => {}
        }
    }

    /// Application-level "logged in" flag, cleared whenever the session drops.
    pub fn is_app_connected(&self) -> bool {
        self.app_connected
    }

    pub fn set_app_connected(&mut self, connected: bool) {
        self.app_connected = connected;
    }

    pub fn pending_outgoing(&self) -> usize {
        self.pending.outgoing.len()
    }

    pub fn pending_incoming(&self) -> usize {
        self.pending.incoming.len()
    }

    fn set_disconnected(&mut self, state: SessionState) {
        self.state = state;
        self.session_id = None;
        self.app_connected = false;
    }

    fn connection_in_progress(&mut self) {
        let outcome = match self.connect.as_ref() {
            Some(pending) => match pending.poll() {
                Some(outcome) => outcome,
                None => return,
            },
            None => {
                tracing::error!("Connection in progress without a connect thread");
                ConnectOutcome { session: None }
            }
        };

        if let Some(pending) = self.connect.take() {
            pending.join();
        }

        match outcome.session {
            Some(session) => {
                self.state = SessionState::Open;
                self.session_id = Some(session);
                tracing::info!("Socket to server opened (session {session})");
                self.engine.launch();
            }
            None => self.set_disconnected(SessionState::Failed),
        }
    }

    fn connection_open(&mut self, now: Instant) {
        self.pending.incoming.prune_stale(now, self.stale_after);

        // A disconnect ends the drain: later messages belong to a dead session.
        while self.state == SessionState::Open
            && let Some(message) = self.engine.poll_message()
        {
            match message.kind() {
                WireKind::CloseSession => {
                    tracing::info!("Connection closed by server");
                    self.set_disconnected(SessionState::Lost);
                }
                WireKind::MaxConnectionsReached => {
                    tracing::info!("Connection refused by full server");
                    self.set_disconnected(SessionState::FailedServerFull);
                }
                WireKind::OpenSession => {
                    // Remote input, so logged rather than asserted.
                    tracing::error!("Unexpected open-session message on an open session");
                }
                WireKind::ApplicationMessage => {
                    if let Some(answer) = self.registry.translate(&message) {
                        tracing::trace!("Queued {}", answer.kind());
                        self.pending.incoming.push(answer, now);
                    }
                }
            }
        }

        self.flush_outgoing();
    }

    fn flush_outgoing(&mut self) {
        while self.state == SessionState::Open {
            let Some(request) = self.pending.outgoing.front() else {
                break;
            };
            let kind = request.kind();
            let payload = match request.encode() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!("Dropping request {kind:?}: {e}");
                    self.pending.outgoing.pop_front();
                    continue;
                }
            };

            let message = WireMessage::application(self.session_id, payload);
            match self.engine.send_message(&message) {
                Ok(()) => {
                    self.pending.outgoing.pop_front();
                }
                Err(e) => {
                    tracing::info!("Connection with server lost: {e}");
                    self.set_disconnected(SessionState::Error);
                }
            }
        }
    }
}

impl<E: SocketEngine> Drop for ClientSession<E> {
    fn drop(&mut self) {
        self.release();
    }
}
