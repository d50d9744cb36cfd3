//! Client session manager: wire envelope, framing, user protocol, pending queues,
//! socket engine, and the session state machine driven from the main loop.

pub mod engine;
pub mod framing;
pub mod platform;
pub mod protocol;
pub mod queue;
pub mod registry;
pub mod session;
pub mod tcp_engine;
pub mod wire;

#[cfg(test)]
mod mock;

pub use engine::{SocketEngine, TransportError};
pub use framing::{FrameConfig, FrameError, read_frame, write_frame};
pub use platform::SocketConfig;
pub use protocol::{AnswerKind, Request, RequestKind, TypedAnswer};
pub use queue::{DEFAULT_STALE_AFTER, IncomingQueue, OutgoingQueue, PendingQueue};
pub use registry::{AnswerRegistry, TranslateError};
pub use session::{ClientSession, SessionError, SessionState};
pub use tcp_engine::{EngineConfig, TcpSocketEngine};
pub use wire::{SessionId, WireError, WireKind, WireMessage};
