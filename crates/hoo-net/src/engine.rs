//! Boundary with the socket engine that performs the actual byte I/O.

use crate::framing::FrameError;
use crate::wire::{SessionId, WireMessage};

/// Failure reported by a [`SocketEngine`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No connection is established.
    #[error("not connected")]
    NotConnected,

    /// The server address did not resolve to any socket address.
    #[error("could not resolve {address}")]
    Resolve {
        /// Address as given by the caller.
        address: String,
    },

    /// Socket-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing-level error while writing.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),
}

/// Socket engine driven by [`ClientSession`](crate::ClientSession).
///
/// `connect` runs on the session's background connect thread while every other
/// method is called from the main loop, hence the `Send + Sync` bound.
pub trait SocketEngine: Send + Sync + 'static {
    /// Blocking connect. Returns the local session id on success.
    fn connect(&self, address: &str, port: u16) -> Result<SessionId, TransportError>;

    /// Start continuous background receive once a session is established.
    fn launch(&self);

    /// Non-blocking: the next buffered inbound message, if any.
    fn poll_message(&self) -> Option<WireMessage>;

    /// Send one message. A `CloseSession` envelope closes the connection.
    fn send_message(&self, message: &WireMessage) -> Result<(), TransportError>;
}
