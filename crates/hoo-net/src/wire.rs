//! Low-level wire envelope exchanged with the socket engine.
//!
//! Every frame payload is an envelope:
//!
//! ```text
//! +-----------+--------------------+-------------------+
//! | kind (u8) | session (i32 LE)   |   payload         |
//! +-----------+--------------------+-------------------+
//! ```
//!
//! A session value of `-1` means "no session" (for example the capacity
//! rejection a full server sends before any session exists).

use std::fmt;

/// Size of the envelope header (kind + session id).
pub const ENVELOPE_HEADER_LEN: usize = 5;

const NO_SESSION: i32 = -1;

/// Identifier of an established session.
///
/// The wire carries it as an `i32`, so only `0..=SessionId::MAX` is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u32);

impl SessionId {
    /// Largest id that survives the wire encoding.
    pub const MAX: u32 = i32::MAX as u32;
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a low-level network message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireKind {
    /// A peer opened a session.
    OpenSession = 0,
    /// The session was closed by the peer (or the link dropped).
    CloseSession = 1,
    /// The server refused the connection because it is at capacity.
    MaxConnectionsReached = 2,
    /// Application-level payload, dispatched by the answer registry.
    ApplicationMessage = 3,
}

impl WireKind {
    /// Parse a kind byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::OpenSession),
            1 => Some(Self::CloseSession),
            2 => Some(Self::MaxConnectionsReached),
            3 => Some(Self::ApplicationMessage),
            _ => None,
        }
    }
}

/// Errors that can occur while decoding an envelope.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    /// Fewer bytes than the envelope header.
    #[error("envelope truncated: {len} bytes")]
    Truncated {
        /// Number of bytes received.
        len: usize,
    },
    /// The kind byte is not a known [`WireKind`].
    #[error("unknown wire message kind: {0}")]
    UnknownKind(u8),
}

/// Immutable envelope exchanged with a [`SocketEngine`](crate::SocketEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    kind: WireKind,
    session: Option<SessionId>,
    payload: Vec<u8>,
}

impl WireMessage {
    /// Build an envelope.
    pub fn new(kind: WireKind, session: Option<SessionId>, payload: Vec<u8>) -> Self {
        Self {
            kind,
            session,
            payload,
        }
    }

    /// Envelope without payload (session control messages).
    pub fn control(kind: WireKind, session: Option<SessionId>) -> Self {
        Self::new(kind, session, Vec::new())
    }

    /// Application message carrying an encoded request or answer.
    pub fn application(session: Option<SessionId>, payload: Vec<u8>) -> Self {
        Self::new(WireKind::ApplicationMessage, session, payload)
    }

    pub fn kind(&self) -> WireKind {
        self.kind
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Serialize to envelope bytes.
    pub fn encode(&self) -> Vec<u8> {
        let session = match self.session {
            Some(SessionId(id)) => i32::try_from(id).unwrap_or_else(|_| {
                tracing::error!("Session id {id} out of wire range, sent as no session");
                NO_SESSION
            }),
            None => NO_SESSION,
        };
        let mut out = Vec::with_capacity(ENVELOPE_HEADER_LEN + self.payload.len());
        out.push(self.kind as u8);
        out.extend_from_slice(&session.to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse envelope bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < ENVELOPE_HEADER_LEN {
            return Err(WireError::Truncated { len: bytes.len() });
        }

        let kind = WireKind::from_u8(bytes[0]).ok_or(WireError::UnknownKind(bytes[0]))?;
        let raw_session = i32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        let session = (raw_session >= 0).then_some(SessionId(raw_session as u32));

        Ok(Self {
            kind,
            session,
            payload: bytes[ENVELOPE_HEADER_LEN..].to_vec(),
        })
    }
}
