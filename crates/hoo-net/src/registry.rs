//! Translation of application wire messages into typed answers.
//!
//! The registry is a lookup table from wire tag to decoder. Adding an answer
//! kind means adding one [`ANSWER_TABLE`] entry; tags without an entry are
//! always rejected.

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;

use crate::protocol::*;
use crate::wire::{WireKind, WireMessage};

/// Decoder turning a postcard body into a [`TypedAnswer`] plus the unread tail.
pub type AnswerDecoder = fn(&[u8]) -> Result<(TypedAnswer, &[u8]), postcard::Error>;

/// One row of the dispatch table.
#[derive(Clone, Copy)]
pub struct AnswerEntry {
    pub kind: AnswerKind,
    pub decode: AnswerDecoder,
}

fn decode_as<T>(body: &[u8]) -> Result<(TypedAnswer, &[u8]), postcard::Error>
where
    T: DeserializeOwned + Into<TypedAnswer>,
{
    let (value, rest) = postcard::take_from_bytes::<T>(body)?;
    Ok((value.into(), rest))
}

/// Every answer the client understands.
pub const ANSWER_TABLE: &[AnswerEntry] = &[
    AnswerEntry { kind: AnswerKind::Connect, decode: decode_as::<ConnectAnswer> },
    AnswerEntry { kind: AnswerKind::Login, decode: decode_as::<LoginAnswer> },
    AnswerEntry {
        kind: AnswerKind::CheckLoginAvailable,
        decode: decode_as::<CheckLoginAvailableAnswer>,
    },
    AnswerEntry { kind: AnswerKind::CreateAccount, decode: decode_as::<CreateAccountAnswer> },
    AnswerEntry { kind: AnswerKind::SelectCharacter, decode: decode_as::<SelectCharacterAnswer> },
    AnswerEntry { kind: AnswerKind::QuickMatch, decode: decode_as::<QuickMatchAnswer> },
    AnswerEntry {
        kind: AnswerKind::CancelQuickMatch,
        decode: decode_as::<CancelQuickMatchAnswer>,
    },
    AnswerEntry { kind: AnswerKind::LaunchMatch, decode: decode_as::<LaunchMatchAnswer> },
    AnswerEntry { kind: AnswerKind::Loading, decode: decode_as::<LoadingAnswer> },
    AnswerEntry { kind: AnswerKind::AdminMessage, decode: decode_as::<AdminMessageAnswer> },
    AnswerEntry {
        kind: AnswerKind::MaintenanceMessage,
        decode: decode_as::<MaintenanceMessageAnswer>,
    },
    AnswerEntry { kind: AnswerKind::ChatMessage, decode: decode_as::<ChatMessageAnswer> },
    AnswerEntry { kind: AnswerKind::GameCommand, decode: decode_as::<GameCommandAnswer> },
    AnswerEntry {
        kind: AnswerKind::SendActivationCode,
        decode: decode_as::<SendActivationCodeAnswer>,
    },
    AnswerEntry {
        kind: AnswerKind::LoginWithActivation,
        decode: decode_as::<LoginWithActivationAnswer>,
    },
];

/// Why an application payload could not be turned into an answer.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// Payload too small to hold a type tag.
    #[error("incorrect server answer size: {size}")]
    TooShort {
        /// Payload size in bytes.
        size: usize,
    },

    /// Tag outside the user protocol (protocol version mismatch).
    #[error("incorrect server answer type: {0}")]
    UnknownTag(u32),

    /// Known answer kind left out of this registry.
    #[error("server answer {0} is not registered")]
    NotRegistered(AnswerKind),

    /// The body did not match the shape registered for its tag.
    #[error("incorrect server answer data for {kind}: {source}")]
    Malformed {
        kind: AnswerKind,
        #[source]
        source: postcard::Error,
    },

    /// The body decoded but bytes were left over (wrong payload size).
    #[error("incorrect server answer size for {kind}: {extra} trailing bytes")]
    TrailingBytes { kind: AnswerKind, extra: usize },
}

/// Tag-indexed dispatch table for server answers.
pub struct AnswerRegistry {
    entries: FxHashMap<u32, AnswerEntry>,
}

impl AnswerRegistry {
    /// Registry covering the whole [`ANSWER_TABLE`].
    pub fn new() -> Self {
        Self::from_entries(ANSWER_TABLE)
    }

    /// Registry restricted to `entries`.
    pub fn from_entries(entries: &[AnswerEntry]) -> Self {
        Self {
            entries: entries.iter().map(|e| (e.kind.tag(), *e)).collect(),
        }
    }

    /// Whether `tag` has a decoder.
    pub fn is_registered(&self, tag: u32) -> bool {
        self.entries.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode an application payload.
    pub fn decode(&self, payload: &[u8]) -> Result<TypedAnswer, TranslateError> {
        let (tag, body) =
            split_tag(payload).ok_or(TranslateError::TooShort { size: payload.len() })?;
        let entry = self.entries.get(&tag).ok_or_else(|| {
            AnswerKind::from_tag(tag)
                .map_or(TranslateError::UnknownTag(tag), TranslateError::NotRegistered)
        })?;

        let (answer, rest) = (entry.decode)(body).map_err(|source| TranslateError::Malformed {
            kind: entry.kind,
            source,
        })?;
        if !rest.is_empty() {
            return Err(TranslateError::TrailingBytes {
                kind: entry.kind,
                extra: rest.len(),
            });
        }
        Ok(answer)
    }

    /// Translate an application message, logging and dropping anything malformed.
    ///
    /// Payloads come from the server, so bad input never asserts, not even in
    /// debug builds: unknown or unregistered tags, short or oversized bodies and
    /// non-application envelopes are logged at error level and yield `None`.
    pub fn translate(&self, message: &WireMessage) -> Option<TypedAnswer> {
        if message.kind() != WireKind::ApplicationMessage {
            tracing::error!(kind = ?message.kind(), "Not an application message");
            return None;
        }

        match self.decode(message.payload()) {
            Ok(answer) => Some(answer),
            Err(e) => {
                tracing::error!("Dropping server answer: {e}");
                None
            }
        }
    }
}

impl Default for AnswerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
