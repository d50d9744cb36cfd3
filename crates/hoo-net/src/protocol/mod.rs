//! User protocol carried inside application wire messages.
//!
//! Every application payload starts with a 4-byte little-endian type tag
//! followed by the [`postcard`]-encoded body of the request or answer:
//!
//! ```text
//! +------------------+----------------------+
//! | tag (u32 LE)     |   postcard body      |
//! +------------------+----------------------+
//! ```

/// Implement `From<Payload>` for each variant of a payload-carrying enum.
macro_rules! variant_from {
    ($target:ident { $($variant:ident($payload:ty)),* $(,)? }) => {
        $(
            impl From<$payload> for $target {
                fn from(value: $payload) -> Self {
                    $target::$variant(value)
                }
            }
        )*
    };
}

pub mod answers;
pub mod requests;

pub use answers::*;
pub use requests::*;

use serde::Serialize;

/// Size in bytes of the type tag at the head of every application payload.
pub const TAG_LEN: usize = 4;

/// Encode `[tag][postcard body]`.
pub(crate) fn encode_tagged<T: Serialize>(tag: u32, body: &T) -> Result<Vec<u8>, postcard::Error> {
    let encoded = postcard::to_allocvec(body)?;
    let mut out = Vec::with_capacity(TAG_LEN + encoded.len());
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&encoded);
    Ok(out)
}

/// Split a payload into its type tag and body. `None` if too short to hold a tag.
pub fn split_tag(payload: &[u8]) -> Option<(u32, &[u8])> {
    if payload.len() < TAG_LEN {
        return None;
    }
    let (tag, body) = payload.split_at(TAG_LEN);
    Some((u32::from_le_bytes([tag[0], tag[1], tag[2], tag[3]]), body))
}
