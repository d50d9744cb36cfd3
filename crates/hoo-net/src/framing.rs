//! Length-prefixed framing for blocking TCP streams.
//!
//! Every envelope on the wire is a length-prefixed frame:
//!
//! ```text
//! +-------------------+--------------------+
//! | length (4 bytes)  |   envelope         |
//! | u32 little-endian |   (length bytes)   |
//! +-------------------+--------------------+
//! ```
//!
//! The length does **not** include the 4 prefix bytes themselves.

use std::io::{ErrorKind, Read, Write};

/// Configuration for the framing layer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum allowed payload size in bytes. Default: 1 MB.
    pub max_payload_size: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 1_048_576,
        }
    }
}

/// Errors that can occur during framing operations.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload size exceeds the configured maximum.
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge {
        /// The actual payload size.
        size: u32,
        /// The configured maximum.
        max: u32,
    },

    /// The connection was closed before a complete frame was received.
    #[error("connection closed")]
    ConnectionClosed,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a single frame, blocking until it is complete.
pub fn read_frame<R: Read>(reader: &mut R, config: &FrameConfig) -> Result<Vec<u8>, FrameError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            return Err(FrameError::ConnectionClosed);
        }
        Err(e) => return Err(FrameError::Io(e)),
    }

    let payload_len = u32::from_le_bytes(len_buf);
    if payload_len > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: config.max_payload_size,
        });
    }

    let mut payload = vec![0u8; payload_len as usize];
    if payload_len > 0 {
        reader.read_exact(&mut payload).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                FrameError::ConnectionClosed
            } else {
                FrameError::Io(e)
            }
        })?;
    }

    Ok(payload)
}

/// Write a single frame and flush it.
pub fn write_frame<W: Write>(
    writer: &mut W,
    payload: &[u8],
    config: &FrameConfig,
) -> Result<(), FrameError> {
    let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    if len > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: config.max_payload_size,
        });
    }

    // One buffer so a frame is never split across two writes.
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    writer.write_all(&frame)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_single_frame_roundtrip() {
        let config = FrameConfig::default();
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello world", &config).unwrap();

        let received = read_frame(&mut Cursor::new(buf), &config).unwrap();
        assert_eq!(received, b"hello world");
    }

    #[test]
    fn test_back_to_back_frames_dont_merge() {
        let config = FrameConfig::default();
        let mut buf = Vec::new();
        write_frame(&mut buf, b"aaa", &config).unwrap();
        write_frame(&mut buf, b"bbb", &config).unwrap();

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_frame(&mut cursor, &config).unwrap(), b"aaa");
        assert_eq!(read_frame(&mut cursor, &config).unwrap(), b"bbb");
    }

    #[test]
    fn test_oversized_frame_rejected_on_read() {
        let config = FrameConfig {
            max_payload_size: 16,
        };
        let mut cursor = Cursor::new(1024u32.to_le_bytes().to_vec());
        let result = read_frame(&mut cursor, &config);
        assert!(matches!(
            result,
            Err(FrameError::PayloadTooLarge { size: 1024, max: 16 })
        ));
    }

    #[test]
    fn test_oversized_frame_rejected_on_write() {
        let config = FrameConfig {
            max_payload_size: 16,
        };
        let mut buf = Vec::new();
        let result = write_frame(&mut buf, &[0u8; 64], &config);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
        assert!(buf.is_empty(), "nothing should be written");
    }

    #[test]
    fn test_zero_length_frame_is_valid() {
        let config = FrameConfig::default();
        let mut buf = Vec::new();
        write_frame(&mut buf, &[], &config).unwrap();
        assert!(read_frame(&mut Cursor::new(buf), &config).unwrap().is_empty());
    }

    #[test]
    fn test_eof_before_length_is_connection_closed() {
        let config = FrameConfig::default();
        let result = read_frame(&mut Cursor::new(Vec::new()), &config);
        assert!(matches!(result, Err(FrameError::ConnectionClosed)));
    }

    #[test]
    fn test_eof_mid_payload_is_connection_closed() {
        let config = FrameConfig::default();
        let mut bytes = 10u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        let result = read_frame(&mut Cursor::new(bytes), &config);
        assert!(matches!(result, Err(FrameError::ConnectionClosed)));
    }

    #[test]
    fn test_length_prefix_is_little_endian() {
        let config = FrameConfig::default();
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello", &config).unwrap();
        assert_eq!(&buf[..4], &[5, 0, 0, 0]);
    }
}
