//! Frame codec.
//!
//! ```text
//! ┌──────────────────────┬─────────────────────────────┐
//! │ length: u32 (BE)     │ payload: CBOR (length bytes)│
//! └──────────────────────┴─────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! - A payload never exceeds [`MAX_FRAME_LEN`]; oversized frames are rejected
//!   on both encode and decode before any allocation for the body.
//! - [`decode`] consumes bytes only when a complete frame is available.

use bytes::{Buf, BytesMut};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Size of the length prefix.
pub const HEADER_LEN: usize = 4;

/// Largest accepted payload (1 MiB).
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Errors from encoding or decoding frames.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Payload length exceeds [`MAX_FRAME_LEN`].
    #[error("frame too large: {len} bytes (max {max})")]
    TooLarge {
        /// Declared or actual payload length.
        len: usize,
        /// Limit.
        max: usize,
    },

    /// CBOR serialization failed.
    #[error("encode failed: {reason}")]
    Encode {
        /// Serializer message.
        reason: String,
    },

    /// CBOR deserialization failed.
    #[error("decode failed: {reason}")]
    Decode {
        /// Deserializer message.
        reason: String,
    },
}

/// Appends one framed message to `out`.
pub fn encode<T: Serialize>(value: &T, out: &mut Vec<u8>) -> Result<(), FrameError> {
    let mut payload = Vec::new();
    ciborium::ser::into_writer(value, &mut payload)
        .map_err(|e| FrameError::Encode { reason: e.to_string() })?;

    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge { len: payload.len(), max: MAX_FRAME_LEN });
    }

    // Bounded by MAX_FRAME_LEN above.
    #[allow(clippy::cast_possible_truncation)]
    let len = payload.len() as u32;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&payload);
    Ok(())
}

/// Reads the payload length from a frame header.
pub fn payload_len(header: [u8; HEADER_LEN]) -> Result<usize, FrameError> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge { len, max: MAX_FRAME_LEN });
    }
    Ok(len)
}

/// Decodes a frame body.
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, FrameError> {
    ciborium::de::from_reader(payload).map_err(|e| FrameError::Decode { reason: e.to_string() })
}

/// Takes one complete frame off the front of `buf`.
///
/// Returns `Ok(None)` and leaves `buf` untouched if the frame is incomplete.
pub fn decode<T: DeserializeOwned>(buf: &mut BytesMut) -> Result<Option<T>, FrameError> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }

    let mut header = [0u8; HEADER_LEN];
    header.copy_from_slice(&buf[..HEADER_LEN]);
    let len = payload_len(header)?;

    if buf.len() < HEADER_LEN + len {
        return Ok(None);
    }

    buf.advance(HEADER_LEN);
    let payload = buf.split_to(len);
    decode_payload(&payload).map(Some)
}
