//! Fuzz target for the frame codec
//!
//! # Strategy
//!
//! - Arbitrary byte streams fed in arbitrary chunk sizes
//! - Forged length prefixes, truncated CBOR, trailing garbage
//!
//! # Invariants
//!
//! - Incomplete frames are never consumed
//! - Declared lengths above the limit are rejected before the body arrives
//! - Decoded messages re-encode to a frame that decodes to the same value
//! - NEVER panic on malformed input

#![no_main]

use arbitrary::Arbitrary;
use bytes::BytesMut;
use credo_proto::{HEADER_LEN, MAX_FRAME_LEN, ServerMessage, frame};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Bytes as they arrive from the network.
    stream: Vec<u8>,
    /// Chunk sizes used to deliver `stream`.
    chunks: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let mut buf = BytesMut::new();
    let mut rest = &input.stream[..];
    let mut chunks = input.chunks.iter().map(|&c| usize::from(c).max(1)).cycle();

    while !rest.is_empty() {
        let take = chunks.next().unwrap_or(rest.len()).min(rest.len());
        buf.extend_from_slice(&rest[..take]);
        rest = &rest[take..];

        loop {
            let before = buf.len();
            match frame::decode::<ServerMessage>(&mut buf) {
                Ok(Some(message)) => {
                    assert!(buf.len() < before, "decoded frame consumed nothing");
                    check_reencode(&message);
                },
                Ok(None) => {
                    assert_eq!(buf.len(), before, "incomplete frame was consumed");
                    if buf.len() >= HEADER_LEN {
                        let mut header = [0u8; HEADER_LEN];
                        header.copy_from_slice(&buf[..HEADER_LEN]);
                        let declared = u32::from_be_bytes(header) as usize;
                        assert!(declared <= MAX_FRAME_LEN);
                    }
                    break;
                },
                // Stream is unusable after a codec error.
                Err(_) => return,
            }
        }
    }
});

fn check_reencode(message: &ServerMessage) {
    let mut bytes = Vec::new();
    if frame::encode(message, &mut bytes).is_err() {
        return;
    }

    let mut buf = BytesMut::from(&bytes[..]);
    let decoded: Option<ServerMessage> = frame::decode(&mut buf).ok().flatten();
    assert_eq!(decoded.as_ref(), Some(message), "re-encoded frame decoded differently");
    assert!(buf.is_empty());
}
