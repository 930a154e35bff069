//! Protocol codec
//!
//! Encoding of requests and peeking of reply headers. No I/O happens here.
//!
//! ## Wire Format (all integers little-endian)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬───────────┬─────────────────────────────┐
//! │ Len (4)  │ Opcode(2) │         Payload             │
//! └──────────┴───────────┴─────────────────────────────┘
//! ```
//! `Len` counts the opcode plus the payload, not itself.
//!
//! ### Reply Format
//! ```text
//! ┌──────────┬────────┬──────────┬─────────────────────────────┐
//! │ Code (2) │ Enc (1)│ Len (4)  │         Payload             │
//! └──────────┴────────┴──────────┴─────────────────────────────┘
//! ```

use bytes::{BufMut, Bytes, BytesMut};

/// Request header size: 4 bytes length + 2 bytes opcode
pub const REQUEST_HEADER_SIZE: usize = 6;

/// Reply header size: 2 bytes code + 1 byte encoding + 4 bytes length
pub const HEADER_SIZE: usize = 7;

/// Fixed fields at the front of every reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Reply code
    pub code: u16,

    /// Payload encoding byte
    pub encoding: u8,

    /// Payload length in bytes
    pub length: u32,
}

impl FrameHeader {
    /// Bytes occupied by the whole frame, header included.
    ///
    /// `None` when the declared length does not fit in `usize`.
    pub fn frame_len(&self) -> Option<usize> {
        usize::try_from(self.length).ok()?.checked_add(HEADER_SIZE)
    }
}

/// One complete reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Reply code
    pub code: u16,

    /// Payload encoding byte
    pub encoding: u8,

    /// Exactly `length` payload bytes
    pub payload: Bytes,
}

impl Frame {
    pub fn new(code: u16, encoding: u8, payload: Bytes) -> Self {
        Self {
            code,
            encoding,
            payload,
        }
    }

    /// Payload length as declared in the header
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

// =============================================================================
// Request Encoding
// =============================================================================

/// Encode a request frame
///
/// Format: len (4) = 2 + payload.len() + opcode (2) + payload
pub fn encode_request(opcode: u16, payload: &[u8]) -> Bytes {
    let mut message = BytesMut::with_capacity(REQUEST_HEADER_SIZE + payload.len());
    encode_request_into(opcode, payload, &mut message);
    message.freeze()
}

/// Append a request frame to `dst`
pub fn encode_request_into(opcode: u16, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(REQUEST_HEADER_SIZE + payload.len());
    dst.put_u32_le((2 + payload.len()) as u32);
    dst.put_u16_le(opcode);
    dst.put_slice(payload);
}

// =============================================================================
// Reply Encoding/Decoding
// =============================================================================

/// Read the reply header at the front of `buf` without consuming anything.
///
/// Returns `None` until at least `HEADER_SIZE` bytes are available.
pub fn try_decode_header(buf: &[u8]) -> Option<FrameHeader> {
    if buf.len() < HEADER_SIZE {
        return None;
    }

    Some(FrameHeader {
        code: u16::from_le_bytes([buf[0], buf[1]]),
        encoding: buf[2],
        length: u32::from_le_bytes([buf[3], buf[4], buf[5], buf[6]]),
    })
}

/// Encode a reply frame
///
/// Used by servers and by tests that script one.
pub fn encode_reply(code: u16, encoding: u8, payload: &[u8]) -> Bytes {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u16_le(code);
    message.put_u8(encoding);
    message.put_u32_le(payload.len() as u32);
    message.put_slice(payload);
    message.freeze()
}
