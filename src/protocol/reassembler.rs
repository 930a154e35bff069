//! Stream reassembly
//!
//! Turns arbitrarily chunked socket reads into complete reply frames.
//! Bytes live in one `BytesMut`; emitting a frame splits it off the front, so
//! the buffer grows amortized and consumed bytes are never copied again.
//!
//! The buffer has no upper bound: a peer that announces a large frame and
//! never finishes it keeps the bytes buffered until the connection closes.

use bytes::BytesMut;

use crate::error::{GibsonError, Result};
use super::codec::{try_decode_header, Frame, HEADER_SIZE};

/// Initial capacity of the reassembly buffer
const INITIAL_CAPACITY: usize = 8 * 1024;

/// Accumulates incoming bytes and extracts complete frames
#[derive(Debug)]
pub struct StreamReassembler {
    /// Bytes received but not yet consumed into a frame
    buffer: BytesMut,
}

impl StreamReassembler {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a chunk and iterate over the frames it completes.
    ///
    /// Frames are extracted lazily; frames not pulled from the iterator stay
    /// buffered and come out of the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Frames<'_> {
        self.buffer.extend_from_slice(chunk);
        Frames { reassembler: self }
    }

    /// Extract the frame at the front of the buffer, if it is complete.
    ///
    /// A header whose length cannot be addressed on this platform is a
    /// [`GibsonError::ProtocolViolation`]; the buffer is dropped with it.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let header = match try_decode_header(&self.buffer) {
            Some(header) => header,
            None => return Ok(None),
        };

        let frame_len = match header.frame_len() {
            Some(len) => len,
            None => {
                self.buffer.clear();
                return Err(GibsonError::ProtocolViolation(format!(
                    "reply length {} exceeds addressable memory",
                    header.length
                )));
            }
        };
        if self.buffer.len() < frame_len {
            return Ok(None);
        }

        let mut frame = self.buffer.split_to(frame_len);
        let payload = frame.split_off(HEADER_SIZE).freeze();
        Ok(Some(Frame::new(header.code, header.encoding, payload)))
    }

    /// Number of buffered bytes not yet emitted as a frame
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for StreamReassembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the frames completed by one [`StreamReassembler::feed`]
///
/// Stops after the first error.
pub struct Frames<'a> {
    reassembler: &'a mut StreamReassembler,
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Result<Frame>> {
        self.reassembler.next_frame().transpose()
    }
}
