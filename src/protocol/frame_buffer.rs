//! Frame buffer for accumulating partial reads.
//!
//! Stream reads split frames anywhere, including inside the 8-byte
//! length header. The buffer alternates between waiting for a header and
//! waiting for the payload it announced.
//!
//! # Example
//!
//! ```
//! use peerwire::protocol::{build_frame, Frame, FrameBuffer};
//!
//! let bytes = build_frame(&Frame::from(["OK"])).unwrap();
//!
//! let mut buffer = FrameBuffer::new();
//! assert!(buffer.push(&bytes[..3]).unwrap().is_empty());
//!
//! let frames = buffer.push(&bytes[3..]).unwrap();
//! assert_eq!(frames, vec![Frame::from(["OK"])]);
//! ```

use bytes::{Buf, BytesMut};

use super::wire_format::{decode_payload, LengthHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use super::Frame;
use crate::error::{PeerwireError, Result};

/// Bytes reserved up front; most replies fit.
const DEFAULT_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Clone, Copy)]
enum State {
    WaitingForHeader,
    WaitingForPayload { remaining: usize },
}

/// Reassembles frames from arbitrarily split reads.
#[derive(Debug)]
pub struct FrameBuffer {
    buffer: BytesMut,
    state: State,
    max_payload_size: u32,
}

impl FrameBuffer {
    /// Create a buffer accepting payloads up to [`MAX_PAYLOAD_SIZE`].
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD_SIZE)
    }

    /// Create a buffer with a lower payload limit.
    ///
    /// Limits above [`MAX_PAYLOAD_SIZE`] are clamped to it.
    pub fn with_max_payload(max_payload_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(DEFAULT_CAPACITY),
            state: State::WaitingForHeader,
            max_payload_size: max_payload_size.min(MAX_PAYLOAD_SIZE),
        }
    }

    /// Append `data` and return every frame it completes, in order.
    ///
    /// Trailing partial bytes stay buffered for the next call.
    ///
    /// # Errors
    ///
    /// Fails on a malformed header, a payload over the limit, or a
    /// payload that is not UTF-8. The buffer is unusable afterwards.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let State::WaitingForHeader = self.state {
            if self.buffer.len() < HEADER_SIZE {
                return Ok(None);
            }

            let header = LengthHeader::decode(&self.buffer[..HEADER_SIZE])?;
            if header.payload_length() > self.max_payload_size {
                return Err(PeerwireError::Protocol(format!(
                    "Payload size {} exceeds maximum {}",
                    header.payload_length(), self.max_payload_size
                )));
            }

            self.buffer.advance(HEADER_SIZE);
            self.state = State::WaitingForPayload {
                remaining: header.payload_length() as usize,
            };
        }

        let State::WaitingForPayload { remaining } = self.state else {
            return Ok(None);
        };
        if self.buffer.len() < remaining {
            return Ok(None);
        }

        let payload = self.buffer.split_to(remaining);
        self.state = State::WaitingForHeader;
        decode_payload(&payload).map(Some)
    }

    /// Number of bytes buffered but not yet returned as frames.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop buffered bytes and wait for a header again.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
