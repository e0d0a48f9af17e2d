//! Wire format encoding and decoding.
//!
//! Every frame on the stream is an 8-byte ASCII length header followed by
//! the UTF-8 payload:
//! ```text
//! ┌──────────────────────┬───────────────────────────────────────┐
//! │ Length               │ Payload                               │
//! │ 8 bytes, decimal,    │ fields joined by "[]:[]"              │
//! │ left-justified,      │                                       │
//! │ space padded         │                                       │
//! └──────────────────────┴───────────────────────────────────────┘
//! ```
//!
//! The length counts payload bytes, not fields.

use crate::error::{PeerwireError, Result};

use super::Frame;

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// Largest payload the 8-digit header can describe.
pub const MAX_PAYLOAD_SIZE: u32 = 99_999_999;

/// Separator placed between fields in the payload.
pub const FIELD_SEPARATOR: &str = "[]:[]";

/// Decoded length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthHeader {
    payload_length: u32,
}

impl LengthHeader {
    /// Create a header for a payload of the given size.
    ///
    /// Fails if the payload cannot be described in 8 decimal digits.
    pub fn new(payload_length: usize) -> Result<Self> {
        if payload_length > MAX_PAYLOAD_SIZE as usize {
            return Err(PeerwireError::Protocol(format!(
                "Payload size {} exceeds maximum {}",
                payload_length, MAX_PAYLOAD_SIZE
            )));
        }
        Ok(Self {
            payload_length: payload_length as u32,
        })
    }

    /// Get the payload length in bytes.
    pub fn payload_length(&self) -> u32 {
        self.payload_length
    }

    /// Encode header to its 8 ASCII bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use peerwire::protocol::LengthHeader;
    ///
    /// let header = LengthHeader::new(42).unwrap();
    /// assert_eq!(&header.encode(), b"42      ");
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [b' '; HEADER_SIZE];
        let digits = self.payload_length.to_string();
        buf[..digits.len()].copy_from_slice(digits.as_bytes());
        buf
    }

    /// Decode header from bytes.
    ///
    /// Surrounding spaces are ignored; anything else that is not a decimal
    /// digit is a protocol error.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(PeerwireError::Protocol(format!(
                "Length header needs {} bytes, got {}",
                HEADER_SIZE,
                buf.len()
            )));
        }

        let text = std::str::from_utf8(&buf[..HEADER_SIZE])
            .map_err(|_| PeerwireError::Protocol("Length header is not ASCII".to_string()))?;
        let digits = text.trim_matches(' ');

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PeerwireError::Protocol(format!(
                "Invalid length header {:?}",
                text
            )));
        }

        let payload_length = digits
            .parse::<u32>()
            .map_err(|e| PeerwireError::Protocol(format!("Invalid length header: {}", e)))?;

        Ok(Self { payload_length })
    }
}

/// Join a frame's fields into a payload.
pub fn encode_payload(frame: &Frame) -> Vec<u8> {
    frame.fields().join(FIELD_SEPARATOR).into_bytes()
}

/// Split a payload back into a frame.
///
/// An empty payload decodes to a frame with no fields.
pub fn decode_payload(payload: &[u8]) -> Result<Frame> {
    if payload.is_empty() {
        return Ok(Frame::new());
    }

    let text = std::str::from_utf8(payload)
        .map_err(|e| PeerwireError::Protocol(format!("Payload is not UTF-8: {}", e)))?;

    Ok(text.split(FIELD_SEPARATOR).collect())
}

/// Build a complete frame (header + payload) as a single byte vector.
///
/// # Example
///
/// ```
/// use peerwire::protocol::{build_frame, Frame};
///
/// let frame = Frame::from(["GO_TO_SLEEP"]);
/// let bytes = build_frame(&frame).unwrap();
/// assert_eq!(&bytes[..], b"11      GO_TO_SLEEP");
/// ```
pub fn build_frame(frame: &Frame) -> Result<Vec<u8>> {
    let payload = encode_payload(frame);
    let header = LengthHeader::new(payload.len())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(&payload);
    Ok(buf)
}
