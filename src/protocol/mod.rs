//! Protocol module - frames, notifications, and byte framing.
//!
//! - String-list frames and the notification marker
//! - 8-byte length header encoding/decoding
//! - Frame buffer for accumulating partial reads

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::{Frame, Notification, NOTIFICATION_MARKER};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{
    build_frame, decode_payload, encode_payload, LengthHeader, FIELD_SEPARATOR, HEADER_SIZE,
    MAX_PAYLOAD_SIZE,
};
