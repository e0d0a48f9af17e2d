//! Wide-integer codec.
//!
//! A 64-bit value travels as two decimal fields: the high 32 bits and the
//! low 32 bits, each written as a signed 32-bit integer.
//!
//! # Example
//!
//! ```
//! use peerwire::codec::{decode_wide_int, encode_wide_int};
//!
//! let fields = encode_wide_int(20_200_000_000);
//! assert_eq!(fields, ["4".to_string(), "-1274836480".to_string()]);
//! assert_eq!(decode_wide_int(&fields, 0), Some(20_200_000_000));
//! ```

use super::fields::parse_int;
use crate::protocol::Frame;

/// Split a value into its high and low halves.
#[inline]
pub fn split(value: i64) -> (i32, i32) {
    ((value >> 32) as i32, (value & 0xffff_ffff) as u32 as i32)
}

/// Reassemble a value from its high and low halves.
#[inline]
pub fn join(high: i32, low: i32) -> i64 {
    (i64::from(high) << 32) | (i64::from(low) & 0xffff_ffff)
}

/// Encode a value as two decimal fields.
pub fn encode_wide_int(value: i64) -> [String; 2] {
    let (high, low) = split(value);
    [high.to_string(), low.to_string()]
}

/// Append a value to a frame as two decimal fields.
pub fn push_wide_int(frame: &mut Frame, value: i64) {
    frame.extend(encode_wide_int(value));
}

/// Decode the two fields starting at `offset`.
///
/// Returns `None` if either field is missing or not a 32-bit integer.
pub fn decode_wide_int(fields: &[String], offset: usize) -> Option<i64> {
    let high = parse_int::<i32>(fields.get(offset)?)?;
    let low = parse_int::<i32>(fields.get(offset + 1)?)?;
    Some(join(high, low))
}
