//! Codec module - field-level encodings.
//!
//! - [`FieldCursor`] and scalar helpers for text fields
//! - Wide-integer split/join across two fields
//! - [`ToFields`] / [`FromFields`] seams for domain records
//!
//! # Example
//!
//! ```
//! use peerwire::codec::{encode_optional, FieldCursor};
//!
//! let fields = vec!["7".to_string(), encode_optional(None)];
//! let mut cursor = FieldCursor::new(&fields);
//!
//! assert_eq!(cursor.next_int::<u32>().unwrap(), 7);
//! assert_eq!(cursor.next_optional().unwrap(), "");
//! ```

mod fields;
mod record;
mod wide_int;

pub use fields::{
    decode_optional, encode_optional, parse_bool, parse_int, FieldCursor, EMPTY_VALUE,
};
pub use record::{FromFields, ProgramRecord, ToFields};
pub use wide_int::{decode_wide_int, encode_wide_int, push_wide_int};
