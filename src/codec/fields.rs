//! Scalar field encodings and a cursor for hydrating records.
//!
//! Numbers travel as decimal text, booleans as `"0"`/`"1"`, and empty
//! optional strings as [`EMPTY_VALUE`].

use std::str::FromStr;

use crate::error::{PeerwireError, Result};

/// Literal stand-in for an absent or empty string field.
pub const EMPTY_VALUE: &str = "<EMPTY>";

/// Encode an optional string, substituting [`EMPTY_VALUE`] when absent or empty.
pub fn encode_optional(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => EMPTY_VALUE.to_string(),
    }
}

/// Decode a string that may be [`EMPTY_VALUE`].
pub fn decode_optional(field: &str) -> Option<&str> {
    if field == EMPTY_VALUE || field.is_empty() {
        None
    } else {
        Some(field)
    }
}

/// Parse a decimal integer field.
pub fn parse_int<T: FromStr>(field: &str) -> Option<T> {
    field.trim().parse().ok()
}

/// Parse a boolean field: any non-zero integer is true.
pub fn parse_bool(field: &str) -> Option<bool> {
    parse_int::<i64>(field).map(|v| v != 0)
}

/// Forward-only cursor over a slice of fields.
///
/// Record hydration consumes fields through a cursor so repeated records
/// can be read back to back from one reply.
#[derive(Debug, Clone)]
pub struct FieldCursor<'a> {
    fields: &'a [String],
    position: usize,
}

impl<'a> FieldCursor<'a> {
    /// Create a cursor at the start of `fields`.
    pub fn new(fields: &'a [String]) -> Self {
        Self {
            fields,
            position: 0,
        }
    }

    /// Number of fields consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of fields left.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.fields.len() - self.position
    }

    /// Check if every field has been consumed.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.fields.len()
    }

    /// Look at the next field without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<&'a str> {
        self.fields.get(self.position).map(String::as_str)
    }

    /// Take the next field, failing if none is left.
    pub fn next_str(&mut self) -> Result<&'a str> {
        let field = self.peek().ok_or_else(|| {
            PeerwireError::Hydration(format!(
                "expected a field at position {}, reply has {}",
                self.position,
                self.fields.len()
            ))
        })?;
        self.position += 1;
        Ok(field)
    }

    /// Take the next field as an owned string, mapping [`EMPTY_VALUE`] to `""`.
    pub fn next_optional(&mut self) -> Result<String> {
        let field = self.next_str()?;
        Ok(decode_optional(field).unwrap_or_default().to_string())
    }

    /// Take the next field as an integer.
    pub fn next_int<T: FromStr>(&mut self) -> Result<T> {
        let position = self.position;
        let field = self.next_str()?;
        parse_int(field).ok_or_else(|| {
            PeerwireError::Hydration(format!(
                "field {} is not an integer: {:?}",
                position, field
            ))
        })
    }

    /// Take the next field as a boolean.
    pub fn next_bool(&mut self) -> Result<bool> {
        Ok(self.next_int::<i64>()? != 0)
    }

    /// Take the next two fields as a wide integer.
    pub fn next_wide_int(&mut self) -> Result<i64> {
        let high = self.next_int::<i32>()?;
        let low = self.next_int::<i32>()?;
        Ok(super::wide_int::join(high, low))
    }
}

impl<'a> Iterator for FieldCursor<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_str().ok()
    }
}
