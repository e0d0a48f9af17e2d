//! Frame struct with typed accessors.
//!
//! A frame is an ordered list of text fields. Field 0 is usually a verb
//! (requests) or a status (replies). Frames whose field 0 is
//! [`NOTIFICATION_MARKER`] are push notifications and never replies.
//!
//! # Example
//!
//! ```
//! use peerwire::protocol::Frame;
//!
//! let mut frame = Frame::with_verb("QUERY_REMOTEENCODER 3");
//! frame.push("IS_BUSY");
//! frame.push_int(5);
//!
//! assert_eq!(frame.len(), 3);
//! assert_eq!(frame.verb(), Some("QUERY_REMOTEENCODER 3"));
//! assert_eq!(frame.field(2), Some("5"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::FieldCursor;

/// Field 0 value that marks a push notification.
pub const NOTIFICATION_MARKER: &str = "BACKEND_MESSAGE";

/// One ordered list of text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    fields: Vec<String>,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame whose field 0 is the given verb.
    pub fn with_verb(verb: impl Into<String>) -> Self {
        Self {
            fields: vec![verb.into()],
        }
    }

    /// Append a text field.
    #[inline]
    pub fn push(&mut self, field: impl Into<String>) {
        self.fields.push(field.into());
    }

    /// Append a number as decimal text.
    #[inline]
    pub fn push_int(&mut self, value: impl Into<i64>) {
        self.fields.push(value.into().to_string());
    }

    /// Append a boolean as `"1"` or `"0"`.
    #[inline]
    pub fn push_bool(&mut self, value: bool) {
        self.fields.push(if value { "1" } else { "0" }.to_string());
    }

    /// Append all fields of another frame.
    pub fn append(&mut self, other: Frame) {
        self.fields.extend(other.fields);
    }

    /// Get the field at `index`.
    #[inline]
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Get field 0.
    #[inline]
    pub fn verb(&self) -> Option<&str> {
        self.field(0)
    }

    /// Number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the frame has no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrow the fields.
    #[inline]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Take the fields.
    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }

    /// Cursor over the fields starting at `start`.
    pub fn cursor(&self, start: usize) -> FieldCursor<'_> {
        FieldCursor::new(&self.fields[start.min(self.fields.len())..])
    }

    /// Check if this frame is a push notification.
    ///
    /// A marker frame with fewer than two fields carries no event name and
    /// is treated as an ordinary frame.
    #[inline]
    pub fn is_notification(&self) -> bool {
        self.fields.len() >= 2 && self.fields[0] == NOTIFICATION_MARKER
    }

    /// Split a notification frame into its name and payload.
    ///
    /// Returns the frame unchanged in `Err` if it is not a notification.
    pub fn try_into_notification(self) -> std::result::Result<Notification, Frame> {
        if !self.is_notification() {
            return Err(self);
        }

        let mut fields = self.fields.into_iter();
        fields.next(); // marker
        let name = fields.next().unwrap_or_default();

        Ok(Notification {
            name,
            payload: fields.collect(),
        })
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", field)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<String>> for Frame {
    fn from(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Frame {
    fn from(fields: [S; N]) -> Self {
        fields.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Frame {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for Frame {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.fields.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for Frame {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// A push notification diverted from the reply stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Event name (field 1 of the frame).
    pub name: String,
    /// Remaining fields, in order.
    pub payload: Vec<String>,
}

impl Notification {
    /// Create a notification.
    pub fn new(name: impl Into<String>, payload: Vec<String>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Rebuild the wire frame for this notification.
    pub fn to_frame(&self) -> Frame {
        let mut frame = Frame::with_verb(NOTIFICATION_MARKER);
        frame.push(self.name.clone());
        frame.extend(self.payload.iter().cloned());
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let mut frame = Frame::with_verb("QUERY_CHECKFILE");
        frame.push_int(0);
        frame.push_bool(true);
        frame.push("path");

        assert_eq!(frame.len(), 4);
        assert_eq!(frame.verb(), Some("QUERY_CHECKFILE"));
        assert_eq!(frame.field(1), Some("0"));
        assert_eq!(frame.field(2), Some("1"));
        assert_eq!(frame.field(3), Some("path"));
        assert_eq!(frame.field(4), None);
    }

    #[test]
    fn test_frame_empty() {
        let frame = Frame::new();
        assert!(frame.is_empty());
        assert_eq!(frame.verb(), None);
        assert!(!frame.is_notification());
    }

    #[test]
    fn test_notification_extraction() {
        let frame = Frame::from(["BACKEND_MESSAGE", "RECORDING_LIST_CHANGE", "ADD", "1001"]);
        assert!(frame.is_notification());

        let notification = frame.try_into_notification().unwrap();
        assert_eq!(notification.name, "RECORDING_LIST_CHANGE");
        assert_eq!(notification.payload, vec!["ADD", "1001"]);
    }

    #[test]
    fn test_notification_without_payload() {
        let frame = Frame::from(["BACKEND_MESSAGE", "CLEAR_SETTINGS_CACHE"]);
        let notification = frame.try_into_notification().unwrap();
        assert_eq!(notification.name, "CLEAR_SETTINGS_CACHE");
        assert!(notification.payload.is_empty());
    }

    #[test]
    fn test_lone_marker_is_not_notification() {
        let frame = Frame::from(["BACKEND_MESSAGE"]);
        assert!(!frame.is_notification());

        let back = frame.clone().try_into_notification().unwrap_err();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_marker_only_in_field_zero() {
        let frame = Frame::from(["OK", "BACKEND_MESSAGE"]);
        assert!(!frame.is_notification());
    }

    #[test]
    fn test_notification_to_frame() {
        let notification = Notification::new("SYSTEM_EVENT", vec!["REC_STARTED".to_string()]);
        let frame = notification.to_frame();
        assert_eq!(
            frame,
            Frame::from(["BACKEND_MESSAGE", "SYSTEM_EVENT", "REC_STARTED"])
        );
        assert_eq!(frame.try_into_notification().unwrap(), notification);
    }

    #[test]
    fn test_cursor_start_past_end() {
        let frame = Frame::from(["1"]);
        let cursor = frame.cursor(5);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_display() {
        let frame = Frame::from(["OK", "a b"]);
        assert_eq!(frame.to_string(), r#"["OK", "a b"]"#);
    }
}
