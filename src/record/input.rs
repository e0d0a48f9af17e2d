//! Tuner input record.

use serde::{Deserialize, Serialize};

use crate::codec::{encode_optional, FieldCursor, FromFields, ToFields};
use crate::error::Result;
use crate::protocol::Frame;

/// A tuner input as reported by the peer.
///
/// Wire layout (5 fields): name (`<EMPTY>` when unset), source id,
/// input id, card id, multiplex id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputInfo {
    pub name: String,
    pub source_id: u32,
    pub input_id: u32,
    pub card_id: u32,
    pub multiplex_id: u32,
}

impl InputInfo {
    pub fn new(name: impl Into<String>, source_id: u32, input_id: u32, card_id: u32) -> Self {
        Self {
            name: name.into(),
            source_id,
            input_id,
            card_id,
            multiplex_id: 0,
        }
    }

    pub fn with_multiplex(mut self, multiplex_id: u32) -> Self {
        self.multiplex_id = multiplex_id;
        self
    }
}

impl ToFields for InputInfo {
    fn to_fields(&self, frame: &mut Frame) {
        frame.push(encode_optional(Some(&self.name)));
        frame.push_int(self.source_id);
        frame.push_int(self.input_id);
        frame.push_int(self.card_id);
        frame.push_int(self.multiplex_id);
    }
}

impl FromFields for InputInfo {
    const FIELD_COUNT: usize = 5;

    fn from_fields(cursor: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            name: cursor.next_optional()?,
            source_id: cursor.next_int()?,
            input_id: cursor.next_int()?,
            card_id: cursor.next_int()?,
            multiplex_id: cursor.next_int()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fields_layout() {
        let input = InputInfo::new("DVBInput", 1, 3, 2).with_multiplex(9);
        let mut frame = Frame::new();
        input.to_fields(&mut frame);

        assert_eq!(frame, Frame::from(["DVBInput", "1", "3", "2", "9"]));
    }

    #[test]
    fn test_empty_name_uses_placeholder() {
        let mut frame = Frame::new();
        InputInfo::default().to_fields(&mut frame);
        assert_eq!(frame.field(0), Some("<EMPTY>"));

        let back = InputInfo::from_fields(&mut frame.cursor(0)).unwrap();
        assert_eq!(back.name, "");
    }

    #[test]
    fn test_from_fields_advances_cursor() {
        let frame = Frame::from(["a", "1", "2", "3", "4", "b", "5", "6", "7", "8"]);
        let mut cursor = frame.cursor(0);

        let first = InputInfo::from_fields(&mut cursor).unwrap();
        let second = InputInfo::from_fields(&mut cursor).unwrap();

        assert_eq!(first.name, "a");
        assert_eq!(first.multiplex_id, 4);
        assert_eq!(second.name, "b");
        assert_eq!(second.card_id, 7);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_from_fields_truncated() {
        let frame = Frame::from(["a", "1", "2"]);
        assert!(InputInfo::from_fields(&mut frame.cursor(0)).is_err());
    }

    #[test]
    fn test_hydrate_from_keeps_value_on_error() {
        let mut input = InputInfo::new("keep", 1, 1, 1);
        let frame = Frame::from(["x", "not-a-number"]);

        assert!(input.hydrate_from(&mut frame.cursor(0)).is_err());
        assert_eq!(input.name, "keep");
    }
}
