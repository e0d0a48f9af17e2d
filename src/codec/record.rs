//! Record encoding seams.
//!
//! Domain records own their field layout. The catalog only needs to append
//! a record to a request and hydrate one from a reply.

use super::FieldCursor;
use crate::error::Result;
use crate::protocol::Frame;

/// Append a record's fields to a frame.
pub trait ToFields {
    /// Push this record's fields, in wire order.
    fn to_fields(&self, frame: &mut Frame);
}

/// Hydrate a record from a run of fields.
pub trait FromFields: Sized {
    /// Number of fields one record occupies.
    const FIELD_COUNT: usize;

    /// Read one record, advancing the cursor past its fields.
    fn from_fields(cursor: &mut FieldCursor<'_>) -> Result<Self>;

    /// Replace `self` with a record read from the cursor.
    ///
    /// On error `self` is left untouched.
    fn hydrate_from(&mut self, cursor: &mut FieldCursor<'_>) -> Result<()> {
        *self = Self::from_fields(cursor)?;
        Ok(())
    }
}

/// A recording record exchanged with the peer.
pub trait ProgramRecord: ToFields + FromFields + Send + Sync {
    /// Update the file path after a successful file check.
    fn set_pathname(&mut self, pathname: String);
}
