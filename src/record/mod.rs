//! Concrete records decoded by the verb catalog.

mod input;
mod status;

pub use input::InputInfo;
pub use status::{RecStatus, TunerState};
