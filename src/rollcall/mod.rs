//! Roll call: reconciling enrolled students with persisted attendance.
//!
//! [`draft`] holds the pure merge rules; [`RollCallController`] wires them to
//! the attendance and class stores.

mod controller;
pub mod draft;

pub use controller::{
    Phase, RollCallController, RollCallError, RollCallState, SaveOutcome, SessionSwitch,
};
pub use draft::{AttendanceDraft, DraftEntry};
