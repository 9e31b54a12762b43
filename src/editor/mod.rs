//! Editor control
//!
//! The mode state machine that turns keystrokes into vim commands, and the
//! directives it produces.

pub mod commands;
mod cursor;
mod directive;
mod mode;

pub use cursor::{
    find_cursor_report, parse_cursor_report, partial_report_start, CursorPosition, CursorProbe,
    NoProbe, ProbeError,
};
pub use directive::{Directive, Translation};
pub use mode::{classify, transition, Chord, Handler, ModeState, Motion};
