//! shvim
//!
//! Runs vim on a pseudoterminal and translates GUI-style editing keys
//! (shift-arrow selection, Ctrl+C/X/V, Ctrl+S, Ctrl+F, ...) into vim
//! commands on the way in.
//!
//! - `input`: sequence buffering and keystroke decoding
//! - `editor`: the mode state machine and the directives it emits
//! - `translator`: ties the two together behind `feed`
//! - `pty`, `tty`, `session`: the editor process and the relay loop
//! - `app`: configuration, startup script, logging

pub mod app;
pub mod editor;
pub mod input;
pub mod pty;
pub mod session;
pub mod translator;
pub mod tty;

pub use translator::Translator;
