//! Input Decoding Module
//!
//! Turns the raw byte stream coming from the controlling terminal into
//! symbolic keystrokes. This is the reverse of what a terminal does when it
//! encodes key presses:
//!
//! - `buffer`: accumulates one input unit and decides when it is complete
//! - `decoder`: maps a complete unit to a [`Keystroke`], or reports it as literal
//!
//! # Modifier Encoding
//!
//! Modified navigation keys arrive as `CSI 1 ; <m> <final>` where `<m>` is
//! the ASCII digit `1 + bitmask`. How that digit is interpreted is selected by
//! [`ModifierScheme`], because not every terminal agrees on it.

mod buffer;
mod decoder;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use buffer::{Completeness, SequenceBuffer};
pub use decoder::{decode, interpret, Decoded};

/// Keyboard modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        meta: false,
    };

    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        ctrl: true,
        meta: false,
    };

    /// Decode the xterm modifier bitmask (the CSI parameter minus one)
    /// Shift=1, Meta=2, Ctrl=4
    pub fn from_bits(bits: u8) -> Self {
        Self {
            shift: bits & 1 != 0,
            meta: bits & 2 != 0,
            ctrl: bits & 4 != 0,
        }
    }
}

/// How the modifier digit of `CSI 1 ; <m> <final>` is interpreted.
///
/// Terminals disagree on plain-Ctrl versus Ctrl+Shift reports for arrow
/// keys, so both readings are available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModifierScheme {
    /// `m = 1 + bitmask`: `2` shift, `5` ctrl, `6` ctrl+shift, meta adds 2.
    #[default]
    Xterm,
    /// Only `2`, `5` and `6` are accepted; `5` and `6` both mean ctrl+shift.
    Aliased,
}

impl ModifierScheme {
    /// Parse a scheme name from a string
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "xterm" => Some(Self::Xterm),
            "aliased" => Some(Self::Aliased),
            _ => None,
        }
    }

    /// Decode the ASCII modifier digit, `None` if this scheme does not know it
    pub fn modifiers(self, digit: u8) -> Option<Modifiers> {
        match self {
            Self::Xterm => match digit {
                b'2'..=b'8' => Some(Modifiers::from_bits(digit - b'1')),
                _ => None,
            }
            Self::Aliased => match digit {
                b'2' => Some(Modifiers::SHIFT),
                b'5' | b'6' => Some(Modifiers::CTRL_SHIFT),
                _ => None,
            }
        }
    }
}

/// Symbolic key names the decoder can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // Cursor keys
    Up,
    Down,
    Left,
    Right,

    // Navigation
    Home,
    End,
    PageUp,
    PageDown,

    // Editing
    Delete,
    Backspace,
    /// Carriage return (0x0D)
    Enter,
    /// Line feed (0x0A)
    Return,
    Escape,

    /// NUL, what Ctrl+` sends
    Grave,

    /// A control letter `a..=z`, as sent with Ctrl held
    Char(u8),

    /// `<`, the outdent command in visual mode
    Less,
    /// `>`, the indent command in visual mode
    Greater,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Key::Up => "up",
            Key::Down => "down",
            Key::Left => "left",
            Key::Right => "right",
            Key::Home => "home",
            Key::End => "end",
            Key::PageUp => "pageup",
            Key::PageDown => "pagedown",
            Key::Delete => "delete",
            Key::Backspace => "backspace",
            Key::Enter => "enter",
            Key::Return => "return",
            Key::Escape => "escape",
            Key::Grave => "`",
            Key::Char(c) => return write!(f, "{}", *c as char),
            Key::Less => "<",
            Key::Greater => ">",
        };
        f.write_str(name)
    }
}

/// One decoded key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl Keystroke {
    /// A keystroke with no modifiers
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    /// A keystroke with the given modifiers
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.meta {
            f.write_str("Alt+")?;
        }
        if self.modifiers.shift {
            f.write_str("Shift+")?;
        }
        write!(f, "{}", self.key)
    }
}
