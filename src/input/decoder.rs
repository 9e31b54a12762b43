//! Keystroke Decoder
//!
//! Maps a complete input unit to a [`Keystroke`]. This is not an exhaustive
//! interpreter: only the navigation and editing sequences the translator acts
//! on are recognized, everything else is reported as literal so it can be
//! forwarded byte-for-byte.

use super::buffer::{completeness, Completeness};
use super::{Key, Keystroke, ModifierScheme, Modifiers};

const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;

/// Names of the C0 bytes below 0x1E, indexed by byte value
const CONTROL_KEYS: [Option<Key>; 30] = [
    Some(Key::Grave),
    Some(Key::Char(b'a')),
    Some(Key::Char(b'b')),
    Some(Key::Char(b'c')),
    Some(Key::Char(b'd')),
    Some(Key::Char(b'e')),
    Some(Key::Char(b'f')),
    Some(Key::Char(b'g')),
    Some(Key::Char(b'h')),
    Some(Key::Char(b'i')),
    Some(Key::Return),
    Some(Key::Char(b'k')),
    Some(Key::Char(b'l')),
    Some(Key::Enter),
    Some(Key::Char(b'n')),
    Some(Key::Char(b'o')),
    Some(Key::Char(b'p')),
    Some(Key::Char(b'q')),
    Some(Key::Char(b'r')),
    Some(Key::Char(b's')),
    Some(Key::Char(b't')),
    Some(Key::Char(b'u')),
    Some(Key::Char(b'v')),
    Some(Key::Char(b'w')),
    Some(Key::Char(b'x')),
    Some(Key::Char(b'y')),
    Some(Key::Char(b'z')),
    Some(Key::Escape),
    None,
    None,
];

/// Result of decoding the buffered bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A recognized key press
    Key(Keystroke),
    /// Complete, but not a special key; forward the raw bytes
    Literal,
    /// Wait for more bytes before deciding
    Incomplete,
}

/// Decode buffered bytes, waiting for the unit to complete first
pub fn decode(bytes: &[u8], scheme: ModifierScheme) -> Decoded {
    match completeness(bytes) {
        Completeness::Incomplete => Decoded::Incomplete,
        Completeness::Complete => match interpret(bytes, scheme) {
            Some(keystroke) => Decoded::Key(keystroke),
            None => Decoded::Literal,
        }
    }
}

/// Interpret a unit that is known (or forced) to be complete
pub fn interpret(bytes: &[u8], scheme: ModifierScheme) -> Option<Keystroke> {
    match *bytes {
        // [Ctrl +] [Shift +] <arrow|home|end|delete>
        [ESC, b'[', b'1', b';', m, fin] => {
            let key = if fin == b'~' {
                Key::Delete
            } else {
                cursor_key(fin)?
            };
            Some(Keystroke::new(key, scheme.modifiers(m)?))
        }
        [ESC, b'[', n @ (b'3' | b'5' | b'6'), b';', m, b'~'] => {
            Some(Keystroke::new(tilde_key(n)?, scheme.modifiers(m)?))
        }
        [ESC, b'[', n, b'~'] => tilde_key(n).map(Keystroke::plain),
        // Normal and application cursor mode
        [ESC, b'[' | b'O', fin] => cursor_key(fin).map(Keystroke::plain),
        [byte] => single_byte(byte),
        _ => None,
    }
}

/// Final byte of a cursor key sequence
fn cursor_key(fin: u8) -> Option<Key> {
    match fin {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        b'F' => Some(Key::End),
        b'H' => Some(Key::Home),
        _ => None,
    }
}

/// Parameter of a `CSI n ~` navigation sequence
fn tilde_key(n: u8) -> Option<Key> {
    match n {
        b'1' => Some(Key::Home),
        b'3' => Some(Key::Delete),
        b'4' => Some(Key::End),
        b'5' => Some(Key::PageUp),
        b'6' => Some(Key::PageDown),
        _ => None,
    }
}

fn single_byte(byte: u8) -> Option<Keystroke> {
    match byte {
        0x00..=0x1d => {
            let key = CONTROL_KEYS[byte as usize]?;
            let ctrl = !matches!(key, Key::Escape | Key::Return | Key::Enter);
            let modifiers = if ctrl { Modifiers::CTRL } else { Modifiers::NONE };
            Some(Keystroke::new(key, modifiers))
        }
        DEL => Some(Keystroke::plain(Key::Backspace)),
        b'<' => Some(Keystroke::plain(Key::Less)),
        b'>' => Some(Keystroke::plain(Key::Greater)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xterm(bytes: &[u8]) -> Decoded {
        decode(bytes, ModifierScheme::Xterm)
    }

    fn key(k: Key, modifiers: Modifiers) -> Decoded {
        Decoded::Key(Keystroke::new(k, modifiers))
    }

    #[test]
    fn test_shift_arrows() {
        assert_eq!(xterm(b"\x1b[1;2A"), key(Key::Up, Modifiers::SHIFT));
        assert_eq!(xterm(b"\x1b[1;2B"), key(Key::Down, Modifiers::SHIFT));
        assert_eq!(xterm(b"\x1b[1;2C"), key(Key::Right, Modifiers::SHIFT));
        assert_eq!(xterm(b"\x1b[1;2D"), key(Key::Left, Modifiers::SHIFT));
        assert_eq!(xterm(b"\x1b[1;2F"), key(Key::End, Modifiers::SHIFT));
        assert_eq!(xterm(b"\x1b[1;2H"), key(Key::Home, Modifiers::SHIFT));
    }

    #[test]
    fn test_ctrl_arrows_per_scheme() {
        assert_eq!(xterm(b"\x1b[1;5D"), key(Key::Left, Modifiers::CTRL));
        assert_eq!(xterm(b"\x1b[1;6D"), key(Key::Left, Modifiers::CTRL_SHIFT));

        let aliased = ModifierScheme::Aliased;
        assert_eq!(
            decode(b"\x1b[1;5D", aliased),
            key(Key::Left, Modifiers::CTRL_SHIFT)
        );
        assert_eq!(
            decode(b"\x1b[1;6D", aliased),
            key(Key::Left, Modifiers::CTRL_SHIFT)
        );
    }

    #[test]
    fn test_unknown_modifier_is_literal() {
        assert_eq!(xterm(b"\x1b[1;9D"), Decoded::Literal);
        assert_eq!(decode(b"\x1b[1;3D", ModifierScheme::Aliased), Decoded::Literal);
    }

    #[test]
    fn test_modified_delete_forms() {
        assert_eq!(xterm(b"\x1b[1;2~"), key(Key::Delete, Modifiers::SHIFT));
        assert_eq!(xterm(b"\x1b[3;5~"), key(Key::Delete, Modifiers::CTRL));
    }

    #[test]
    fn test_page_keys() {
        assert_eq!(xterm(b"\x1b[5~"), key(Key::PageUp, Modifiers::NONE));
        assert_eq!(xterm(b"\x1b[6~"), key(Key::PageDown, Modifiers::NONE));
        assert_eq!(xterm(b"\x1b[5;2~"), key(Key::PageUp, Modifiers::SHIFT));
        assert_eq!(xterm(b"\x1b[6;6~"), key(Key::PageDown, Modifiers::CTRL_SHIFT));
    }

    #[test]
    fn test_tilde_navigation() {
        assert_eq!(xterm(b"\x1b[1~"), key(Key::Home, Modifiers::NONE));
        assert_eq!(xterm(b"\x1b[3~"), key(Key::Delete, Modifiers::NONE));
        assert_eq!(xterm(b"\x1b[4~"), key(Key::End, Modifiers::NONE));
        // Insert is not something we translate
        assert_eq!(xterm(b"\x1b[2~"), Decoded::Literal);
    }

    #[test]
    fn test_plain_cursor_keys() {
        assert_eq!(xterm(b"\x1bOA"), key(Key::Up, Modifiers::NONE));
        assert_eq!(xterm(b"\x1bOH"), key(Key::Home, Modifiers::NONE));
        assert_eq!(xterm(b"\x1b[A"), key(Key::Up, Modifiers::NONE));
        assert_eq!(xterm(b"\x1b[F"), key(Key::End, Modifiers::NONE));
        assert_eq!(xterm(b"\x1bOP"), Decoded::Literal);
    }

    #[test]
    fn test_control_letters() {
        assert_eq!(xterm(&[0x01]), key(Key::Char(b'a'), Modifiers::CTRL));
        assert_eq!(xterm(&[0x03]), key(Key::Char(b'c'), Modifiers::CTRL));
        assert_eq!(xterm(&[0x1a]), key(Key::Char(b'z'), Modifiers::CTRL));
        assert_eq!(xterm(&[0x09]), key(Key::Char(b'i'), Modifiers::CTRL));
        assert_eq!(xterm(&[0x00]), key(Key::Grave, Modifiers::CTRL));
    }

    #[test]
    fn test_enter_return_not_ctrl() {
        assert_eq!(xterm(&[0x0d]), key(Key::Enter, Modifiers::NONE));
        assert_eq!(xterm(&[0x0a]), key(Key::Return, Modifiers::NONE));
    }

    #[test]
    fn test_escape_only_when_forced() {
        assert_eq!(xterm(b"\x1b"), Decoded::Incomplete);
        assert_eq!(
            interpret(b"\x1b", ModifierScheme::Xterm),
            Some(Keystroke::plain(Key::Escape))
        );
    }

    #[test]
    fn test_unused_control_slots_literal() {
        assert_eq!(xterm(&[0x1c]), Decoded::Literal);
        assert_eq!(xterm(&[0x1d]), Decoded::Literal);
        assert_eq!(xterm(&[0x1e]), Decoded::Literal);
    }

    #[test]
    fn test_backspace_and_indent() {
        assert_eq!(xterm(&[0x7f]), key(Key::Backspace, Modifiers::NONE));
        assert_eq!(xterm(b"<"), key(Key::Less, Modifiers::NONE));
        assert_eq!(xterm(b">"), key(Key::Greater, Modifiers::NONE));
    }

    #[test]
    fn test_printable_is_literal() {
        assert_eq!(xterm(b"a"), Decoded::Literal);
        assert_eq!(xterm(b" "), Decoded::Literal);
        assert_eq!(xterm(&[0xc3]), Decoded::Literal);
    }

    #[test]
    fn test_incomplete_prefixes() {
        assert_eq!(xterm(b"\x1b["), Decoded::Incomplete);
        assert_eq!(xterm(b"\x1b[1;"), Decoded::Incomplete);
        assert_eq!(xterm(b"\x1bO"), Decoded::Incomplete);
    }
}
