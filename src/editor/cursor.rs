//! Cursor position queries
//!
//! A few translations depend on where the cursor sits on screen. The answer
//! comes from the real terminal through a request/response round-trip that
//! can fail or time out, so every caller must cope with an error.

use std::time::Duration;

/// A 1-based screen position, as reported by the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub row: u16,
    pub col: u16,
}

impl CursorPosition {
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// Whether the cursor is in the first column
    pub fn at_line_start(&self) -> bool {
        self.col <= 1
    }
}

/// Error type for cursor position queries
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("No cursor report within {0:?}")]
    Timeout(Duration),

    #[error("Malformed cursor report: {0:?}")]
    Malformed(Vec<u8>),

    #[error("Cursor probing is disabled")]
    Disabled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can tell where the editor's cursor currently is
pub trait CursorProbe {
    fn cursor_position(&mut self) -> Result<CursorPosition, ProbeError>;
}

/// A probe that never answers, used when probing is turned off
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProbe;

impl CursorProbe for NoProbe {
    fn cursor_position(&mut self) -> Result<CursorPosition, ProbeError> {
        Err(ProbeError::Disabled)
    }
}

/// Parse a complete `ESC [ row ; col R` report
pub fn parse_cursor_report(bytes: &[u8]) -> Result<CursorPosition, ProbeError> {
    let malformed = || ProbeError::Malformed(bytes.to_vec());

    let body = bytes
        .strip_prefix(b"\x1b[")
        .and_then(|rest| rest.strip_suffix(b"R"))
        .ok_or_else(malformed)?;

    let mut fields = body.split(|&b| b == b';');
    let row = fields.next().and_then(parse_number).ok_or_else(malformed)?;
    let col = fields.next().and_then(parse_number).ok_or_else(malformed)?;
    if fields.next().is_some() {
        return Err(malformed());
    }

    Ok(CursorPosition::new(row, col))
}

/// Find the first cursor report inside `bytes`
///
/// Returns the byte range of the report and the decoded position. Bytes
/// around the report are ordinary input that arrived while waiting.
pub fn find_cursor_report(bytes: &[u8]) -> Option<(std::ops::Range<usize>, CursorPosition)> {
    let mut start = 0;
    while let Some(offset) = bytes[start..].windows(2).position(|w| w == b"\x1b[") {
        let begin = start + offset;
        let body_start = begin + 2;
        let end = bytes[body_start..]
            .iter()
            .position(|b| !(b.is_ascii_digit() || *b == b';'))
            .map(|i| body_start + i);

        if let Some(end) = end {
            if bytes[end] == b'R' {
                if let Ok(pos) = parse_cursor_report(&bytes[begin..=end]) {
                    return Some((begin..end + 1, pos));
                }
            }
        }
        start = body_start;
    }
    None
}

/// Start of a cursor report cut off at the end of `bytes`
///
/// Matches `ESC`, `ESC [` and `ESC [ row`, `ESC [ row ;`, `ESC [ row ; col`
/// with no final `R` yet.
pub fn partial_report_start(bytes: &[u8]) -> Option<usize> {
    let begin = bytes.iter().rposition(|&b| b == 0x1b)?;
    match &bytes[begin + 1..] {
        [] => Some(begin),
        [b'[', body @ ..] => {
            let fields_only = body.iter().all(|b| b.is_ascii_digit() || *b == b';');
            let separators = body.iter().filter(|&&b| b == b';').count();
            (fields_only && separators <= 1).then_some(begin)
        }
        _ => None,
    }
}

fn parse_number(field: &[u8]) -> Option<u16> {
    if field.is_empty() || !field.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(field).ok()?.parse().ok()
}
