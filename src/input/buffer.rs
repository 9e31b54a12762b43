//! Sequence Buffer
//!
//! Accumulates the bytes of one input unit until it can be classified.
//! Terminal reads may split an escape sequence anywhere, so a unit is only
//! handed to the decoder once the bytes seen so far are known to be complete.

const ESC: u8 = 0x1b;

/// Whether a buffered unit can be classified yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// The unit is finished; decode it and clear the buffer
    Complete,
    /// More bytes are needed before the unit can be classified
    Incomplete,
}

/// Bytes of the input unit currently being assembled
#[derive(Debug, Default)]
pub struct SequenceBuffer {
    /// Bytes consumed so far; the length is the fill cursor
    bytes: Vec<u8>,
}

impl SequenceBuffer {
    /// Upper bound on a unit. Anything longer is flushed as literal bytes.
    pub const CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(Self::CAPACITY),
        }
    }

    /// Append one byte to the pending unit
    pub fn push(&mut self, byte: u8) {
        debug_assert!(self.bytes.len() < Self::CAPACITY);
        self.bytes.push(byte);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take the buffered unit, leaving the buffer empty
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::replace(&mut self.bytes, Vec::with_capacity(Self::CAPACITY))
    }

    pub fn completeness(&self) -> Completeness {
        completeness(&self.bytes)
    }

    /// Whether `byte` has to start a new unit rather than extend this one
    ///
    /// ESC never occurs inside a sequence, so it ends whatever is pending:
    /// a lone ESC followed by another is the Escape key.
    pub fn ends_before(&self, byte: u8) -> bool {
        byte == ESC && !self.bytes.is_empty()
    }
}

/// Decide whether `bytes` form a complete input unit
pub fn completeness(bytes: &[u8]) -> Completeness {
    if bytes.len() >= SequenceBuffer::CAPACITY {
        return Completeness::Complete;
    }

    match bytes {
        [] => Completeness::Incomplete,
        [first, ..] if *first != ESC => Completeness::Complete,
        // A lone ESC is either the Escape key or the start of a sequence
        [_] => Completeness::Incomplete,
        [_, b'O', rest @ ..] => {
            if rest.is_empty() {
                Completeness::Incomplete
            } else {
                Completeness::Complete
            }
        }
        [_, b'[', rest @ ..] => csi_completeness(rest),
        _ => Completeness::Complete,
    }
}

/// CSI sequences run until a final byte in 0x40..=0x7E
fn csi_completeness(body: &[u8]) -> Completeness {
    for &byte in body {
        match byte {
            // Parameter and intermediate bytes (digits, `;`, `?`, ...)
            0x20..=0x3f => continue,
            // Final byte (`A`..`H`, `~`, ...)
            0x40..=0x7e => return Completeness::Complete,
            // Not valid inside CSI, flush what we have
            _ => return Completeness::Complete,
        }
    }
    Completeness::Incomplete
}
