//! Keystroke translator
//!
//! Ties the sequence buffer, the decoder and the mode state together behind
//! a single entry point: feed it whatever the terminal delivered and it
//! writes the resulting commands and bytes to the editor.
//!
//! Input is consumed one byte at a time so a unit never spans two keys, no
//! matter how reads were chunked. Every complete unit is written out before
//! the next one is classified.

use std::io::{self, Write};

use tracing::{debug, trace};

use crate::editor::{
    transition, CursorPosition, CursorProbe, ModeState, ProbeError, Translation,
};
use crate::input::{decode, interpret, Decoded, Keystroke, ModifierScheme, SequenceBuffer};

/// Per-session translation state
#[derive(Debug, Default)]
pub struct Translator {
    buffer: SequenceBuffer,
    state: ModeState,
    scheme: ModifierScheme,
}

impl Translator {
    /// Create a translator with all modes off
    pub fn new(scheme: ModifierScheme) -> Self {
        Self {
            buffer: SequenceBuffer::new(),
            state: ModeState::new(),
            scheme,
        }
    }

    /// Current editor mode flags
    pub fn state(&self) -> &ModeState {
        &self.state
    }

    /// Whether an incomplete unit is waiting for more bytes
    pub fn is_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Bytes of the incomplete unit, if any
    pub fn pending(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Process newly read bytes
    ///
    /// Returns every unit completed by this chunk, already written to
    /// `editor`. A trailing incomplete unit stays buffered.
    pub fn feed<P, W>(
        &mut self,
        chunk: &[u8],
        probe: &mut P,
        editor: &mut W,
    ) -> io::Result<Vec<Translation>>
    where
        P: CursorProbe + ?Sized,
        W: Write + ?Sized,
    {
        let mut done = Vec::new();

        for &byte in chunk {
            if self.buffer.ends_before(byte) {
                done.extend(self.flush(probe, editor)?);
            }

            self.buffer.push(byte);
            let keystroke = match decode(self.buffer.as_bytes(), self.scheme) {
                Decoded::Incomplete => continue,
                Decoded::Key(keystroke) => Some(keystroke),
                Decoded::Literal => None,
            };

            let translation = self.complete(keystroke, probe);
            translation.directive.execute(&translation.raw, editor)?;
            done.push(translation);
        }

        Ok(done)
    }

    /// Classify a pending unit without waiting for more bytes
    ///
    /// Used when input goes quiet after a lone ESC, which is then the Escape
    /// key rather than the start of a sequence, and when an ESC arrives in
    /// the middle of a unit.
    pub fn flush<P, W>(&mut self, probe: &mut P, editor: &mut W) -> io::Result<Option<Translation>>
    where
        P: CursorProbe + ?Sized,
        W: Write + ?Sized,
    {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let keystroke = interpret(self.buffer.as_bytes(), self.scheme);
        let translation = self.complete(keystroke, probe);
        translation.directive.execute(&translation.raw, editor)?;
        Ok(Some(translation))
    }

    fn complete<P>(&mut self, keystroke: Option<Keystroke>, probe: &mut P) -> Translation
    where
        P: CursorProbe + ?Sized,
    {
        let raw = self.buffer.take();
        trace!(raw = ?raw, "input unit");

        match &keystroke {
            Some(k) => debug!(keystroke = %k, selecting = self.state.selecting(), "keystroke"),
            None => debug!(selecting = self.state.selecting(), "keystroke not interpreted"),
        }

        let directive = transition(&mut self.state, keystroke.as_ref(), &mut AsDyn(probe));
        Translation {
            raw,
            keystroke,
            directive,
        }
    }
}

/// Adapts a possibly unsized probe to `&mut dyn CursorProbe`
struct AsDyn<'a, P: ?Sized>(&'a mut P);

impl<P: CursorProbe + ?Sized> CursorProbe for AsDyn<'_, P> {
    fn cursor_position(&mut self) -> Result<CursorPosition, ProbeError> {
        self.0.cursor_position()
    }
}
