//! Output directives
//!
//! The transition function never writes anything itself. It returns a
//! [`Directive`] and the executor applies it to the editor's input.

use std::io::{self, Write};

use crate::input::Keystroke;

/// What to send to the editor for one input unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Command byte-strings, written in order
    pub commands: Vec<&'static [u8]>,
    /// Whether the original bytes follow the commands
    pub pass_through: bool,
}

impl Directive {
    /// Forward the original bytes after any commands
    pub fn pass() -> Self {
        Self {
            commands: Vec::new(),
            pass_through: true,
        }
    }

    /// Send only the commands; the original bytes are dropped
    pub fn suppress() -> Self {
        Self {
            commands: Vec::new(),
            pass_through: false,
        }
    }

    /// Append a command
    pub fn push(&mut self, command: &'static [u8]) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Builder form of [`Directive::push`]
    pub fn with(mut self, command: &'static [u8]) -> Self {
        self.commands.push(command);
        self
    }

    /// Builder form for several commands
    pub fn with_all(mut self, commands: &[&'static [u8]]) -> Self {
        self.commands.extend_from_slice(commands);
        self
    }

    /// All bytes this directive sends for `raw`, in write order
    pub fn render(&self, raw: &[u8]) -> Vec<u8> {
        let mut out: Vec<u8> = self.commands.concat();
        if self.pass_through {
            out.extend_from_slice(raw);
        }
        out
    }

    /// Write the directive to the editor
    ///
    /// Each command is written whole; short writes are the writer's concern.
    pub fn execute<W: Write + ?Sized>(&self, raw: &[u8], editor: &mut W) -> io::Result<()> {
        for command in &self.commands {
            editor.write_all(command)?;
        }
        if self.pass_through && !raw.is_empty() {
            editor.write_all(raw)?;
        }
        editor.flush()
    }
}

/// One classified input unit and what was done with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// The raw bytes of the unit
    pub raw: Vec<u8>,
    /// The decoded key, `None` for literal input
    pub keystroke: Option<Keystroke>,
    pub directive: Directive,
}

impl Translation {
    /// Bytes sent to the editor for this unit
    pub fn output(&self) -> Vec<u8> {
        self.directive.render(&self.raw)
    }
}
