//! Controlling terminal
//!
//! Raw mode, window size and the cursor position query against the real
//! terminal shvim runs in.

use std::io::{self, Write};
use std::os::fd::BorrowedFd;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::libc::{self, STDIN_FILENO, STDOUT_FILENO};
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::termios::{
    self, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices,
    Termios,
};
use nix::unistd::read;
use tracing::{debug, trace};

use crate::editor::{
    find_cursor_report, partial_report_start, CursorPosition, CursorProbe, ProbeError,
};
use crate::pty::{get_window_size, WindowSize};

/// Device Status Report: ask for the cursor position
const CURSOR_QUERY: &[u8] = b"\x1b[6n";

/// RAII guard for raw terminal mode
///
/// Input arrives byte by byte with no echo, no signal keys and no CR/NL
/// mapping; output post-processing is off. The original settings are
/// restored on drop.
pub struct RawModeGuard {
    original: Termios,
}

impl RawModeGuard {
    pub fn new() -> io::Result<Self> {
        let original = termios::tcgetattr(io::stdin()).map_err(io::Error::from)?;

        let mut raw = original.clone();
        raw.input_flags.remove(
            InputFlags::BRKINT
                | InputFlags::ICRNL
                | InputFlags::INPCK
                | InputFlags::ISTRIP
                | InputFlags::IXON,
        );
        raw.output_flags.remove(OutputFlags::OPOST);
        raw.control_flags.insert(ControlFlags::CS8);
        raw.local_flags
            .remove(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN | LocalFlags::ISIG);

        // Set minimum characters and timeout
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        termios::tcsetattr(io::stdin(), SetArg::TCSAFLUSH, &raw).map_err(io::Error::from)?;

        Ok(Self { original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = termios::tcsetattr(io::stdin(), SetArg::TCSAFLUSH, &self.original);
    }
}

/// Current size of the controlling terminal
///
/// Falls back to 80x24 when stdout is not a terminal.
pub fn window_size() -> WindowSize {
    match get_window_size(STDOUT_FILENO) {
        Ok(size) if size.cols > 0 && size.rows > 0 => size,
        _ => WindowSize::default(),
    }
}

/// Convert a timeout to poll(2) milliseconds, saturating instead of wrapping
/// into the negative "wait forever" range
pub fn poll_timeout_ms(timeout: Duration) -> i32 {
    i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX)
}

/// Wait until stdin is readable or `timeout` passes
///
/// `None` blocks indefinitely. Interrupted waits report "not ready".
pub fn poll_stdin(timeout: Option<Duration>) -> io::Result<bool> {
    // SAFETY: stdin stays open for the life of the process
    let stdin = unsafe { BorrowedFd::borrow_raw(STDIN_FILENO) };
    let mut fds = [PollFd::new(&stdin, PollFlags::POLLIN)];
    let timeout_ms = timeout.map_or(-1, poll_timeout_ms);

    match poll(&mut fds, timeout_ms) {
        Ok(0) | Err(Errno::EINTR) => Ok(false),
        Ok(_) => Ok(fds[0].revents().is_some_and(|r| !r.is_empty())),
        Err(e) => Err(e.into()),
    }
}

/// Read whatever stdin has; 0 means end of input
pub fn read_stdin(buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match read(STDIN_FILENO, buf) {
            Ok(n) => return Ok(n),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Asks the controlling terminal where its cursor is
///
/// The query goes to stdout and the report comes back on stdin, mixed in
/// with whatever the user typed meanwhile. Those bytes are kept in a stash
/// that the caller must drain with [`CursorReporter::take_stash`] and treat
/// as input.
///
/// A query that times out is still answered eventually. Until then its
/// report may turn up in any later read, so every chunk of input has to
/// pass through [`CursorReporter::screen`] before it is translated.
#[derive(Debug)]
pub struct CursorReporter {
    timeout: Duration,
    stash: Vec<u8>,
    /// Queries that timed out and have not been answered yet
    outstanding: usize,
    /// Tail of the input that may be the start of an overdue report
    held: Vec<u8>,
}

impl CursorReporter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            stash: Vec::new(),
            outstanding: 0,
            held: Vec::new(),
        }
    }

    /// How long a query waits for its report
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Input that arrived while waiting for a report
    pub fn take_stash(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.stash)
    }

    pub fn has_stash(&self) -> bool {
        !self.stash.is_empty()
    }

    /// Number of timed-out queries whose report is still due
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Whether input is held back waiting to see if it is a report
    pub fn has_held(&self) -> bool {
        !self.held.is_empty()
    }

    /// Give up on a held tail: it was keyboard input after all
    pub fn release_held(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.held)
    }

    /// Remove overdue reports from a chunk of keyboard input
    ///
    /// Returns the bytes to translate, in arrival order. While a report is
    /// still due, a trailing fragment that could start one is held back
    /// and prepended to the next chunk.
    pub fn screen(&mut self, input: &[u8]) -> Vec<u8> {
        let mut bytes = std::mem::take(&mut self.held);
        bytes.extend_from_slice(input);
        if self.outstanding == 0 {
            return bytes;
        }

        let mut kept = Vec::with_capacity(bytes.len());
        let mut rest = &bytes[..];
        while self.outstanding > 0 {
            let Some((range, pos)) = find_cursor_report(rest) else {
                break;
            };
            debug!(row = pos.row, col = pos.col, "discarding overdue cursor report");
            kept.extend_from_slice(&rest[..range.start]);
            rest = &rest[range.end..];
            self.outstanding -= 1;
        }

        if self.outstanding > 0 {
            if let Some(start) = partial_report_start(rest) {
                kept.extend_from_slice(&rest[..start]);
                self.held = rest[start..].to_vec();
                return kept;
            }
        }
        kept.extend_from_slice(rest);
        kept
    }

    /// Separate the report from `received`, stashing everything else
    ///
    /// Reports owed to earlier timed-out queries arrive first and are
    /// dropped. Returns `None` (and keeps the unconsumed tail of
    /// `received` for the next call) while no full report for this query
    /// has arrived.
    fn extract(&mut self, received: &mut Vec<u8>) -> Option<CursorPosition> {
        while let Some((range, pos)) = find_cursor_report(received) {
            self.stash.extend_from_slice(&received[..range.start]);
            received.drain(..range.end);
            if self.outstanding == 0 {
                self.stash.append(received);
                return Some(pos);
            }
            debug!(row = pos.row, col = pos.col, "discarding overdue cursor report");
            self.outstanding -= 1;
        }
        None
    }

    /// Record a query that got no answer in time
    ///
    /// Typed bytes in `received` go to the stash; a cut-off report is
    /// held so the rest of it can be recognized when it arrives.
    fn abandon(&mut self, received: &mut Vec<u8>) {
        self.outstanding += 1;
        let split = partial_report_start(received).unwrap_or(received.len());
        self.held = received.split_off(split);
        self.stash.append(received);
        trace!(
            outstanding = self.outstanding,
            held = ?self.held,
            "cursor report timed out"
        );
    }
}

impl CursorProbe for CursorReporter {
    fn cursor_position(&mut self) -> Result<CursorPosition, ProbeError> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(CURSOR_QUERY)?;
        stdout.flush()?;
        drop(stdout);

        let deadline = Instant::now() + self.timeout;
        // A fragment held from an earlier timeout may be completed by
        // the first bytes read here
        let mut received = self.release_held();
        let mut buf = [0u8; 256];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                self.abandon(&mut received);
                return Err(ProbeError::Timeout(self.timeout));
            }
            if !poll_stdin(Some(remaining))? {
                continue;
            }

            let n = read_stdin(&mut buf)?;
            if n == 0 {
                self.stash.append(&mut received);
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            received.extend_from_slice(&buf[..n]);

            if let Some(pos) = self.extract(&mut received) {
                return Ok(pos);
            }
        }
    }
}

/// Whether stdin is attached to a terminal
pub fn stdin_is_tty() -> bool {
    // SAFETY: isatty only inspects the descriptor
    unsafe { libc::isatty(STDIN_FILENO) == 1 }
}
