//! Editing session
//!
//! Spawns the editor on a PTY and relays between it and the controlling
//! terminal: keyboard input goes through the [`Translator`], editor output
//! is copied to the screen unchanged.

use std::io::{self, Write};
use std::os::fd::BorrowedFd;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use nix::errno::Errno;
use nix::libc::{self, STDIN_FILENO};
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use tracing::{debug, info, warn};

use crate::app::{vimrc, Config};
use crate::editor::{CursorPosition, CursorProbe, ProbeError};
use crate::pty::{Pty, PtyError};
use crate::translator::Translator;
use crate::tty::{self, CursorReporter, RawModeGuard};

/// How long editor output must be quiet before the cursor is queried
const SETTLE_TIME: Duration = Duration::from_millis(10);

static RESIZED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigwinch(_: libc::c_int) {
    RESIZED.store(true, Ordering::Relaxed);
}

/// Error type for a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("stdin is not a terminal")]
    NotATerminal,

    #[error("Failed to write editor startup script: {0}")]
    Script(#[source] io::Error),

    #[error("Failed to enter raw mode: {0}")]
    RawMode(#[source] io::Error),

    #[error("Failed to install SIGWINCH handler: {0}")]
    Signal(#[source] nix::Error),

    #[error(transparent)]
    Pty(#[from] PtyError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Edit `file` until the editor exits
///
/// Returns the editor's exit status.
pub fn run(config: &Config, file: &Path) -> Result<i32, SessionError> {
    if !tty::stdin_is_tty() {
        return Err(SessionError::NotATerminal);
    }

    // Removed when dropped at the end of the session
    let script = vimrc::write_script(config).map_err(SessionError::Script)?;
    let args = vimrc::editor_args(script.path(), file);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let size = tty::window_size();
    info!(
        editor = %config.editor,
        file = %file.display(),
        cols = size.cols,
        rows = size.rows,
        "starting session"
    );
    let mut pty = Pty::spawn(&config.editor, &args, size)?;

    let raw_guard = RawModeGuard::new().map_err(SessionError::RawMode)?;
    install_resize_handler()?;

    let mut reporter = config
        .probe_cursor
        .then(|| CursorReporter::new(config.cursor_query_timeout()));
    let mut translator = Translator::new(config.modifier_scheme);

    let relayed = relay(&pty, &mut translator, &mut reporter, config.escape_timeout());
    drop(raw_guard);
    relayed?;

    let status = pty.wait()?;
    info!(status, "editor exited");
    Ok(status)
}

fn install_resize_handler() -> Result<(), SessionError> {
    let action = SigAction::new(
        SigHandler::Handler(on_sigwinch),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // SAFETY: the handler only stores to an atomic
    unsafe { sigaction(Signal::SIGWINCH, &action) }.map_err(SessionError::Signal)?;
    Ok(())
}

/// Shuttle bytes until the editor hangs up
fn relay(
    pty: &Pty,
    translator: &mut Translator,
    reporter: &mut Option<CursorReporter>,
    escape_timeout: Duration,
) -> Result<(), SessionError> {
    let mut stdin_buf = [0u8; 4096];
    let mut pty_buf = [0u8; 65536];
    let mut stdin_open = true;

    // SAFETY: both descriptors outlive this function
    let stdin_fd = unsafe { BorrowedFd::borrow_raw(STDIN_FILENO) };
    let master_fd = unsafe { BorrowedFd::borrow_raw(pty.master_fd()) };

    loop {
        if RESIZED.swap(false, Ordering::Relaxed) {
            pty.resize(tty::window_size())?;
        }

        // A held fragment gets as long as a query would to finish arriving
        let quiet_after = match reporter.as_ref() {
            Some(r) if r.has_held() => Some(escape_timeout.max(r.timeout())),
            _ if translator.is_pending() => Some(escape_timeout),
            _ => None,
        };
        let timeout_ms = quiet_after.map_or(-1, tty::poll_timeout_ms);
        let stdin_events = if stdin_open {
            PollFlags::POLLIN
        } else {
            PollFlags::empty()
        };
        let mut fds = [
            PollFd::new(&stdin_fd, stdin_events),
            PollFd::new(&master_fd, PollFlags::POLLIN),
        ];

        let ready = match poll(&mut fds, timeout_ms) {
            Ok(n) => n,
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(PtyError::Poll(e).into()),
        };

        if ready == 0 {
            // Input went quiet in the middle of a unit: a lone ESC is the
            // Escape key, and a held fragment was not a cursor report
            if let Some(held) = reporter.as_mut().map(CursorReporter::release_held) {
                translate(translator, &held, pty, reporter)?;
            }
            let mut probe = SessionProbe::new(pty, reporter);
            translator.flush(&mut probe, &mut &*pty)?;
            continue;
        }

        let stdin_ready = fds[0].revents().unwrap_or(PollFlags::empty());
        let master_ready = fds[1].revents().unwrap_or(PollFlags::empty());

        if master_ready.intersects(PollFlags::POLLIN | PollFlags::POLLHUP) {
            match pty.read(&mut pty_buf) {
                Ok(0) if master_ready.contains(PollFlags::POLLHUP) => return Ok(()),
                Ok(n) => write_screen(&pty_buf[..n])?,
                Err(e) if e.is_hangup() => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }

        if stdin_ready.intersects(PollFlags::POLLIN | PollFlags::POLLHUP) {
            let n = tty::read_stdin(&mut stdin_buf)?;
            if n == 0 {
                warn!("end of input, waiting for the editor to exit");
                stdin_open = false;
                continue;
            }
            let input = match reporter.as_mut() {
                Some(reporter) => reporter.screen(&stdin_buf[..n]),
                None => stdin_buf[..n].to_vec(),
            };
            translate(translator, &input, pty, reporter)?;
        }
    }
}

/// Feed a chunk of keyboard input, then any input the cursor reporter
/// had to set aside while waiting for a report
///
/// `chunk` must already be free of overdue cursor reports.
fn translate(
    translator: &mut Translator,
    chunk: &[u8],
    pty: &Pty,
    reporter: &mut Option<CursorReporter>,
) -> io::Result<()> {
    let mut probe = SessionProbe::new(pty, reporter);
    translator.feed(chunk, &mut probe, &mut &*pty)?;

    while let Some(reporter_ref) = reporter.as_mut().filter(|r| r.has_stash()) {
        let stash = reporter_ref.take_stash();
        debug!(
            bytes = stash.len(),
            overdue_reports = reporter_ref.outstanding(),
            "replaying input received during cursor query"
        );
        let mut probe = SessionProbe::new(pty, reporter);
        translator.feed(&stash, &mut probe, &mut &*pty)?;
    }
    Ok(())
}

fn write_screen(bytes: &[u8]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()
}

/// Cursor probe for a live session
///
/// The editor may still be reacting to the commands just sent, so its
/// output is relayed to the screen until it goes quiet before the terminal
/// is asked where the cursor is.
struct SessionProbe<'a> {
    pty: &'a Pty,
    reporter: Option<&'a mut CursorReporter>,
}

impl<'a> SessionProbe<'a> {
    fn new(pty: &'a Pty, reporter: &'a mut Option<CursorReporter>) -> Self {
        Self {
            pty,
            reporter: reporter.as_mut(),
        }
    }
}

/// Relay editor output to the screen until it has been quiet for
/// [`SETTLE_TIME`]
fn settle(pty: &Pty) -> io::Result<()> {
    let mut buf = [0u8; 4096];
    let settle_ms = tty::poll_timeout_ms(SETTLE_TIME);
    while pty.poll_read(settle_ms).map_err(io::Error::other)? {
        match pty.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => write_screen(&buf[..n])?,
            // The relay loop sees the hang-up on its next poll
            Err(e) if e.is_hangup() => break,
            Err(e) => return Err(io::Error::other(e)),
        }
    }
    Ok(())
}

impl CursorProbe for SessionProbe<'_> {
    fn cursor_position(&mut self) -> Result<CursorPosition, ProbeError> {
        let Some(reporter) = self.reporter.as_deref_mut() else {
            return Err(ProbeError::Disabled);
        };
        settle(self.pty)?;
        reporter.cursor_position()
    }
}
