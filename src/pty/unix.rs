//! Unix PTY implementation
//!
//! Implements PTY creation and child process management using POSIX APIs.

use std::ffi::CString;
use std::io;
use std::os::fd::BorrowedFd;
use std::os::unix::io::{AsRawFd, RawFd};

use nix::errno::Errno;
use nix::fcntl::{fcntl, open, FcntlArg, OFlag};
use nix::libc::{self, STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::poll::{poll, PollFd, PollFlags};
use nix::pty::{grantpt, posix_openpt, ptsname, unlockpt, PtyMaster};
use nix::sys::stat::Mode;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, dup2, execvp, fork, read, setsid, write, ForkResult, Pid};
use tracing::{debug, info};

use super::{PtyError, PtyResult, WindowSize};

/// Exit status reported when the child could not exec the program
const EXEC_FAILED: i32 = 127;

/// A pseudoterminal with a spawned child process
pub struct Pty {
    /// The PTY master file descriptor
    master: PtyMaster,
    /// The child process ID
    child_pid: Pid,
    /// Exit status once the child has been reaped
    exit_status: Option<i32>,
}

impl Pty {
    /// Spawn `program` on a new PTY of the given size
    ///
    /// # Arguments
    /// * `program` - Program to execute, looked up in `PATH`
    /// * `args` - Arguments after the program name
    /// * `size` - Initial window size
    ///
    /// Failures after the fork (missing program, bad slave) are printed on
    /// the PTY by the child, which then exits with status 127.
    pub fn spawn(program: &str, args: &[&str], size: WindowSize) -> PtyResult<Self> {
        // Build argv before forking; the child must not allocate
        let argv = std::iter::once(program)
            .chain(args.iter().copied())
            .map(|arg| CString::new(arg).map_err(|_| PtyError::InvalidArgument(arg.to_string())))
            .collect::<PtyResult<Vec<CString>>>()?;

        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).map_err(PtyError::OpenMaster)?;
        grantpt(&master).map_err(PtyError::GrantPty)?;
        unlockpt(&master).map_err(PtyError::UnlockPty)?;

        // SAFETY: ptsname is not thread-safe, but we're calling it immediately
        // after unlockpt and before any other thread could interfere
        let slave_name = unsafe { ptsname(&master) }.map_err(PtyError::PtsName)?;

        set_window_size(master.as_raw_fd(), size)?;

        // SAFETY: the child only calls async-signal-safe functions before exec
        match unsafe { fork() }.map_err(PtyError::Fork)? {
            ForkResult::Child => {
                drop(master);
                let err = exec_child(&slave_name, &argv);
                eprintln!("shvim: failed to start {}: {}", program, err);
                std::process::exit(EXEC_FAILED);
            }
            ForkResult::Parent { child } => {
                let flags = fcntl(master.as_raw_fd(), FcntlArg::F_GETFL)
                    .map_err(PtyError::SetNonBlocking)?;
                let flags = OFlag::from_bits_truncate(flags);
                fcntl(
                    master.as_raw_fd(),
                    FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK),
                )
                .map_err(PtyError::SetNonBlocking)?;

                info!(pid = child.as_raw(), program, "spawned editor");
                Ok(Pty {
                    master,
                    child_pid: child,
                    exit_status: None,
                })
            }
        }
    }

    /// Get the raw file descriptor of the PTY master
    pub fn master_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    /// Wait for the child process to exit and return its status
    ///
    /// A child killed by a signal reports `128 + signal`, as shells do.
    pub fn wait(&mut self) -> PtyResult<i32> {
        if let Some(code) = self.exit_status {
            return Ok(code);
        }

        loop {
            match waitpid(self.child_pid, None) {
                Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                    let code = exit_code(status);
                    self.exit_status = Some(code);
                    return Ok(code);
                }
                Ok(_) | Err(Errno::EINTR) => continue,
                Err(e) => return Err(PtyError::Wait(e)),
            }
        }
    }

    /// Read from the PTY master (non-blocking)
    ///
    /// Returns the number of bytes read, or 0 if no data is available.
    /// Once the editor has exited the read fails with `EIO`, see
    /// [`PtyError::is_hangup`].
    pub fn read(&self, buf: &mut [u8]) -> PtyResult<usize> {
        match read(self.master.as_raw_fd(), buf) {
            Ok(n) => Ok(n),
            // EAGAIN and EWOULDBLOCK are the same value on Linux
            Err(Errno::EAGAIN) | Err(Errno::EINTR) => Ok(0),
            Err(e) => Err(PtyError::Read(e)),
        }
    }

    /// Poll for data available to read
    ///
    /// Returns true if data is available (or the slave hung up), false if
    /// the timeout expired.
    pub fn poll_read(&self, timeout_ms: i32) -> PtyResult<bool> {
        Ok(self
            .poll(PollFlags::POLLIN, timeout_ms)?
            .intersects(PollFlags::POLLIN | PollFlags::POLLHUP))
    }

    /// Resize the PTY
    pub fn resize(&self, size: WindowSize) -> PtyResult<()> {
        debug!(cols = size.cols, rows = size.rows, "resize");
        set_window_size(self.master.as_raw_fd(), size)
    }

    fn poll(&self, events: PollFlags, timeout_ms: i32) -> PtyResult<PollFlags> {
        // SAFETY: The master fd is valid for the lifetime of this Pty
        let borrowed_fd = unsafe { BorrowedFd::borrow_raw(self.master.as_raw_fd()) };
        let mut fds = [PollFd::new(&borrowed_fd, events)];
        match poll(&mut fds, timeout_ms) {
            Ok(0) | Err(Errno::EINTR) => Ok(PollFlags::empty()),
            Ok(_) => Ok(fds[0].revents().unwrap_or(PollFlags::empty())),
            Err(e) => Err(PtyError::Poll(e)),
        }
    }
}

/// Editor input: blocks until every byte is accepted
///
/// Implemented for `&Pty` so the master can be written while it is also
/// borrowed for reading.
impl io::Write for &Pty {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        loop {
            match write(self.master.as_raw_fd(), data) {
                Ok(n) => return Ok(n),
                Err(Errno::EINTR) => continue,
                Err(Errno::EAGAIN) => {
                    self.poll(PollFlags::POLLOUT, -1).map_err(io::Error::other)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for Pty {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        // Try to reap the child process
        if self.exit_status.is_none() {
            let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
        }
    }
}

/// Child side of the fork: make the slave our terminal and exec
///
/// Only returns on failure.
fn exec_child(slave_name: &str, argv: &[CString]) -> nix::Error {
    if let Err(e) = setsid() {
        return e;
    }

    let slave_fd = match open(slave_name, OFlag::O_RDWR, Mode::empty()) {
        Ok(fd) => fd,
        Err(e) => return e,
    };

    // SAFETY: TIOCSCTTY is a valid ioctl for setting controlling terminal
    unsafe {
        // Not required on every platform; opening the slave after setsid
        // already did it on some
        libc::ioctl(slave_fd, libc::TIOCSCTTY as _, 0);
    }

    for target in [STDIN_FILENO, STDOUT_FILENO, STDERR_FILENO] {
        if let Err(e) = dup2(slave_fd, target) {
            return e;
        }
    }
    if slave_fd > STDERR_FILENO {
        let _ = close(slave_fd);
    }

    match execvp(&argv[0], argv) {
        Err(e) => e,
        Ok(never) => match never {},
    }
}

fn exit_code(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => code,
        WaitStatus::Signaled(_, signal, _) => 128 + signal as i32,
        _ => 0,
    }
}

/// Set the window size on a PTY file descriptor
fn set_window_size(fd: RawFd, size: WindowSize) -> PtyResult<()> {
    let winsize = libc::winsize {
        ws_row: size.rows,
        ws_col: size.cols,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    // SAFETY: TIOCSWINSZ is a valid ioctl for setting window size
    let result = unsafe { libc::ioctl(fd, libc::TIOCSWINSZ, &winsize) };

    if result < 0 {
        Err(PtyError::SetWinsize(Errno::last()))
    } else {
        Ok(())
    }
}

/// Get the window size of a terminal file descriptor
pub fn get_window_size(fd: RawFd) -> PtyResult<WindowSize> {
    let mut winsize = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    // SAFETY: TIOCGWINSZ is a valid ioctl for getting window size
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut winsize) };

    if result < 0 {
        Err(PtyError::SetWinsize(Errno::last()))
    } else {
        Ok(WindowSize::new(winsize.ws_col, winsize.ws_row))
    }
}
