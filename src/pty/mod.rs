//! PTY (Pseudoterminal) handling
//!
//! Spawns the editor on a pseudoterminal and moves bytes in and out of it.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::{get_window_size, Pty};

/// Error type for PTY operations
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    #[error("Failed to open PTY master: {0}")]
    OpenMaster(#[source] nix::Error),

    #[error("Failed to grant PTY access: {0}")]
    GrantPty(#[source] nix::Error),

    #[error("Failed to unlock PTY: {0}")]
    UnlockPty(#[source] nix::Error),

    #[error("Failed to get PTY slave name: {0}")]
    PtsName(#[source] nix::Error),

    #[error("Invalid program or argument {0:?}: contains a NUL byte")]
    InvalidArgument(String),

    #[error("Failed to fork: {0}")]
    Fork(#[source] nix::Error),

    #[error("Failed to set window size: {0}")]
    SetWinsize(#[source] nix::Error),

    #[error("Failed to read from PTY: {0}")]
    Read(#[source] nix::Error),

    #[error("Failed to set non-blocking mode: {0}")]
    SetNonBlocking(#[source] nix::Error),

    #[error("Failed to poll: {0}")]
    Poll(#[source] nix::Error),

    #[error("Failed to wait for child: {0}")]
    Wait(#[source] nix::Error),
}

impl PtyError {
    /// The slave side was closed, i.e. the editor is gone
    pub fn is_hangup(&self) -> bool {
        matches!(self, PtyError::Read(nix::errno::Errno::EIO))
    }
}

/// Result type for PTY operations
pub type PtyResult<T> = Result<T, PtyError>;

/// Window size for PTY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub rows: u16,
    pub cols: u16,
}

impl WindowSize {
    /// Create a new window size from columns and rows
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { rows, cols }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_size() {
        let size = WindowSize::new(80, 24);
        assert_eq!(size.cols, 80);
        assert_eq!(size.rows, 24);
        assert_eq!(size, WindowSize::default());
    }

    #[test]
    fn test_hangup_detection() {
        assert!(PtyError::Read(nix::errno::Errno::EIO).is_hangup());
        assert!(!PtyError::Read(nix::errno::Errno::EBADF).is_hangup());
        assert!(!PtyError::Poll(nix::errno::Errno::EIO).is_hangup());
    }
}
