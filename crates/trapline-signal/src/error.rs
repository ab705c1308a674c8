use std::fmt;

use crate::plan::Signal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// Handlers from an earlier arm are still installed.
    AlreadyArmed,
    /// `sigaction` refused the handler.
    Install { signal: Signal, errno: i32 },
    /// Signal handlers cannot be installed on this platform.
    Unsupported,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalError::AlreadyArmed => write!(f, "trap handlers already armed"),
            SignalError::Install { signal, errno } => {
                write!(f, "installing handler for signal {} failed (errno {})", signal.raw(), errno)
            }
            SignalError::Unsupported => write!(f, "trap handlers unsupported on this platform"),
        }
    }
}

impl std::error::Error for SignalError {}
