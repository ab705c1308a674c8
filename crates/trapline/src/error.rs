use std::fmt;

use context::ContextError;
use signal::SignalError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// Another guard is active; recovery points do not nest.
    AlreadyActive,
    /// The trap adapter could not be armed.
    Arm(SignalError),
    /// The execution context could not be captured.
    Context(ContextError),
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardError::AlreadyActive => write!(f, "a recovery point is already active"),
            GuardError::Arm(err) => write!(f, "arming trap handlers failed: {}", err),
            GuardError::Context(err) => write!(f, "capturing execution context failed: {}", err),
        }
    }
}

impl std::error::Error for GuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuardError::AlreadyActive => None,
            GuardError::Arm(err) => Some(err),
            GuardError::Context(err) => Some(err),
        }
    }
}

impl From<SignalError> for GuardError {
    fn from(err: SignalError) -> Self {
        GuardError::Arm(err)
    }
}

impl From<ContextError> for GuardError {
    fn from(err: ContextError) -> Self {
        GuardError::Context(err)
    }
}
