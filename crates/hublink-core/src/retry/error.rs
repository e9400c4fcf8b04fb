//! The transient-error gate consulted before any delay is computed.

use std::fmt;

/// Errors that can say whether waiting and trying again may help.
///
/// Policies never retry an error whose `is_transient` returns `false`,
/// regardless of how many attempts remain.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl<T: Transient + ?Sized> Transient for &T {
    fn is_transient(&self) -> bool {
        (**self).is_transient()
    }
}

impl<T: Transient + ?Sized> Transient for Box<T> {
    fn is_transient(&self) -> bool {
        (**self).is_transient()
    }
}

/// Minimal error carrier for callers that only know a message and whether
/// the failure was transient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub transient: bool,
    pub message: String,
}

impl ErrorInfo {
    /// A failure expected to clear up on its own (timeout, connection reset).
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            transient: true,
            message: message.into(),
        }
    }

    /// A failure that retrying will not fix (bad credentials, unknown device).
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            transient: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.transient {
            write!(f, "transient: {}", self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ErrorInfo {}

impl Transient for ErrorInfo {
    fn is_transient(&self) -> bool {
        self.transient
    }
}
