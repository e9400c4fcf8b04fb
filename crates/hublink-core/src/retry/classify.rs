//! Classify I/O failures for retry decisions.

use std::io;

use super::error::Transient;

/// Whether an I/O error is the kind a network blip produces.
pub fn is_transient_io(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::UnexpectedEof
    )
}

impl Transient for io::Error {
    fn is_transient(&self) -> bool {
        is_transient_io(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_kinds_are_transient() {
        for kind in [
            io::ErrorKind::TimedOut,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionRefused,
            io::ErrorKind::BrokenPipe,
        ] {
            assert!(io::Error::from(kind).is_transient(), "{kind:?}");
        }
    }

    #[test]
    fn permission_and_not_found_are_permanent() {
        assert!(!io::Error::from(io::ErrorKind::PermissionDenied).is_transient());
        assert!(!io::Error::from(io::ErrorKind::NotFound).is_transient());
        assert!(!io::Error::from(io::ErrorKind::InvalidData).is_transient());
    }
}
