use std::fmt::{self, Debug, Display};
use std::io;

pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Returned from `main` so that fatal startup errors print their message rather than their debug form.
pub struct DisplayError(Error);

impl Debug for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<T: Into<Error>> From<T> for DisplayError {
    fn from(display: T) -> Self {
        DisplayError(display.into())
    }
}

pub trait IoErrorExt {
    fn applies_to(&self) -> AppliesTo;
}

impl IoErrorExt for io::Error {
    fn applies_to(&self) -> AppliesTo {
        match self.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted => AppliesTo::Connection,
            _ => AppliesTo::Listener,
        }
    }
}

/// Whether an accept error is fatal to the listener or only lost one connection.
pub enum AppliesTo {
    Connection,
    Listener,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_error_scope() {
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(matches!(reset.applies_to(), AppliesTo::Connection));
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(denied.applies_to(), AppliesTo::Listener));
    }

    #[test]
    fn display_error_debug_is_message() {
        let err = DisplayError::from("bind failed");
        assert_eq!(format!("{:?}", err), "bind failed");
    }
}
