//! Library-wide error and result types.

use std::fmt;
use std::io;

/// Result alias used throughout dragonfly.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
///
/// Error messages are kept intentionally terse; in particular [`Error::Auth`]
/// carries no detail about where verification failed.
#[derive(Debug)]
pub enum Error {
    /// The key-derivation graph could not be allocated.
    Alloc,
    /// The input is too small, the identifier does not match, or a header
    /// field failed a sanity check (message describes which one).
    BadFormat(&'static str),
    /// The authentication tag did not match: wrong password, corruption,
    /// or tampering.
    Auth,
    /// A caller-supplied parameter is impossible (message describes which
    /// one).
    BadParams(&'static str),
    /// An underlying I/O operation failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Alloc => write!(f, "key-derivation graph allocation failed"),
            Error::BadFormat(s) => write!(f, "bad container format: {s}"),
            Error::Auth => write!(f, "authentication failed"),
            Error::BadParams(s) => write!(f, "bad parameters: {s}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Error::Io(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
