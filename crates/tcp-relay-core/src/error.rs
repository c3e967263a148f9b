//! Error types for tcp-relay.

use std::io;

use thiserror::Error;

/// Result type alias for tcp-relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Exit status for usage errors and help requests.
pub const EXIT_USAGE: u8 = 1;

/// Exit status for every fatal runtime failure.
pub const EXIT_FATAL: u8 = 255;

/// Error types that can occur while relaying.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or missing command line arguments.
    #[error("{0}")]
    Usage(String),

    /// Address text that cannot be turned into an IPv4 endpoint.
    #[error("invalid address: {0}")]
    Address(String),

    /// Failure while creating, configuring or connecting a socket.
    #[error("{op}: {cause}")]
    Socket { op: &'static str, cause: io::Error },

    /// Failure while moving bytes mid-stream.
    #[error("{op}: {cause}")]
    Transfer { op: &'static str, cause: io::Error },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn socket(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |cause| Error::Socket { op, cause }
    }

    pub(crate) fn transfer(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |cause| Error::Transfer { op, cause }
    }

    /// Process exit status this error should terminate with.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Usage(_) => EXIT_USAGE,
            _ => EXIT_FATAL,
        }
    }
}
