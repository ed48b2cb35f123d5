//! Core error types.

use std::fmt;

use http::StatusCode;

/// Fatal errors raised while resolving request parameters.
///
/// Malformed input never ends up here: it is recorded as a
/// [`Degradation`](crate::params::Degradation) and parsing continues.
#[derive(Debug)]
pub enum Error {
    /// Request body is larger than the configured ceiling.
    SizeExceeded { limit: u64 },

    /// Reading the request body failed.
    Transport(std::io::Error),

    /// Reading the request body did not finish within the read deadline.
    Timeout { duration_ms: u64 },

    /// Writing an uploaded file to the spool directory failed.
    Spool(std::io::Error),
}

impl Error {
    /// Status code a host should answer with when aggregation fails.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::SizeExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Transport(_) => StatusCode::BAD_REQUEST,
            Error::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Error::Spool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure came from the client connection.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SizeExceeded { limit } => {
                write!(f, "request body exceeds limit of {} bytes", limit)
            }
            Error::Transport(e) => write!(f, "failed to read request body: {}", e),
            Error::Timeout { duration_ms } => {
                write!(f, "request body read timeout after {}ms", duration_ms)
            }
            Error::Spool(e) => write!(f, "failed to spool upload: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(e) | Error::Spool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e)
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
