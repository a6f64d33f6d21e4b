//! Transport-specific error types.

use std::io;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur while talking to the cube server.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    /// Request timed out waiting for response.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Server answered with a non-success status and no parsable error body.
    #[error("server returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Server returned an error row.
    #[error("server error: {message} (code: {code})")]
    Remote {
        /// Error code from the server.
        code: String,
        /// Error message from the server.
        message: String,
    },

    /// The response stream could not be read.
    #[error("failed to read response: {0}")]
    ReadFailed(#[source] io::Error),

    /// The response body was not valid semicolon CSV.
    #[error("malformed response: {0}")]
    Malformed(#[from] csv::Error),

    /// Request path is not served by this transport.
    #[error("unsupported request path: {0}")]
    UnsupportedPath(String),
}

impl TransportError {
    /// Create a remote error from an error row.
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retriable by the caller.
    ///
    /// Nothing in this crate retries on its own; the flag is advisory.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Status { status } => *status >= 500,
            _ => false,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::ReadFailed(err)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}
