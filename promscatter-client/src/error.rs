//! Error types for the transport and the query client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by a [`Transport`](crate::Transport) round trip or while
/// reading a response body.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// Reading or closing the response body failed.
    #[error("Response body error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

/// Errors that can occur when running a query against the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The backend address could not be parsed.
    #[error("Invalid backend address {address:?}: {reason}")]
    Address { address: String, reason: String },

    /// The backend answered with `status: "error"`.
    #[error("Backend error ({error_type}): {message}")]
    Api { error_type: String, message: String },

    /// Non-success HTTP status without a decodable error body.
    #[error("Backend returned status {0}")]
    Status(StatusCode),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Response parsed but is missing required parts.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The backend returned a result shape this client cannot represent.
    #[error("Unsupported result type {0:?}")]
    UnsupportedResult(String),
}

impl ClientError {
    /// True if the error originates from a cancelled request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Transport(TransportError::Cancelled))
    }
}
