//! Error types for CaaS API calls.
//!
//! Every error records the API operation that produced it, so messages
//! surfaced to the user read like `ClustersGet failed with status 500: ...`.

use thiserror::Error;

/// A result type using `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the CaaS API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status.
    #[error("{operation} failed with status {status}: {message}")]
    Status {
        /// API operation, e.g. `ClustersGet`.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The request did not complete within the client timeout.
    #[error("{operation} timed out: {message}")]
    Timeout {
        /// API operation.
        operation: &'static str,
        /// Underlying error text.
        message: String,
    },

    /// The request failed before an HTTP response was received.
    #[error("{operation} failed: {message}")]
    Transport {
        /// API operation.
        operation: &'static str,
        /// Underlying error text.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("{operation} returned an invalid response: {message}")]
    Decode {
        /// API operation.
        operation: &'static str,
        /// Underlying error text.
        message: String,
    },

    /// The client could not be constructed.
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Convert a reqwest error raised while performing `operation`.
    #[must_use]
    pub fn from_reqwest(operation: &'static str, err: &reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            Self::Timeout { operation, message }
        } else if err.is_decode() {
            Self::Decode { operation, message }
        } else if let Some(status) = err.status() {
            Self::Status {
                operation,
                status: status.as_u16(),
                message,
            }
        } else {
            Self::Transport { operation, message }
        }
    }

    /// The HTTP status code, when a response was received.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the request failed because it timed out at the network layer.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the API reported that the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// The API operation that failed, if known.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Status { operation, .. }
            | Self::Timeout { operation, .. }
            | Self::Transport { operation, .. }
            | Self::Decode { operation, .. } => Some(operation),
            Self::Config(_) => None,
        }
    }
}
