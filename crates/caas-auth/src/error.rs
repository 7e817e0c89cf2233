//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while acquiring a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The IAM service rejected the client credentials.
    #[error("invalid client credentials: {0}")]
    InvalidCredentials(String),

    /// Too many token requests, rate limited.
    #[error("rate limited")]
    RateLimited,

    /// The IAM service answered with an unexpected status.
    #[error("token request failed with status {status}: {message}")]
    TokenRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The token request did not complete in time.
    #[error("token request timed out")]
    Timeout,

    /// The token request failed below the HTTP layer.
    #[error("token request failed: {0}")]
    Transport(String),

    /// The token response could not be decoded.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// The issued token is not a decodable JWT.
    #[error("invalid token format: {0}")]
    InvalidToken(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns `true` if requesting a token again may succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::RateLimited | Self::Timeout | Self::Transport(_) => true,
            Self::TokenRequestFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns the HTTP status code associated with this error, if any.
    #[must_use]
    pub const fn http_status_code(&self) -> Option<u16> {
        match self {
            Self::InvalidCredentials(_) => Some(401),
            Self::RateLimited => Some(429),
            Self::TokenRequestFailed { status, .. } => Some(*status),
            Self::Timeout
            | Self::Transport(_)
            | Self::InvalidResponse(_)
            | Self::InvalidToken(_)
            | Self::Internal(_) => None,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
