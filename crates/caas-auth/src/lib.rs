//! Token acquisition for the CaaS provider.
//!
//! This crate supplies the bearer tokens the CaaS API requires:
//!
//! - OAuth2 client-credentials exchange against the IAM token endpoint
//! - Expiry-aware caching, so a token is reused until shortly before it expires
//! - Expiry extraction from the JWT itself when the IAM response omits it
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Reconciler     │────▶│  TokenProvider   │
//! │   (poll loop)    │     │  (trait)         │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │ IamTokenProvider │
//!                          │ (token cache)    │
//!                          └────────┬─────────┘
//!                                   │ HTTPS
//!                          ┌────────▼─────────┐
//!                          │   IAM token      │
//!                          │   endpoint       │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use caas_auth::{AuthConfig, IamTokenProvider, TokenProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig {
//!     token_url: "https://client.greenlake.example.com/api/iam/identity/v1/token".to_string(),
//!     client_id: "my-client".to_string(),
//!     client_secret: "my-secret".to_string(),
//!     ..AuthConfig::default()
//! };
//!
//! let provider = IamTokenProvider::new(config)?;
//! let token = provider.get_token().await?;
//! println!("Bearer {token}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fmt;
use std::time::Duration;

pub mod client;
pub mod error;
pub mod jwt;
pub mod provider;

pub use client::{IamClient, IssuedToken};
pub use error::{AuthError, Result};
pub use jwt::token_expiry;
pub use provider::{IamTokenProvider, TokenProvider};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::StaticTokenProvider;

/// Configuration for token acquisition.
#[derive(Clone)]
pub struct AuthConfig {
    /// Full URL of the IAM token endpoint.
    pub token_url: String,
    /// API client ID.
    pub client_id: String,
    /// API client secret.
    pub client_secret: String,
    /// Fetch a new token once fewer than this many seconds of validity remain.
    pub refresh_margin_seconds: u64,
    /// Timeout for a single token request, in seconds.
    pub request_timeout_seconds: u64,
}

impl AuthConfig {
    /// Get the refresh margin as a `Duration`.
    #[must_use]
    pub const fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_seconds)
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_url: "https://client.greenlake.hpe.com/api/iam/identity/v1/token".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            refresh_margin_seconds: 60,
            request_timeout_seconds: 30,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_margin_seconds", &self.refresh_margin_seconds)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}
