//! Client for the CaaS cluster management API.
//!
//! This crate provides the [`CaasApi`] trait the provider programs against and
//! [`HttpCaasClient`], its reqwest implementation. Errors carry the failing
//! operation, the HTTP status when one was received, and whether the request
//! timed out, which is what the reconciler's retry classification needs.
//!
//! # Usage
//!
//! ```no_run
//! use caas_client::{filter, CaasApi, ClientConfig, HttpCaasClient};
//! use caas_core::SpaceId;
//!
//! # async fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpCaasClient::new(&ClientConfig {
//!     base_url: "https://mcaas.us1.greenlake-hpe.com/mcaas".to_string(),
//!     ..ClientConfig::default()
//! })?;
//!
//! let space = SpaceId::parse("8d5dfbc0-f996-4a4a-a1c4-b7e0a5f3c2a1")?;
//! for cluster in client.list_clusters(token, &filter::space_filter(&space)).await? {
//!     println!("{} is {}", cluster.name, cluster.state);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::time::Duration;

pub mod api;
pub mod error;
pub mod filter;
pub mod http;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use api::CaasApi;
pub use error::{ApiError, Result};
pub use http::HttpCaasClient;

/// Configuration for the CaaS API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the CaaS API, without the `/v1` suffix.
    pub base_url: String,
    /// Timeout for a whole request, in seconds.
    pub request_timeout_seconds: u64,
    /// Timeout for establishing a connection, in seconds.
    pub connect_timeout_seconds: u64,
}

impl ClientConfig {
    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mcaas.us1.greenlake-hpe.com/mcaas".to_string(),
            request_timeout_seconds: 30,
            connect_timeout_seconds: 5,
        }
    }
}
