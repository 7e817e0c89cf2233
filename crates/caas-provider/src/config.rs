//! Provider configuration.
//!
//! [`ProviderConfig`] is the single configuration surface of the provider. The
//! auth and client crates get their own config structs derived from it.

use std::time::Duration;

use caas_auth::AuthConfig;
use caas_client::ClientConfig;
use serde::Deserialize;

use crate::error::{ResourceError, Result};

/// Longest accepted operation timeout: one week.
pub const MAX_OPERATION_MINUTES: u64 = 7 * 24 * 60;

/// Longest accepted poll interval: one hour.
pub const MAX_POLL_INTERVAL_SECONDS: u64 = 3600;

/// Configuration for the CaaS provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the CaaS API.
    #[serde(default = "ProviderConfig::default_api_url")]
    pub api_url: String,

    /// IAM token endpoint.
    #[serde(default = "ProviderConfig::default_iam_token_url")]
    pub iam_token_url: String,

    /// API client ID.
    #[serde(default)]
    pub client_id: String,

    /// API client secret.
    #[serde(default)]
    pub client_secret: String,

    /// Timeout for a single HTTP request, in seconds.
    #[serde(default = "ProviderConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Operation timeouts and polling cadence.
    #[serde(default)]
    pub timeouts: Timeouts,
}

impl ProviderConfig {
    fn default_api_url() -> String {
        ClientConfig::default().base_url
    }

    fn default_iam_token_url() -> String {
        AuthConfig::default().token_url
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Load configuration from `CAAS_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidConfig` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("CAAS_API_URL") {
            config.api_url = url;
        }
        if let Some(url) = lookup("CAAS_IAM_TOKEN_URL") {
            config.iam_token_url = url;
        }
        if let Some(id) = lookup("CAAS_CLIENT_ID") {
            config.client_id = id;
        }
        if let Some(secret) = lookup("CAAS_CLIENT_SECRET") {
            config.client_secret = secret;
        }
        if let Some(interval) = lookup("CAAS_POLL_INTERVAL_SECONDS") {
            config.timeouts.poll_interval_seconds = interval.trim().parse().map_err(|_| {
                ResourceError::InvalidConfig(format!(
                    "CAAS_POLL_INTERVAL_SECONDS must be a number of seconds, got '{interval}'"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive a reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(ResourceError::InvalidConfig("api_url must not be empty".to_string()));
        }
        if self.timeouts.poll_interval_seconds == 0 {
            return Err(ResourceError::InvalidConfig(
                "poll interval must be at least one second".to_string(),
            ));
        }
        if self.timeouts.poll_interval_seconds > MAX_POLL_INTERVAL_SECONDS {
            return Err(ResourceError::InvalidConfig(format!(
                "poll interval must be at most {MAX_POLL_INTERVAL_SECONDS} seconds"
            )));
        }
        if self.timeouts.retry_limit == 0 {
            return Err(ResourceError::InvalidConfig(
                "retry limit must be at least 1".to_string(),
            ));
        }
        for (operation, minutes) in [
            ("create", self.timeouts.create_minutes),
            ("update", self.timeouts.update_minutes),
            ("delete", self.timeouts.delete_minutes),
        ] {
            if minutes == 0 || minutes > MAX_OPERATION_MINUTES {
                return Err(ResourceError::InvalidConfig(format!(
                    "{operation} timeout must be between 1 and {MAX_OPERATION_MINUTES} minutes, got {minutes}"
                )));
            }
        }
        Ok(())
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Configuration for the IAM token provider.
    #[must_use]
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            token_url: self.iam_token_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            request_timeout_seconds: self.request_timeout_seconds,
            ..AuthConfig::default()
        }
    }

    /// Configuration for the CaaS API client.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            request_timeout_seconds: self.request_timeout_seconds,
            ..ClientConfig::default()
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: Self::default_api_url(),
            iam_token_url: Self::default_iam_token_url(),
            client_id: String::new(),
            client_secret: String::new(),
            request_timeout_seconds: Self::default_request_timeout(),
            timeouts: Timeouts::default(),
        }
    }
}

/// Operation timeouts and polling cadence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Timeouts {
    /// Overall timeout for cluster creation, in minutes.
    #[serde(default = "Timeouts::default_operation_minutes")]
    pub create_minutes: u64,

    /// Overall timeout for a cluster update, in minutes.
    #[serde(default = "Timeouts::default_operation_minutes")]
    pub update_minutes: u64,

    /// Overall timeout for cluster deletion, in minutes.
    #[serde(default = "Timeouts::default_operation_minutes")]
    pub delete_minutes: u64,

    /// Seconds between two poll attempts.
    #[serde(default = "Timeouts::default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Transient failures tolerated before an operation fails.
    #[serde(default = "Timeouts::default_retry_limit")]
    pub retry_limit: u32,
}

impl Timeouts {
    const fn default_operation_minutes() -> u64 {
        60
    }

    const fn default_poll_interval() -> u64 {
        10
    }

    const fn default_retry_limit() -> u32 {
        3
    }

    /// Get the create timeout as a `Duration`.
    #[must_use]
    pub const fn create(&self) -> Duration {
        Duration::from_secs(self.create_minutes.saturating_mul(60))
    }

    /// Get the update timeout as a `Duration`.
    #[must_use]
    pub const fn update(&self) -> Duration {
        Duration::from_secs(self.update_minutes.saturating_mul(60))
    }

    /// Get the delete timeout as a `Duration`.
    #[must_use]
    pub const fn delete(&self) -> Duration {
        Duration::from_secs(self.delete_minutes.saturating_mul(60))
    }

    /// Get the poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create_minutes: Self::default_operation_minutes(),
            update_minutes: Self::default_operation_minutes(),
            delete_minutes: Self::default_operation_minutes(),
            poll_interval_seconds: Self::default_poll_interval(),
            retry_limit: Self::default_retry_limit(),
        }
    }
}
