//! Token providers.
//!
//! Every call into the CaaS API asks a [`TokenProvider`] for a bearer token.
//! Long-running operations ask again on every poll attempt, so an
//! implementation must hand out a token that is valid *now*, not one that was
//! valid when the operation started.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::client::IamClient;
use crate::error::Result;
use crate::AuthConfig;

/// Source of bearer tokens for the CaaS API.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid token can be obtained.
    async fn get_token(&self) -> Result<String>;
}

/// Cached token with its expiry.
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Token provider backed by the IAM client-credentials grant.
///
/// Tokens are cached until `refresh_margin` before they expire. Tokens whose
/// expiry cannot be determined are never cached.
pub struct IamTokenProvider {
    client: IamClient,
    refresh_margin: Duration,
    cache: RwLock<Option<CachedToken>>,
}

impl IamTokenProvider {
    /// Create a new IAM token provider with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let refresh_margin = config.refresh_margin();
        Ok(Self::with_client(IamClient::new(config)?, refresh_margin))
    }

    /// Create a provider around an existing IAM client.
    #[must_use]
    pub fn with_client(client: IamClient, refresh_margin: Duration) -> Self {
        Self {
            client,
            refresh_margin,
            cache: RwLock::new(None),
        }
    }

    /// Drop the cached token so the next call fetches a new one.
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    fn cached_token(&self) -> Option<String> {
        let margin = chrono::Duration::from_std(self.refresh_margin).unwrap_or_default();
        let cache = self.cache.read();
        cache
            .as_ref()
            .filter(|token| token.expires_at - margin > Utc::now())
            .map(|token| token.access_token.clone())
    }
}

#[async_trait]
impl TokenProvider for IamTokenProvider {
    async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        tracing::debug!("Requesting new IAM token");
        let issued = self.client.request_token().await?;

        let mut cache = self.cache.write();
        *cache = issued.expires_at.map(|expires_at| {
            tracing::debug!(expires_at = %expires_at, "Cached IAM token");
            CachedToken {
                access_token: issued.access_token.clone(),
                expires_at,
            }
        });

        Ok(issued.access_token)
    }
}

/// A token provider that always returns the same token.
///
/// Counts how often it was asked, so tests can verify that long operations
/// re-acquire a token on every attempt.
#[cfg(any(test, feature = "test-utils"))]
pub struct StaticTokenProvider {
    token: String,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl StaticTokenProvider {
    /// Create a provider handing out `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of times `get_token` was called.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<String> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.token.clone())
    }
}
