//! Collaborators shared by every resource.

use std::fmt;
use std::sync::Arc;

use caas_auth::{IamTokenProvider, TokenProvider};
use caas_client::{CaasApi, HttpCaasClient};

use crate::cluster::ClusterResource;
use crate::cluster_blueprint::ClusterBlueprintResource;
use crate::config::{ProviderConfig, Timeouts};
use crate::error::Result;
use crate::machine_blueprint::MachineBlueprintResource;

/// API client, token source and timeouts used by the resources.
#[derive(Clone)]
pub struct ProviderContext {
    api: Arc<dyn CaasApi>,
    tokens: Arc<dyn TokenProvider>,
    timeouts: Timeouts,
}

impl ProviderContext {
    /// Create a context from explicit collaborators.
    #[must_use]
    pub fn new(api: Arc<dyn CaasApi>, tokens: Arc<dyn TokenProvider>, timeouts: Timeouts) -> Self {
        Self {
            api,
            tokens,
            timeouts,
        }
    }

    /// Create a context talking to the real CaaS and IAM endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an HTTP client
    /// cannot be built.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let api = HttpCaasClient::new(&config.client_config())?;
        let tokens = IamTokenProvider::new(config.auth_config())?;

        tracing::info!(api_url = %config.api_url, "CaaS provider configured");

        Ok(Self::new(
            Arc::new(api),
            Arc::new(tokens),
            config.timeouts.clone(),
        ))
    }

    /// The CaaS API client.
    #[must_use]
    pub fn api(&self) -> &dyn CaasApi {
        self.api.as_ref()
    }

    /// The token source.
    #[must_use]
    pub fn tokens(&self) -> &dyn TokenProvider {
        self.tokens.as_ref()
    }

    /// Operation timeouts and polling cadence.
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Fetch a bearer token for the next call.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Auth` if no token can be obtained.
    pub async fn token(&self) -> Result<String> {
        Ok(self.tokens.get_token().await?)
    }

    /// The cluster resource.
    #[must_use]
    pub fn clusters(&self) -> ClusterResource {
        ClusterResource::new(self.clone())
    }

    /// The machine blueprint resource.
    #[must_use]
    pub fn machine_blueprints(&self) -> MachineBlueprintResource {
        MachineBlueprintResource::new(self.clone())
    }

    /// The cluster blueprint resource.
    #[must_use]
    pub fn cluster_blueprints(&self) -> ClusterBlueprintResource {
        ClusterBlueprintResource::new(self.clone())
    }
}

impl fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContext")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
