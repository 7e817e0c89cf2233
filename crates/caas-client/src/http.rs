//! reqwest-based implementation of [`CaasApi`].

use async_trait::async_trait;
use caas_core::{
    Cluster, ClusterBlueprint, ClusterBlueprintId, ClusterId, ClusterList, CreateCluster,
    CreateClusterBlueprint, CreateMachineBlueprint, Kubeconfig, MachineBlueprint,
    MachineBlueprintId, UpdateCluster,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::CaasApi;
use crate::error::{ApiError, Result};
use crate::ClientConfig;

/// Error body returned by the CaaS API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

/// Extract a human-readable message from an error response body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return match parsed.error_code {
                Some(code) => format!("{message} ({code})"),
                None => message,
            };
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("CaaS API returned status {status}")
    } else {
        body.to_string()
    }
}

/// HTTP client for the CaaS API.
#[derive(Debug, Clone)]
pub struct HttpCaasClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCaasClient {
    /// Create a new CaaS client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client, &config.base_url))
    }

    /// Create a new CaaS client with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL of the CaaS API.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    /// Send a request and fail on non-success statuses.
    async fn dispatch(&self, operation: &'static str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(operation, &e))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(operation, status = status.as_u16(), "CaaS API call succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);

        tracing::warn!(
            operation,
            status = status.as_u16(),
            error = %message,
            "CaaS API call failed"
        );

        Err(ApiError::Status {
            operation,
            status: status.as_u16(),
            message,
        })
    }

    /// Send a request and decode the JSON response body.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        self.dispatch(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::from_reqwest(operation, &e))
    }
}

#[async_trait]
impl CaasApi for HttpCaasClient {
    async fn list_clusters(&self, token: &str, filter: &str) -> Result<Vec<Cluster>> {
        let request = self
            .client
            .get(self.url("clusters"))
            .bearer_auth(token)
            .query(&[("field", filter)]);

        let list: ClusterList = self.execute("ClustersGet", request).await?;
        Ok(list.items)
    }

    async fn get_cluster(&self, token: &str, id: &ClusterId, filter: &str) -> Result<Cluster> {
        let request = self
            .client
            .get(self.url(&format!("clusters/{id}")))
            .bearer_auth(token)
            .query(&[("field", filter)]);

        self.execute("ClustersIdGet", request).await
    }

    async fn create_cluster(&self, token: &str, request: &CreateCluster) -> Result<Cluster> {
        let request = self
            .client
            .post(self.url("clusters"))
            .bearer_auth(token)
            .json(request);

        self.execute("ClustersPost", request).await
    }

    async fn update_cluster(
        &self,
        token: &str,
        id: &ClusterId,
        request: &UpdateCluster,
    ) -> Result<Cluster> {
        let request = self
            .client
            .put(self.url(&format!("clusters/{id}")))
            .bearer_auth(token)
            .json(request);

        self.execute("ClustersIdPut", request).await
    }

    async fn delete_cluster(&self, token: &str, id: &ClusterId) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("clusters/{id}")))
            .bearer_auth(token);

        self.dispatch("ClustersIdDelete", request).await?;
        Ok(())
    }

    async fn get_kubeconfig(&self, token: &str, id: &ClusterId) -> Result<Kubeconfig> {
        let request = self
            .client
            .get(self.url(&format!("clusters/{id}/kubeconfig")))
            .bearer_auth(token);

        self.execute("ClustersIdKubeconfigGet", request).await
    }

    async fn create_machine_blueprint(
        &self,
        token: &str,
        request: &CreateMachineBlueprint,
    ) -> Result<MachineBlueprint> {
        let request = self
            .client
            .post(self.url("machineblueprints"))
            .bearer_auth(token)
            .json(request);

        self.execute("MachineBlueprintsPost", request).await
    }

    async fn get_machine_blueprint(
        &self,
        token: &str,
        id: &MachineBlueprintId,
        filter: &str,
    ) -> Result<MachineBlueprint> {
        let request = self
            .client
            .get(self.url(&format!("machineblueprints/{id}")))
            .bearer_auth(token)
            .query(&[("field", filter)]);

        self.execute("MachineBlueprintsIdGet", request).await
    }

    async fn delete_machine_blueprint(&self, token: &str, id: &MachineBlueprintId) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("machineblueprints/{id}")))
            .bearer_auth(token);

        self.dispatch("MachineBlueprintsIdDelete", request).await?;
        Ok(())
    }

    async fn create_cluster_blueprint(
        &self,
        token: &str,
        request: &CreateClusterBlueprint,
    ) -> Result<ClusterBlueprint> {
        let request = self
            .client
            .post(self.url("clusterblueprints"))
            .bearer_auth(token)
            .json(request);

        self.execute("ClusterBlueprintsPost", request).await
    }

    async fn get_cluster_blueprint(
        &self,
        token: &str,
        id: &ClusterBlueprintId,
        filter: &str,
    ) -> Result<ClusterBlueprint> {
        let request = self
            .client
            .get(self.url(&format!("clusterblueprints/{id}")))
            .bearer_auth(token)
            .query(&[("field", filter)]);

        self.execute("ClusterBlueprintsIdGet", request).await
    }

    async fn delete_cluster_blueprint(&self, token: &str, id: &ClusterBlueprintId) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("clusterblueprints/{id}")))
            .bearer_auth(token);

        self.dispatch("ClusterBlueprintsIdDelete", request).await?;
        Ok(())
    }
}
