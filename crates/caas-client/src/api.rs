//! The CaaS API surface consumed by the provider.
//!
//! The bearer token is an explicit argument of every call rather than ambient
//! client state: long operations fetch a new token per attempt and pass it
//! down, so nothing here can hold on to an expired one.

use async_trait::async_trait;
use caas_core::{
    Cluster, ClusterBlueprint, ClusterBlueprintId, ClusterId, CreateCluster,
    CreateClusterBlueprint, CreateMachineBlueprint, Kubeconfig, MachineBlueprint,
    MachineBlueprintId, UpdateCluster,
};

use crate::error::Result;

/// Trait for CaaS API communication.
///
/// This trait abstracts the HTTP client, allowing scripted implementations
/// in tests.
#[async_trait]
pub trait CaasApi: Send + Sync {
    /// List clusters matching `filter` (see [`crate::filter`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns a non-success status.
    async fn list_clusters(&self, token: &str, filter: &str) -> Result<Vec<Cluster>>;

    /// Get a single cluster, scoped by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; a missing cluster yields status 404.
    async fn get_cluster(&self, token: &str, id: &ClusterId, filter: &str) -> Result<Cluster>;

    /// Submit a cluster creation request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    async fn create_cluster(&self, token: &str, request: &CreateCluster) -> Result<Cluster>;

    /// Submit a machine-set and/or Kubernetes version change.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    async fn update_cluster(
        &self,
        token: &str,
        id: &ClusterId,
        request: &UpdateCluster,
    ) -> Result<Cluster>;

    /// Submit a cluster deletion request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    async fn delete_cluster(&self, token: &str, id: &ClusterId) -> Result<()>;

    /// Fetch the kubeconfig artifact of a cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn get_kubeconfig(&self, token: &str, id: &ClusterId) -> Result<Kubeconfig>;

    /// Create a machine blueprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    async fn create_machine_blueprint(
        &self,
        token: &str,
        request: &CreateMachineBlueprint,
    ) -> Result<MachineBlueprint>;

    /// Get a machine blueprint, scoped by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; a missing blueprint yields status 404.
    async fn get_machine_blueprint(
        &self,
        token: &str,
        id: &MachineBlueprintId,
        filter: &str,
    ) -> Result<MachineBlueprint>;

    /// Delete a machine blueprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    async fn delete_machine_blueprint(&self, token: &str, id: &MachineBlueprintId) -> Result<()>;

    /// Create a cluster blueprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    async fn create_cluster_blueprint(
        &self,
        token: &str,
        request: &CreateClusterBlueprint,
    ) -> Result<ClusterBlueprint>;

    /// Get a cluster blueprint, scoped by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; a missing blueprint yields status 404.
    async fn get_cluster_blueprint(
        &self,
        token: &str,
        id: &ClusterBlueprintId,
        filter: &str,
    ) -> Result<ClusterBlueprint>;

    /// Delete a cluster blueprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    async fn delete_cluster_blueprint(&self, token: &str, id: &ClusterBlueprintId) -> Result<()>;
}
