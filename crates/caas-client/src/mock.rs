//! A scripted in-memory CaaS API for tests.
//!
//! List responses are replayed from a queue, so a test can describe exactly
//! what each poll attempt observes. Every other endpoint answers from simple
//! in-memory state. Calls are recorded by operation name, matching the names
//! [`crate::HttpCaasClient`] uses in its errors.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use caas_core::{
    Cluster, ClusterBlueprint, ClusterBlueprintId, ClusterId, ClusterState, CreateCluster,
    CreateClusterBlueprint, CreateMachineBlueprint, Kubeconfig, MachineBlueprint,
    MachineBlueprintId, UpdateCluster,
};
use parking_lot::Mutex;

use crate::api::CaasApi;
use crate::error::{ApiError, Result};

/// What one list call observes.
#[derive(Debug, Clone)]
pub enum ListStep {
    /// The call succeeds with these clusters.
    Clusters(Vec<Cluster>),
    /// The call fails with this HTTP status.
    Status(u16),
    /// The call times out without a response.
    Timeout,
    /// The connection fails without a response.
    Transport,
}

#[derive(Default)]
struct Script {
    list: VecDeque<ListStep>,
    create_response: Option<Cluster>,
    cluster: Option<Cluster>,
    kubeconfig: String,
    failures: HashMap<&'static str, u16>,
    machine_blueprints: HashMap<MachineBlueprintId, MachineBlueprint>,
    cluster_blueprints: HashMap<ClusterBlueprintId, ClusterBlueprint>,
    calls: Vec<&'static str>,
    tokens: Vec<String>,
    update_requests: Vec<UpdateCluster>,
    next_id: u32,
}

impl Script {
    fn record(&mut self, operation: &'static str, token: &str) -> Result<()> {
        self.calls.push(operation);
        self.tokens.push(token.to_string());
        match self.failures.remove(operation) {
            Some(status) => Err(status_error(operation, status)),
            None => Ok(()),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

fn status_error(operation: &'static str, status: u16) -> ApiError {
    ApiError::Status {
        operation,
        status,
        message: format!("scripted status {status}"),
    }
}

/// Build a cluster with the given identity and state and empty details.
#[must_use]
pub fn cluster(id: &str, state: ClusterState) -> Cluster {
    Cluster {
        id: ClusterId::new(id),
        name: "demo".to_string(),
        cluster_blueprint_id: ClusterBlueprintId::default(),
        appliance_id: caas_core::SiteId::default(),
        appliance_name: String::new(),
        space_id: caas_core::SpaceId::default(),
        state,
        health: String::new(),
        kubernetes_version: String::new(),
        cluster_provider: String::new(),
        default_storage_class: String::new(),
        default_storage_class_description: String::new(),
        machine_sets: Vec::new(),
        machine_sets_detail: Vec::new(),
        api_endpoint: String::new(),
        service_endpoints: Vec::new(),
        created_date: None,
        last_update_date: None,
    }
}

/// A CaaS API that replays scripted responses.
#[derive(Default)]
pub struct ScriptedCaasApi {
    script: Mutex<Script>,
}

impl ScriptedCaasApi {
    /// Create an API with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next list call.
    ///
    /// Once the queue is empty, list calls return no clusters.
    pub fn push_list(&self, step: ListStep) {
        self.script.lock().list.push_back(step);
    }

    /// Queue one list call per state, each returning `template` in that state.
    pub fn push_states(&self, template: &Cluster, states: &[ClusterState]) {
        let mut script = self.script.lock();
        for state in states {
            script.list.push_back(ListStep::Clusters(vec![Cluster {
                state: state.clone(),
                ..template.clone()
            }]));
        }
    }

    /// Set the response of `create_cluster`.
    pub fn set_create_response(&self, cluster: Cluster) {
        self.script.lock().create_response = Some(cluster);
    }

    /// Set the cluster returned by `get_cluster`; `None` answers 404.
    pub fn set_cluster(&self, cluster: Option<Cluster>) {
        self.script.lock().cluster = cluster;
    }

    /// Set the kubeconfig returned by `get_kubeconfig`.
    pub fn set_kubeconfig(&self, kubeconfig: impl Into<String>) {
        self.script.lock().kubeconfig = kubeconfig.into();
    }

    /// Make the next call of `operation` fail with `status`.
    pub fn fail_next(&self, operation: &'static str, status: u16) {
        self.script.lock().failures.insert(operation, status);
    }

    /// Operation names of all calls so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.script.lock().calls.clone()
    }

    /// Number of calls of `operation` so far.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.script
            .lock()
            .calls
            .iter()
            .filter(|call| **call == operation)
            .count()
    }

    /// Tokens presented by all calls so far, in order.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        self.script.lock().tokens.clone()
    }

    /// Bodies of all `update_cluster` calls so far.
    #[must_use]
    pub fn update_requests(&self) -> Vec<UpdateCluster> {
        self.script.lock().update_requests.clone()
    }

    /// List steps not consumed yet.
    #[must_use]
    pub fn remaining_list_steps(&self) -> usize {
        self.script.lock().list.len()
    }
}

#[async_trait]
impl CaasApi for ScriptedCaasApi {
    async fn list_clusters(&self, token: &str, _filter: &str) -> Result<Vec<Cluster>> {
        let operation = "ClustersGet";
        let mut script = self.script.lock();
        script.record(operation, token)?;

        match script.list.pop_front() {
            None => Ok(Vec::new()),
            Some(ListStep::Clusters(clusters)) => Ok(clusters),
            Some(ListStep::Status(status)) => Err(status_error(operation, status)),
            Some(ListStep::Timeout) => Err(ApiError::Timeout {
                operation,
                message: "operation timed out".to_string(),
            }),
            Some(ListStep::Transport) => Err(ApiError::Transport {
                operation,
                message: "connection refused".to_string(),
            }),
        }
    }

    async fn get_cluster(&self, token: &str, id: &ClusterId, _filter: &str) -> Result<Cluster> {
        let operation = "ClustersIdGet";
        let mut script = self.script.lock();
        script.record(operation, token)?;

        script
            .cluster
            .clone()
            .filter(|cluster| cluster.id == *id)
            .ok_or_else(|| status_error(operation, 404))
    }

    async fn create_cluster(&self, token: &str, request: &CreateCluster) -> Result<Cluster> {
        let mut script = self.script.lock();
        script.record("ClustersPost", token)?;

        if let Some(cluster) = script.create_response.clone() {
            return Ok(cluster);
        }
        let id = script.next_id("cluster");
        Ok(Cluster {
            name: request.name.clone(),
            cluster_blueprint_id: request.cluster_blueprint_id.clone(),
            appliance_id: request.appliance_id.clone(),
            space_id: request.space_id.clone(),
            ..cluster(&id, ClusterState::Initializing)
        })
    }

    async fn update_cluster(
        &self,
        token: &str,
        id: &ClusterId,
        request: &UpdateCluster,
    ) -> Result<Cluster> {
        let mut script = self.script.lock();
        script.record("ClustersIdPut", token)?;
        script.update_requests.push(request.clone());

        let current = script
            .cluster
            .clone()
            .unwrap_or_else(|| cluster(id.as_str(), ClusterState::Ready));
        Ok(Cluster {
            state: ClusterState::Updating,
            machine_sets: request.machine_sets.clone(),
            ..current
        })
    }

    async fn delete_cluster(&self, token: &str, _id: &ClusterId) -> Result<()> {
        self.script.lock().record("ClustersIdDelete", token)
    }

    async fn get_kubeconfig(&self, token: &str, _id: &ClusterId) -> Result<Kubeconfig> {
        let mut script = self.script.lock();
        script.record("ClustersIdKubeconfigGet", token)?;
        Ok(Kubeconfig {
            kubeconfig: script.kubeconfig.clone(),
        })
    }

    async fn create_machine_blueprint(
        &self,
        token: &str,
        request: &CreateMachineBlueprint,
    ) -> Result<MachineBlueprint> {
        let mut script = self.script.lock();
        script.record("MachineBlueprintsPost", token)?;

        let blueprint = MachineBlueprint {
            id: MachineBlueprintId::new(script.next_id("mbp")),
            name: request.name.clone(),
            appliance_id: request.appliance_id.clone(),
            machine_roles: request.machine_roles.clone(),
            machine_provider: request.machine_provider.clone(),
            os_image: request.os_image.clone(),
            os_version: request.os_version.clone(),
            compute_instance_type: request.compute_instance_type.clone(),
            size: request.size.clone(),
            storage_instance_type: request.storage_instance_type.clone(),
            ..MachineBlueprint::default()
        };
        script
            .machine_blueprints
            .insert(blueprint.id.clone(), blueprint.clone());
        Ok(blueprint)
    }

    async fn get_machine_blueprint(
        &self,
        token: &str,
        id: &MachineBlueprintId,
        _filter: &str,
    ) -> Result<MachineBlueprint> {
        let operation = "MachineBlueprintsIdGet";
        let mut script = self.script.lock();
        script.record(operation, token)?;
        script
            .machine_blueprints
            .get(id)
            .cloned()
            .ok_or_else(|| status_error(operation, 404))
    }

    async fn delete_machine_blueprint(&self, token: &str, id: &MachineBlueprintId) -> Result<()> {
        let operation = "MachineBlueprintsIdDelete";
        let mut script = self.script.lock();
        script.record(operation, token)?;
        script
            .machine_blueprints
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| status_error(operation, 404))
    }

    async fn create_cluster_blueprint(
        &self,
        token: &str,
        request: &CreateClusterBlueprint,
    ) -> Result<ClusterBlueprint> {
        let mut script = self.script.lock();
        script.record("ClusterBlueprintsPost", token)?;

        let blueprint = ClusterBlueprint {
            id: ClusterBlueprintId::new(script.next_id("cbp")),
            name: request.name.clone(),
            k8s_version: request.k8s_version.clone(),
            default_storage_class: request.default_storage_class.clone(),
            appliance_id: request.appliance_id.clone(),
            cluster_provider: request.cluster_provider.clone(),
            machine_sets: request.machine_sets.clone(),
            ..ClusterBlueprint::default()
        };
        script
            .cluster_blueprints
            .insert(blueprint.id.clone(), blueprint.clone());
        Ok(blueprint)
    }

    async fn get_cluster_blueprint(
        &self,
        token: &str,
        id: &ClusterBlueprintId,
        _filter: &str,
    ) -> Result<ClusterBlueprint> {
        let operation = "ClusterBlueprintsIdGet";
        let mut script = self.script.lock();
        script.record(operation, token)?;
        script
            .cluster_blueprints
            .get(id)
            .cloned()
            .ok_or_else(|| status_error(operation, 404))
    }

    async fn delete_cluster_blueprint(&self, token: &str, id: &ClusterBlueprintId) -> Result<()> {
        let operation = "ClusterBlueprintsIdDelete";
        let mut script = self.script.lock();
        script.record(operation, token)?;
        script
            .cluster_blueprints
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| status_error(operation, 404))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_replays_script_then_empties() {
        let api = ScriptedCaasApi::new();
        api.push_list(ListStep::Status(500));
        api.push_states(&cluster("c-1", ClusterState::Creating), &[ClusterState::Ready]);

        let err = api.list_clusters("t", "f").await.unwrap_err();
        assert_eq!(err.http_status(), Some(500));

        let clusters = api.list_clusters("t", "f").await.unwrap();
        assert_eq!(clusters[0].state, ClusterState::Ready);

        assert!(api.list_clusters("t", "f").await.unwrap().is_empty());
        assert_eq!(api.call_count("ClustersGet"), 3);
    }

    #[tokio::test]
    async fn fail_next_applies_once() {
        let api = ScriptedCaasApi::new();
        api.fail_next("ClustersIdDelete", 409);

        let id = ClusterId::new("c-1");
        assert!(api.delete_cluster("t", &id).await.is_err());
        assert!(api.delete_cluster("t", &id).await.is_ok());
    }
}
