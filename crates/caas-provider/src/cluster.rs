//! The cluster resource.
//!
//! Creating, updating and deleting a cluster are long-running backend
//! operations. Each one submits a request and then watches the cluster list
//! of its space with a [`ClusterWatcher`] until the cluster reaches the target
//! state of that operation. Every step of an operation, including the
//! follow-up update of a create and the final read, shares the deadline taken
//! when the operation starts.

use async_trait::async_trait;
use caas_auth::TokenProvider;
use caas_client::{filter, CaasApi};
use caas_core::{
    Cluster, ClusterBlueprintId, ClusterId, ClusterState, CreateCluster, MachineSet,
    MachineSetDetail, SiteId, SpaceId, UpdateCluster,
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::context::ProviderContext;
use crate::error::{ResourceError, Result};
use crate::merge::{self, MergeOrder};
use crate::poller::{wait_until, Poll, PollConf};
use crate::resource::Resource;
use crate::retry::RetryCounters;

const KIND: &str = "cluster";

/// Declared configuration of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Cluster name.
    pub name: String,
    /// Cluster blueprint to create the cluster from.
    pub blueprint_id: ClusterBlueprintId,
    /// Site hosting the cluster.
    pub site_id: SiteId,
    /// Owning space.
    pub space_id: SpaceId,
    /// Extra or replacement worker pools.
    #[serde(default)]
    pub worker_nodes: Vec<MachineSet>,
    /// Kubernetes version to upgrade to.
    #[serde(default)]
    pub kubernetes_version: Option<String>,
}

impl ClusterSpec {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ResourceError::InvalidConfig("cluster name must not be empty".to_string()));
        }
        if self.blueprint_id.is_empty() || self.site_id.is_empty() || self.space_id.is_empty() {
            return Err(ResourceError::InvalidConfig(format!(
                "cluster {} needs a blueprint, site and space",
                self.name
            )));
        }
        for (i, node) in self.worker_nodes.iter().enumerate() {
            if self.worker_nodes[..i].iter().any(|other| other.name == node.name) {
                return Err(ResourceError::InvalidConfig(format!(
                    "worker node name '{}' is declared more than once",
                    node.name
                )));
            }
        }
        Ok(())
    }

    fn requests_update(&self) -> bool {
        !self.worker_nodes.is_empty() || self.kubernetes_version.is_some()
    }
}

/// Persisted state of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterData {
    /// Backend identifier; set once the cluster is ready, cleared once deleted.
    pub id: Option<ClusterId>,
    /// Declared configuration.
    pub spec: ClusterSpec,
    /// Machine sets the backend created with the cluster.
    #[serde(default)]
    pub default_machine_sets: Vec<MachineSet>,
    /// Details of the default machine sets, including their roles.
    #[serde(default)]
    pub default_machine_sets_detail: Vec<MachineSetDetail>,
    /// The cluster as last read.
    #[serde(default)]
    pub cluster: Option<Cluster>,
    /// Kubeconfig as last read.
    #[serde(default)]
    pub kubeconfig: String,
}

impl ClusterData {
    /// State for a cluster that does not exist yet.
    #[must_use]
    pub fn new(spec: ClusterSpec) -> Self {
        Self {
            spec,
            ..Self::default()
        }
    }

    fn require_id(&self) -> Result<ClusterId> {
        self.id.clone().ok_or(ResourceError::MissingId(KIND))
    }
}

/// Watches one cluster through the list endpoint of its space.
///
/// A fresh token is fetched on every attempt. The retry counters live as long
/// as the watcher, i.e. one wait.
pub struct ClusterWatcher<'a> {
    api: &'a dyn CaasApi,
    tokens: &'a dyn TokenProvider,
    id: ClusterId,
    filter: String,
    expect_deleted: bool,
    counters: RetryCounters,
    last_seen: Option<Cluster>,
}

impl<'a> ClusterWatcher<'a> {
    /// Create a watcher for `id` in `space_id`, configured for `conf`.
    #[must_use]
    pub fn new(
        context: &'a ProviderContext,
        id: ClusterId,
        space_id: &SpaceId,
        conf: &PollConf,
    ) -> Self {
        Self {
            api: context.api(),
            tokens: context.tokens(),
            id,
            filter: filter::space_filter(space_id),
            expect_deleted: conf.expects_deletion(),
            counters: RetryCounters::new(conf.retry_limit),
            last_seen: None,
        }
    }

    /// The cluster as it was last found in the list.
    #[must_use]
    pub const fn last_seen(&self) -> Option<&Cluster> {
        self.last_seen.as_ref()
    }

    /// Consume the watcher, returning the cluster as it was last found.
    #[must_use]
    pub fn into_last_seen(self) -> Option<Cluster> {
        self.last_seen
    }
}

#[async_trait]
impl Poll for ClusterWatcher<'_> {
    fn cluster_id(&self) -> &ClusterId {
        &self.id
    }

    async fn poll(&mut self) -> Result<ClusterState> {
        let token = self.tokens.get_token().await?;

        let clusters = match self.api.list_clusters(&token, &self.filter).await {
            Ok(clusters) => clusters,
            Err(err) => return self.counters.on_error(err),
        };
        self.counters.on_success();

        match clusters.into_iter().find(|cluster| cluster.id == self.id) {
            Some(cluster) => {
                self.counters.on_found();
                let state = cluster.state.clone();
                self.last_seen = Some(cluster);
                Ok(state)
            }
            None => self.counters.on_missing(&self.id, self.expect_deleted),
        }
    }
}

/// Create, read, update and delete clusters.
#[derive(Debug, Clone)]
pub struct ClusterResource {
    context: ProviderContext,
}

impl ClusterResource {
    /// Create the resource.
    #[must_use]
    pub const fn new(context: ProviderContext) -> Self {
        Self { context }
    }

    /// Submit `request` and wait for the cluster to settle before `deadline`.
    async fn submit_update(
        &self,
        id: &ClusterId,
        space_id: &SpaceId,
        request: &UpdateCluster,
        conf: &PollConf,
        deadline: Instant,
    ) -> Result<()> {
        let token = conf.bounded(deadline, self.context.token()).await?;
        conf.bounded(deadline, async {
            self.context
                .api()
                .update_cluster(&token, id, request)
                .await
                .inspect_err(|err| {
                    tracing::error!(cluster_id = %id, error = %err, "Cluster update failed");
                })
        })
        .await?;

        tracing::info!(
            cluster_id = %id,
            machine_sets = request.machine_sets.len(),
            kubernetes_version = %request.kubernetes_version,
            "Cluster update submitted"
        );

        let mut watcher = ClusterWatcher::new(&self.context, id.clone(), space_id, conf);
        wait_until(&mut watcher, conf, deadline).await?;
        Ok(())
    }
}

#[async_trait]
impl Resource for ClusterResource {
    type State = ClusterData;

    fn kind(&self) -> &'static str {
        KIND
    }

    async fn create(&self, state: &mut ClusterData) -> Result<()> {
        state.spec.validate()?;
        let spec = state.spec.clone();
        let conf = PollConf::create(self.context.timeouts());
        let deadline = conf.deadline();

        let token = conf.bounded(deadline, self.context.token()).await?;
        let request = CreateCluster {
            name: spec.name.clone(),
            cluster_blueprint_id: spec.blueprint_id.clone(),
            appliance_id: spec.site_id.clone(),
            space_id: spec.space_id.clone(),
        };
        let created = conf
            .bounded(deadline, async {
                self.context
                    .api()
                    .create_cluster(&token, &request)
                    .await
                    .inspect_err(|err| {
                        tracing::error!(name = %spec.name, error = %err, "Cluster create failed");
                    })
            })
            .await?;

        let id = created.id.clone();
        tracing::info!(cluster_id = %id, name = %spec.name, "Cluster create submitted");

        let mut watcher = ClusterWatcher::new(&self.context, id.clone(), &spec.space_id, &conf);
        wait_until(&mut watcher, &conf, deadline).await?;

        state.id = Some(id.clone());
        let ready = watcher.into_last_seen().unwrap_or(created);
        state.default_machine_sets = ready.machine_sets;
        state.default_machine_sets_detail = ready.machine_sets_detail;
        tracing::info!(cluster_id = %id, "Cluster ready");

        if spec.requests_update() {
            let workers = merge::default_worker_names(&state.default_machine_sets_detail)?;
            let request = UpdateCluster {
                machine_sets: merge::merge_machine_sets(
                    &spec.worker_nodes,
                    &state.default_machine_sets,
                    &workers,
                    MergeOrder::DefaultsFirst,
                ),
                kubernetes_version: spec.kubernetes_version.clone().unwrap_or_default(),
            };
            let follow_up = PollConf::create_follow_up(self.context.timeouts());
            self.submit_update(&id, &spec.space_id, &request, &follow_up, deadline)
                .await?;
        }

        conf.bounded(deadline, self.read(state)).await
    }

    async fn read(&self, state: &mut ClusterData) -> Result<()> {
        let id = state.require_id()?;
        let token = self.context.token().await?;

        let cluster = self
            .context
            .api()
            .get_cluster(&token, &id, &filter::space_filter(&state.spec.space_id))
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    tracing::warn!(cluster_id = %id, "Cluster no longer exists");
                    ResourceError::NotFound {
                        kind: KIND,
                        id: id.to_string(),
                    }
                } else {
                    err.into()
                }
            })?;

        let kubeconfig = self.context.api().get_kubeconfig(&token, &id).await?;

        tracing::debug!(cluster_id = %id, state = %cluster.state, "Read cluster");
        state.cluster = Some(cluster);
        state.kubeconfig = kubeconfig.kubeconfig;
        Ok(())
    }

    async fn update(&self, state: &mut ClusterData, previous: &ClusterData) -> Result<()> {
        let id = state.require_id()?;
        state.spec.validate()?;
        let conf = PollConf::update(self.context.timeouts());
        let deadline = conf.deadline();

        let workers_changed = state.spec.worker_nodes != previous.spec.worker_nodes;
        if workers_changed || state.spec.kubernetes_version.is_some() {
            let workers = merge::default_worker_names(&state.default_machine_sets_detail)?;
            let observed = state
                .cluster
                .as_ref()
                .map(|cluster| cluster.machine_sets.as_slice())
                .unwrap_or_default();
            let defaults =
                merge::refresh_default_workers(&state.default_machine_sets, &workers, observed);

            let request = UpdateCluster {
                machine_sets: merge::merge_machine_sets(
                    &state.spec.worker_nodes,
                    &defaults,
                    &workers,
                    MergeOrder::DeclaredFirst,
                ),
                kubernetes_version: state.spec.kubernetes_version.clone().unwrap_or_default(),
            };
            self.submit_update(&id, &state.spec.space_id, &request, &conf, deadline)
                .await?;
        } else {
            tracing::debug!(cluster_id = %id, "No machine set or version change");
        }

        conf.bounded(deadline, self.read(state)).await
    }

    async fn delete(&self, state: &mut ClusterData) -> Result<()> {
        let id = state.require_id()?;
        let conf = PollConf::delete(self.context.timeouts());
        let deadline = conf.deadline();

        let token = conf.bounded(deadline, self.context.token()).await?;
        conf.bounded(deadline, async {
            self.context
                .api()
                .delete_cluster(&token, &id)
                .await
                .inspect_err(|err| {
                    tracing::error!(cluster_id = %id, error = %err, "Cluster delete failed");
                })
        })
        .await?;
        tracing::info!(cluster_id = %id, "Cluster delete submitted");

        let mut watcher = ClusterWatcher::new(&self.context, id.clone(), &state.spec.space_id, &conf);
        wait_until(&mut watcher, &conf, deadline).await?;

        state.id = None;
        tracing::info!(cluster_id = %id, "Cluster deleted");
        Ok(())
    }
}
