//! The cluster blueprint resource.

use async_trait::async_trait;
use caas_client::filter;
use caas_core::{ClusterBlueprint, ClusterBlueprintId, CreateClusterBlueprint, MachineSet, SiteId};
use serde::{Deserialize, Serialize};

use crate::context::ProviderContext;
use crate::error::{ResourceError, Result};
use crate::resource::Resource;

const KIND: &str = "cluster blueprint";

/// Declared configuration of a cluster blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterBlueprintSpec {
    /// Blueprint name.
    pub name: String,
    /// Kubernetes version of clusters built from the blueprint.
    pub k8s_version: String,
    /// Default storage class.
    pub default_storage_class: String,
    /// Site the blueprint belongs to.
    pub site_id: SiteId,
    /// Cluster provider, e.g. `ecp`.
    pub cluster_provider: String,
    /// Control plane pool.
    pub control_plane: MachineSet,
    /// Worker pools.
    pub worker_nodes: Vec<MachineSet>,
}

impl ClusterBlueprintSpec {
    /// Machine sets in the order the API expects: control plane first.
    #[must_use]
    pub fn machine_sets(&self) -> Vec<MachineSet> {
        std::iter::once(&self.control_plane)
            .chain(&self.worker_nodes)
            .cloned()
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.site_id.is_empty() {
            return Err(ResourceError::InvalidConfig(
                "cluster blueprint needs a name and a site".to_string(),
            ));
        }
        if self.worker_nodes.is_empty() {
            return Err(ResourceError::InvalidConfig(format!(
                "cluster blueprint {} needs at least one worker pool",
                self.name
            )));
        }

        let sets = self.machine_sets();
        for (i, set) in sets.iter().enumerate() {
            if sets[..i].iter().any(|other| other.name == set.name) {
                return Err(ResourceError::InvalidConfig(format!(
                    "machine set name '{}' is used more than once",
                    set.name
                )));
            }
        }
        Ok(())
    }
}

/// Persisted state of a cluster blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterBlueprintData {
    /// Backend identifier.
    pub id: Option<ClusterBlueprintId>,
    /// Declared configuration.
    pub spec: ClusterBlueprintSpec,
    /// The blueprint as last read.
    #[serde(default)]
    pub blueprint: Option<ClusterBlueprint>,
}

impl ClusterBlueprintData {
    /// State for a blueprint that does not exist yet.
    #[must_use]
    pub fn new(spec: ClusterBlueprintSpec) -> Self {
        Self {
            spec,
            ..Self::default()
        }
    }
}

/// Create, read and delete cluster blueprints.
#[derive(Debug, Clone)]
pub struct ClusterBlueprintResource {
    context: ProviderContext,
}

impl ClusterBlueprintResource {
    /// Create the resource.
    #[must_use]
    pub const fn new(context: ProviderContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Resource for ClusterBlueprintResource {
    type State = ClusterBlueprintData;

    fn kind(&self) -> &'static str {
        KIND
    }

    async fn create(&self, state: &mut ClusterBlueprintData) -> Result<()> {
        state.spec.validate()?;

        let spec = &state.spec;
        let request = CreateClusterBlueprint {
            name: spec.name.clone(),
            k8s_version: spec.k8s_version.clone(),
            default_storage_class: spec.default_storage_class.clone(),
            appliance_id: spec.site_id.clone(),
            cluster_provider: spec.cluster_provider.clone(),
            machine_sets: spec.machine_sets(),
        };

        let token = self.context.token().await?;
        let created = self
            .context
            .api()
            .create_cluster_blueprint(&token, &request)
            .await
            .inspect_err(|err| {
                tracing::error!(name = %request.name, error = %err, "Cluster blueprint create failed");
            })?;

        tracing::info!(blueprint_id = %created.id, name = %created.name, "Cluster blueprint created");
        state.id = Some(created.id);

        self.read(state).await
    }

    async fn read(&self, state: &mut ClusterBlueprintData) -> Result<()> {
        let id = state.id.clone().ok_or(ResourceError::MissingId(KIND))?;
        let token = self.context.token().await?;

        let blueprint = self
            .context
            .api()
            .get_cluster_blueprint(&token, &id, &filter::site_filter(&state.spec.site_id))
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    ResourceError::NotFound {
                        kind: KIND,
                        id: id.to_string(),
                    }
                } else {
                    err.into()
                }
            })?;

        state.blueprint = Some(blueprint);
        Ok(())
    }

    async fn delete(&self, state: &mut ClusterBlueprintData) -> Result<()> {
        let id = state.id.clone().ok_or(ResourceError::MissingId(KIND))?;
        let token = self.context.token().await?;

        self.context
            .api()
            .delete_cluster_blueprint(&token, &id)
            .await
            .inspect_err(|err| {
                tracing::error!(blueprint_id = %id, error = %err, "Cluster blueprint delete failed");
            })?;

        tracing::info!(blueprint_id = %id, "Cluster blueprint deleted");
        state.id = None;
        Ok(())
    }
}
