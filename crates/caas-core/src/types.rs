//! Wire types exchanged with the CaaS API.
//!
//! Only the fields the provider reads or writes are modelled; unknown fields
//! in responses are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ClusterBlueprintId, ClusterId, MachineBlueprintId, SiteId, SpaceId};
use crate::state::ClusterState;

/// Machine role that marks a machine set as a worker pool.
pub const WORKER_ROLE: &str = "worker";

/// Machine role that marks a machine set as the control plane.
pub const CONTROL_PLANE_ROLE: &str = "controlplane";

/// A cluster as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Backend-assigned identifier.
    pub id: ClusterId,
    /// Cluster name.
    pub name: String,
    /// Blueprint the cluster was created from.
    #[serde(default)]
    pub cluster_blueprint_id: ClusterBlueprintId,
    /// Site (appliance) hosting the cluster.
    #[serde(rename = "applianceID", default)]
    pub appliance_id: SiteId,
    /// Human-readable site name.
    #[serde(default)]
    pub appliance_name: String,
    /// Owning space.
    #[serde(rename = "spaceID", default)]
    pub space_id: SpaceId,
    /// Current lifecycle state.
    pub state: ClusterState,
    /// Health summary reported by the backend.
    #[serde(default)]
    pub health: String,
    /// Kubernetes version currently running.
    #[serde(default)]
    pub kubernetes_version: String,
    /// Cluster provider, e.g. `ecp`.
    #[serde(default)]
    pub cluster_provider: String,
    /// Storage class applied to volumes that name none.
    #[serde(default)]
    pub default_storage_class: String,
    /// Description of the default storage class.
    #[serde(default)]
    pub default_storage_class_description: String,
    /// Node pools of the cluster.
    #[serde(default)]
    pub machine_sets: Vec<MachineSet>,
    /// Descriptive counterpart of `machine_sets`, including roles.
    #[serde(default)]
    pub machine_sets_detail: Vec<MachineSetDetail>,
    /// Kubernetes API server endpoint.
    #[serde(default)]
    pub api_endpoint: String,
    /// Services exposed by the cluster.
    #[serde(default)]
    pub service_endpoints: Vec<ServiceEndpoint>,
    /// When the cluster was created.
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    /// When the cluster last changed.
    #[serde(default)]
    pub last_update_date: Option<DateTime<Utc>>,
}

/// A named, sized pool of machines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSet {
    /// Pool name, unique within a cluster.
    pub name: String,
    /// Machine blueprint used for every machine in the pool.
    pub machine_blueprint_id: MachineBlueprintId,
    /// Desired machine count.
    pub count: u32,
    /// Optional OS image override.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_image: String,
    /// Optional OS version override.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_version: String,
}

/// Read-only description of a machine set, including its roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSetDetail {
    /// Name of the machine set this detail belongs to.
    pub name: String,
    /// OS image the machines run.
    #[serde(default)]
    pub os_image: String,
    /// OS version the machines run.
    #[serde(default)]
    pub os_version: String,
    /// Current machine count.
    #[serde(default)]
    pub count: u32,
    /// Roles of the machines in this set, e.g. `worker` or `controlplane`.
    #[serde(default)]
    pub machine_roles: Vec<String>,
    /// Provider of the machines, e.g. `vmaas`.
    #[serde(default)]
    pub machine_provider: Option<String>,
    /// Blueprint size, e.g. `xlarge`.
    #[serde(default)]
    pub size: String,
    /// Compute instance type.
    #[serde(default)]
    pub compute_instance_type: String,
    /// Storage instance type.
    #[serde(default)]
    pub storage_instance_type: String,
}

impl MachineSetDetail {
    /// Returns true if any machine role equals `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.machine_roles.iter().any(|r| r == role)
    }

    /// Returns true if this set is a worker pool.
    #[must_use]
    pub fn is_worker(&self) -> bool {
        self.has_role(WORKER_ROLE)
    }
}

/// A service exposed by the cluster (dashboards, ingress, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    /// Service name.
    pub name: String,
    /// URL of the service.
    #[serde(default)]
    pub endpoint: String,
    /// Endpoint type as reported by the backend.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Kubernetes namespace of the service.
    #[serde(default)]
    pub namespace: String,
}

/// Response of the cluster list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterList {
    /// Clusters matching the list filter.
    #[serde(default)]
    pub items: Vec<Cluster>,
}

/// Request body for creating a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCluster {
    /// Cluster name.
    pub name: String,
    /// Blueprint to create the cluster from.
    pub cluster_blueprint_id: ClusterBlueprintId,
    /// Site hosting the cluster.
    #[serde(rename = "applianceID")]
    pub appliance_id: SiteId,
    /// Owning space.
    #[serde(rename = "spaceID")]
    pub space_id: SpaceId,
}

/// Request body for updating a cluster's machine sets and/or Kubernetes version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCluster {
    /// The complete set of machine sets the cluster should have.
    pub machine_sets: Vec<MachineSet>,
    /// Target Kubernetes version; empty leaves the version unchanged.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kubernetes_version: String,
}

/// Kubeconfig artifact of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kubeconfig {
    /// Kubeconfig document, YAML.
    pub kubeconfig: String,
}

/// Sizing detail of a machine blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeDetail {
    /// Size name.
    #[serde(default)]
    pub name: String,
    /// Virtual CPU count.
    #[serde(default)]
    pub cpu: u32,
    /// Memory in GiB.
    #[serde(default)]
    pub memory: u32,
    /// Root disk size in GiB.
    #[serde(default)]
    pub root_disk: u32,
}

/// A machine blueprint as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineBlueprint {
    /// Backend-assigned identifier.
    #[serde(default)]
    pub id: MachineBlueprintId,
    /// Blueprint name.
    pub name: String,
    /// Site the blueprint belongs to.
    #[serde(rename = "applianceID", default)]
    pub appliance_id: SiteId,
    /// Roles machines built from it take.
    #[serde(default)]
    pub machine_roles: Vec<String>,
    /// Machine provider, e.g. `vmaas`.
    #[serde(default)]
    pub machine_provider: String,
    /// OS image.
    #[serde(default)]
    pub os_image: String,
    /// OS version.
    #[serde(default)]
    pub os_version: String,
    /// Compute instance type.
    #[serde(default)]
    pub compute_instance_type: String,
    /// Size name.
    #[serde(default)]
    pub size: String,
    /// Resources behind `size`.
    #[serde(default)]
    pub size_detail: Option<SizeDetail>,
    /// Storage instance type.
    #[serde(default)]
    pub storage_instance_type: String,
    /// When the blueprint was created.
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    /// When the blueprint last changed.
    #[serde(default)]
    pub last_update_date: Option<DateTime<Utc>>,
}

/// Request body for creating a machine blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMachineBlueprint {
    /// Blueprint name.
    pub name: String,
    /// Site the blueprint belongs to.
    #[serde(rename = "applianceID")]
    pub appliance_id: SiteId,
    /// Roles machines built from it take.
    pub machine_roles: Vec<String>,
    /// Machine provider.
    pub machine_provider: String,
    /// OS image.
    pub os_image: String,
    /// OS version.
    pub os_version: String,
    /// Compute instance type.
    pub compute_instance_type: String,
    /// Size name.
    pub size: String,
    /// Storage instance type.
    pub storage_instance_type: String,
}

/// A cluster blueprint as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBlueprint {
    /// Backend-assigned identifier.
    #[serde(default)]
    pub id: ClusterBlueprintId,
    /// Blueprint name.
    pub name: String,
    /// Kubernetes version of clusters created from it.
    #[serde(default)]
    pub k8s_version: String,
    /// Default storage class of those clusters.
    #[serde(default)]
    pub default_storage_class: String,
    /// Site the blueprint belongs to.
    #[serde(rename = "applianceID", default)]
    pub appliance_id: SiteId,
    /// Cluster provider, e.g. `ecp`.
    #[serde(default)]
    pub cluster_provider: String,
    /// Control plane and worker pools.
    #[serde(default)]
    pub machine_sets: Vec<MachineSet>,
    /// When the blueprint was created.
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    /// When the blueprint last changed.
    #[serde(default)]
    pub last_update_date: Option<DateTime<Utc>>,
}

/// Request body for creating a cluster blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterBlueprint {
    /// Blueprint name.
    pub name: String,
    /// Kubernetes version.
    pub k8s_version: String,
    /// Default storage class.
    pub default_storage_class: String,
    /// Site the blueprint belongs to.
    #[serde(rename = "applianceID")]
    pub appliance_id: SiteId,
    /// Cluster provider.
    pub cluster_provider: String,
    /// Control plane pool first, then worker pools.
    pub machine_sets: Vec<MachineSet>,
}
