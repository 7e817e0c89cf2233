//! Core types for the CaaS provider.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - **Identifiers**: Strongly-typed IDs for clusters, blueprints, sites and spaces
//! - **Cluster state**: The lifecycle enumeration the reconciler polls on
//! - **Wire types**: Request and response bodies of the CaaS API
//! - **Error types**: Common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use caas_core::{ClusterState, SpaceId};
//!
//! let space_id = SpaceId::parse("8d5dfbc0-f996-4a4a-a1c4-b7e0a5f3c2a1").unwrap();
//! assert_eq!(space_id.as_str(), "8d5dfbc0-f996-4a4a-a1c4-b7e0a5f3c2a1");
//!
//! let state = ClusterState::from("infra-provisioning");
//! assert_eq!(state, ClusterState::InfraProvisioning);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod state;
pub mod types;

pub use error::{CoreError, Result};
pub use ids::{ClusterBlueprintId, ClusterId, IdError, MachineBlueprintId, SiteId, SpaceId};
pub use state::ClusterState;
pub use types::{
    Cluster, ClusterBlueprint, ClusterList, CreateCluster, CreateClusterBlueprint,
    CreateMachineBlueprint, Kubeconfig, MachineBlueprint, MachineSet, MachineSetDetail,
    ServiceEndpoint, SizeDetail, UpdateCluster, CONTROL_PLANE_ROLE, WORKER_ROLE,
};
