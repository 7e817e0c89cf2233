//! Cluster lifecycle states.
//!
//! The backend reports a cluster's progress as a bare string. [`ClusterState`]
//! turns that into a closed enumeration with an explicit [`ClusterState::Unknown`]
//! variant, so a state introduced by the backend later cannot silently match a
//! membership check.
//!
//! ```text
//!  initializing ─▶ infra-provisioning ─▶ creating ─▶ ready ◀─┐
//!                                                   │        │
//!                        updating / upgrading / ◀───┘        │
//!                        infra-deprovisioning ───────────────┘
//!
//!  ready ─▶ deleting ─▶ deleted
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterState {
    /// The request was accepted and is being validated.
    Initializing,
    /// Infrastructure (machines, networks) is being provisioned.
    InfraProvisioning,
    /// Infrastructure is being torn down, e.g. when scaling in.
    InfraDeprovisioning,
    /// Kubernetes is being installed on the provisioned machines.
    Creating,
    /// The cluster is being deleted.
    Deleting,
    /// The cluster is up and accepting workloads.
    Ready,
    /// The cluster no longer exists.
    Deleted,
    /// Machine sets are being changed.
    Updating,
    /// Kubernetes or the OS image is being upgraded.
    Upgrading,
    /// Provider-local marker: a transient error was absorbed and the poll
    /// should simply be repeated. Never reported by the backend.
    Retrying,
    /// A state string this provider does not know about.
    Unknown(String),
}

impl ClusterState {
    /// Return the wire representation of this state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Initializing => "initializing",
            Self::InfraProvisioning => "infra-provisioning",
            Self::InfraDeprovisioning => "infra-deprovisioning",
            Self::Creating => "creating",
            Self::Deleting => "deleting",
            Self::Ready => "ready",
            Self::Deleted => "deleted",
            Self::Updating => "updating",
            Self::Upgrading => "upgrading",
            Self::Retrying => "retrying",
            Self::Unknown(raw) => raw,
        }
    }

    /// Returns true for the provider-local `Retrying` marker.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        matches!(self, Self::Retrying)
    }

    /// Returns true if the backend reported a state outside the enumeration.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl From<&str> for ClusterState {
    // "retrying" is deliberately not parsed into `Retrying`: only the poller
    // may produce that marker.
    fn from(value: &str) -> Self {
        match value {
            "initializing" => Self::Initializing,
            "infra-provisioning" => Self::InfraProvisioning,
            "infra-deprovisioning" => Self::InfraDeprovisioning,
            "creating" => Self::Creating,
            "deleting" => Self::Deleting,
            "ready" => Self::Ready,
            "deleted" => Self::Deleted,
            "updating" => Self::Updating,
            "upgrading" => Self::Upgrading,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ClusterState {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ClusterState> for String {
    fn from(state: ClusterState) -> Self {
        match state {
            ClusterState::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
