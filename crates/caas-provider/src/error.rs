//! Error types for resource operations.
//!
//! Every failure surfaced to the host goes through [`ResourceError`]. Transient
//! errors absorbed by the poll loop never show up here; only the one that
//! exhausted the retry budget does.

use std::time::Duration;

use caas_client::ApiError;
use caas_core::{ClusterId, ClusterState};
use thiserror::Error;

/// A result type using `ResourceError`.
pub type Result<T> = std::result::Result<T, ResourceError>;

/// Errors that can occur while reconciling a resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The operation did not reach its target state before the deadline.
    #[error("{operation} did not complete within {}s", .timeout.as_secs())]
    Timeout {
        /// Operation that timed out, e.g. `cluster create`.
        operation: &'static str,
        /// The overall timeout that elapsed.
        timeout: Duration,
    },

    /// The backend reported a state that is neither pending nor a target.
    #[error("{operation}: cluster {cluster_id} entered unexpected state '{state}'")]
    UnexpectedState {
        /// Operation being polled.
        operation: &'static str,
        /// The cluster being polled.
        cluster_id: ClusterId,
        /// The observed state.
        state: ClusterState,
    },

    /// The cluster stayed absent from the list endpoint beyond the retry budget.
    #[error("cluster {cluster_id} not found after {attempts} attempts")]
    NotVisible {
        /// The cluster being polled.
        cluster_id: ClusterId,
        /// Consecutive attempts on which the cluster was absent.
        attempts: u32,
    },

    /// A transient API error repeated until the retry budget was exhausted.
    #[error("giving up after {attempts} transient errors: {source}")]
    RetryLimitExceeded {
        /// Consecutive transient errors observed.
        attempts: u32,
        /// The last error.
        #[source]
        source: ApiError,
    },

    /// The cluster's default machine sets contain no worker pool.
    #[error("worker node not present in the cluster")]
    NoWorkerMachineSet,

    /// The remote resource no longer exists.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Resource kind, e.g. `cluster`.
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The resource cannot be changed in place.
    #[error("{0} does not support update")]
    UpdateNotSupported(&'static str),

    /// The operation needs a persisted identifier but none is set.
    #[error("{0} has no identifier")]
    MissingId(&'static str),

    /// The declared configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A CaaS API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A bearer token could not be obtained.
    #[error("failed to get token: {0}")]
    Auth(#[from] caas_auth::AuthError),
}

impl ResourceError {
    /// Returns the HTTP status of the underlying API failure, if any.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::Api(err) | Self::RetryLimitExceeded { source: err, .. } => err.http_status(),
            _ => None,
        }
    }

    /// Returns true if the host should treat the resource as absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if re-running the operation might succeed.
    ///
    /// Timeouts leave the identifier in place so a later apply can pick the
    /// operation up again.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RetryLimitExceeded { .. } | Self::NotVisible { .. } => {
                true
            }
            Self::Auth(err) => err.is_retriable(),
            _ => false,
        }
    }
}
