//! Classification of failed and empty poll attempts.
//!
//! The CaaS API answers 500 for conditions that are really upstream
//! rate-limit or IAM-timeout problems, and a freshly created cluster can take
//! a few attempts to show up in the list endpoint. [`RetryCounters`] absorbs
//! both, up to a small budget, by answering [`ClusterState::Retrying`] instead
//! of failing.
//!
//! The counters belong to a single poll loop and are never shared.

use caas_client::ApiError;
use caas_core::{ClusterId, ClusterState};

use crate::error::{ResourceError, Result};

/// Returns true if `err` is worth another attempt.
///
/// That is a 500 or 504 response, or a network timeout with no response at
/// all. Every other failure is fatal.
#[must_use]
pub const fn is_transient(err: &ApiError) -> bool {
    match err.http_status() {
        Some(status) => status == 500 || status == 504,
        None => err.is_timeout(),
    }
}

/// Per-operation retry bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryCounters {
    limit: u32,
    errors: u32,
    not_visible: u32,
}

impl RetryCounters {
    /// Create counters that tolerate `limit` consecutive failures of each kind.
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self {
            limit,
            errors: 0,
            not_visible: 0,
        }
    }

    /// Consecutive transient errors seen so far.
    #[must_use]
    pub const fn errors(&self) -> u32 {
        self.errors
    }

    /// Consecutive attempts on which the resource was absent.
    #[must_use]
    pub const fn not_visible(&self) -> u32 {
        self.not_visible
    }

    /// Classify a failed list call.
    ///
    /// Returns `Retrying` while the transient budget lasts. The counter is not
    /// reset here; only a later successful call does that.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::RetryLimitExceeded` once the budget is spent and
    /// `ResourceError::Api` for non-transient failures.
    pub fn on_error(&mut self, err: ApiError) -> Result<ClusterState> {
        if !is_transient(&err) {
            return Err(ResourceError::Api(err));
        }

        self.errors += 1;
        if self.errors < self.limit {
            tracing::warn!(
                attempt = self.errors,
                limit = self.limit,
                error = %err,
                "Transient CaaS API error, retrying"
            );
            return Ok(ClusterState::Retrying);
        }

        Err(ResourceError::RetryLimitExceeded {
            attempts: self.errors,
            source: err,
        })
    }

    /// Record a successful list call.
    pub fn on_success(&mut self) {
        self.errors = 0;
    }

    /// Record that the resource was present in the list.
    pub fn on_found(&mut self) {
        self.errors = 0;
        self.not_visible = 0;
    }

    /// Classify an attempt on which the resource was absent from the list.
    ///
    /// Absence is the goal when waiting for deletion. Otherwise it is tolerated
    /// for `limit` consecutive attempts.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::NotVisible` once the resource has been absent
    /// for more than `limit` attempts.
    pub fn on_missing(&mut self, id: &ClusterId, expect_deleted: bool) -> Result<ClusterState> {
        if expect_deleted {
            return Ok(ClusterState::Deleted);
        }

        self.not_visible += 1;
        if self.not_visible > self.limit {
            return Err(ResourceError::NotVisible {
                cluster_id: id.clone(),
                attempts: self.not_visible,
            });
        }

        tracing::warn!(
            cluster_id = %id,
            attempt = self.not_visible,
            limit = self.limit,
            "Cluster not visible yet, retrying"
        );
        Ok(ClusterState::Retrying)
    }
}

impl Default for RetryCounters {
    fn default() -> Self {
        Self::new(3)
    }
}
