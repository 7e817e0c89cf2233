//! Generic wait-for-state loop.
//!
//! [`wait_for_state`] drives any [`Poll`] implementation until it reports a
//! target state, reports a state that is neither pending nor a target, fails,
//! or runs out of time. Each attempt runs under the overall deadline, so a
//! hanging request cannot stretch the operation past its timeout.
//!
//! An operation made of several steps takes one deadline up front with
//! [`PollConf::deadline`] and runs every step against it: requests through
//! [`PollConf::bounded`], waits through [`wait_until`].
//!
//! ```text
//!   delay ─▶ poll ─┬─ target ─────────────▶ Ok(state)
//!                  ├─ pending / retrying ─▶ sleep(interval) ─▶ poll
//!                  ├─ anything else ──────▶ Err(UnexpectedState)
//!                  └─ error ──────────────▶ Err(error)
//!   deadline reached at any point ────────▶ Err(Timeout)
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use caas_core::{ClusterId, ClusterState};
use tokio::time::{sleep_until, timeout_at, Instant};

use crate::config::Timeouts;
use crate::error::{ResourceError, Result};

/// A source of observed states.
#[async_trait]
pub trait Poll: Send {
    /// The resource being observed, for diagnostics.
    fn cluster_id(&self) -> &ClusterId;

    /// Observe the current state once.
    ///
    /// Transient failures are reported as [`ClusterState::Retrying`].
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt failed fatally.
    async fn poll(&mut self) -> Result<ClusterState>;
}

/// Parameters of one wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConf {
    /// Operation name used in errors and logs, e.g. `cluster create`.
    pub operation: &'static str,
    /// States that mean "keep waiting".
    pub pending: Vec<ClusterState>,
    /// States that end the wait successfully.
    pub target: Vec<ClusterState>,
    /// Time between two attempts.
    pub interval: Duration,
    /// Overall budget of the operation.
    pub timeout: Duration,
    /// Time to wait before the first attempt.
    pub delay: Duration,
    /// Transient failures tolerated by the poller's retry counters.
    pub retry_limit: u32,
}

impl PollConf {
    /// Wait for a newly submitted cluster to become ready.
    #[must_use]
    pub fn create(timeouts: &Timeouts) -> Self {
        Self {
            operation: "cluster create",
            pending: vec![
                ClusterState::Initializing,
                ClusterState::InfraProvisioning,
                ClusterState::Creating,
                ClusterState::Retrying,
            ],
            target: vec![ClusterState::Ready],
            interval: timeouts.poll_interval(),
            timeout: timeouts.create(),
            delay: Duration::ZERO,
            retry_limit: timeouts.retry_limit,
        }
    }

    /// Wait for the machine-set update issued right after creation.
    #[must_use]
    pub fn create_follow_up(timeouts: &Timeouts) -> Self {
        Self {
            operation: "cluster create",
            timeout: timeouts.create(),
            ..Self::update(timeouts)
        }
    }

    /// Wait for an update to settle.
    #[must_use]
    pub fn update(timeouts: &Timeouts) -> Self {
        Self {
            operation: "cluster update",
            pending: vec![
                ClusterState::InfraProvisioning,
                ClusterState::Creating,
                ClusterState::Retrying,
                ClusterState::Updating,
                ClusterState::InfraDeprovisioning,
                ClusterState::Upgrading,
            ],
            target: vec![ClusterState::Ready],
            interval: timeouts.poll_interval(),
            timeout: timeouts.update(),
            delay: Duration::ZERO,
            retry_limit: timeouts.retry_limit,
        }
    }

    /// Wait for a cluster to disappear.
    ///
    /// The first check is delayed by one interval so the backend can move the
    /// cluster out of `ready`.
    #[must_use]
    pub fn delete(timeouts: &Timeouts) -> Self {
        Self {
            operation: "cluster delete",
            pending: vec![ClusterState::Deleting, ClusterState::Retrying],
            target: vec![ClusterState::Deleted],
            interval: timeouts.poll_interval(),
            timeout: timeouts.delete(),
            delay: timeouts.poll_interval(),
            retry_limit: timeouts.retry_limit,
        }
    }

    /// Returns true if `state` ends the wait successfully.
    #[must_use]
    pub fn is_target(&self, state: &ClusterState) -> bool {
        self.target.contains(state)
    }

    /// Returns true if `state` means "keep waiting".
    #[must_use]
    pub fn is_pending(&self, state: &ClusterState) -> bool {
        state.is_synthetic() || self.pending.contains(state)
    }

    /// Returns true if absence of the resource is the goal.
    #[must_use]
    pub fn expects_deletion(&self) -> bool {
        self.is_target(&ClusterState::Deleted)
    }

    /// The instant at which an operation starting now runs out of budget.
    ///
    /// Budgets too large to represent end roughly thirty years from now.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        deadline_after(Instant::now(), self.timeout)
    }

    /// Run one step of the operation, failing with `ResourceError::Timeout`
    /// once `deadline` passes.
    ///
    /// # Errors
    ///
    /// Returns the step's own error, or a timeout.
    pub async fn bounded<F, T, E>(&self, deadline: Instant, step: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        ResourceError: From<E>,
    {
        match timeout_at(deadline, step).await {
            Ok(result) => result.map_err(ResourceError::from),
            Err(_) => Err(self.timed_out()),
        }
    }

    const fn timed_out(&self) -> ResourceError {
        ResourceError::Timeout {
            operation: self.operation,
            timeout: self.timeout,
        }
    }
}

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(start: Instant, budget: Duration) -> Instant {
    start
        .checked_add(budget)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

/// Poll until a target state is observed, with the whole of `conf.timeout`
/// as budget.
///
/// # Errors
///
/// See [`wait_until`].
pub async fn wait_for_state<P>(poller: &mut P, conf: &PollConf) -> Result<ClusterState>
where
    P: Poll + ?Sized,
{
    wait_until(poller, conf, conf.deadline()).await
}

/// Poll until a target state is observed or `deadline` passes.
///
/// # Errors
///
/// Returns `ResourceError::Timeout` when the deadline passes,
/// `ResourceError::UnexpectedState` for a state outside both sets, and any
/// error returned by the poller itself.
pub async fn wait_until<P>(
    poller: &mut P,
    conf: &PollConf,
    deadline: Instant,
) -> Result<ClusterState>
where
    P: Poll + ?Sized,
{
    if !conf.delay.is_zero() {
        sleep_until(deadline_after(Instant::now(), conf.delay).min(deadline)).await;
    }

    let mut attempt: u32 = 0;
    loop {
        if Instant::now() >= deadline {
            tracing::warn!(
                cluster_id = %poller.cluster_id(),
                operation = conf.operation,
                attempts = attempt,
                "Timed out waiting for cluster state"
            );
            return Err(conf.timed_out());
        }

        attempt += 1;
        let state = timeout_at(deadline, poller.poll())
            .await
            .map_err(|_| conf.timed_out())??;

        tracing::debug!(
            cluster_id = %poller.cluster_id(),
            operation = conf.operation,
            attempt,
            state = %state,
            "Polled cluster state"
        );

        if conf.is_target(&state) {
            return Ok(state);
        }
        if !conf.is_pending(&state) {
            return Err(ResourceError::UnexpectedState {
                operation: conf.operation,
                cluster_id: poller.cluster_id().clone(),
                state,
            });
        }

        sleep_until(deadline_after(Instant::now(), conf.interval).min(deadline)).await;
    }
}
