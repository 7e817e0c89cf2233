//! Resource reconciliation for the CaaS provider.
//!
//! This crate turns declared resource configuration into CaaS API calls and
//! drives long-running cluster operations to completion.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Host runtime (plan / apply)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  Resource::{create, read, update, delete}
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ClusterResource   MachineBlueprintResource   ClusterBlue…  │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │   Merger    │ │   Poller    │ │  Retry classifier   │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                ┌─────────────┴─────────────┐
//!                ▼                           ▼
//!         ┌─────────────┐             ┌─────────────┐
//!         │  CaaS API   │             │  IAM token  │
//!         │  (reqwest)  │             │  provider   │
//!         └─────────────┘             └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use caas_core::{ClusterBlueprintId, SiteId, SpaceId};
//! use caas_provider::{ClusterData, ClusterSpec, ProviderConfig, ProviderContext, Resource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! caas_provider::logging::init();
//!
//! let context = ProviderContext::from_config(&ProviderConfig::from_env()?)?;
//! let clusters = context.clusters();
//!
//! let mut state = ClusterData::new(ClusterSpec {
//!     name: "demo".to_string(),
//!     blueprint_id: ClusterBlueprintId::parse("cbp-1")?,
//!     site_id: SiteId::parse("site-1")?,
//!     space_id: SpaceId::parse("space-1")?,
//!     ..ClusterSpec::default()
//! });
//! clusters.create(&mut state).await?;
//!
//! println!("cluster {:?} is up", state.id);
//! # Ok(())
//! # }
//! ```
//!
//! # Cluster operations
//!
//! | Operation | Waits through | Until |
//! |---|---|---|
//! | create | initializing, infra-provisioning, creating | ready |
//! | create follow-up, update | infra-provisioning, creating, updating, upgrading, infra-deprovisioning | ready |
//! | delete | deleting | deleted |
//!
//! See the [`poller`] and [`retry`] modules for how attempts are classified.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cluster;
pub mod cluster_blueprint;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod machine_blueprint;
pub mod merge;
pub mod poller;
pub mod resource;
pub mod retry;

pub use cluster::{ClusterData, ClusterResource, ClusterSpec, ClusterWatcher};
pub use cluster_blueprint::{ClusterBlueprintData, ClusterBlueprintResource, ClusterBlueprintSpec};
pub use config::{ProviderConfig, Timeouts};
pub use context::ProviderContext;
pub use error::{ResourceError, Result};
pub use machine_blueprint::{MachineBlueprintData, MachineBlueprintResource, MachineBlueprintSpec};
pub use merge::MergeOrder;
pub use poller::{wait_for_state, wait_until, Poll, PollConf};
pub use resource::Resource;
pub use retry::RetryCounters;
