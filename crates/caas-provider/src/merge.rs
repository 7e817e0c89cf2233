//! Machine set merging.
//!
//! A cluster is created with default machine sets chosen by its blueprint:
//! a control plane pool and one or more worker pools. Users declare extra
//! worker pools, and may take over a default pool by declaring one with the
//! same name. Every update must send the complete list, so the declared pools
//! and the untouched defaults are merged here.

use caas_core::{MachineSet, MachineSetDetail};

use crate::error::{ResourceError, Result};

/// Where the remaining defaults go relative to the declared sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOrder {
    /// Defaults, then declared sets. Used right after creation.
    DefaultsFirst,
    /// Declared sets, then defaults. Used by updates.
    DeclaredFirst,
}

/// Names of the default machine sets that are worker pools.
///
/// # Errors
///
/// Returns `ResourceError::NoWorkerMachineSet` if no detail has the worker role.
pub fn default_worker_names(details: &[MachineSetDetail]) -> Result<Vec<String>> {
    let names: Vec<String> = details
        .iter()
        .filter(|detail| detail.is_worker())
        .map(|detail| detail.name.clone())
        .collect();

    if names.is_empty() {
        return Err(ResourceError::NoWorkerMachineSet);
    }
    Ok(names)
}

/// Merge declared machine sets with the cluster's defaults.
///
/// A default whose name is also declared is dropped in favour of the declared
/// set. Relative order within each group is preserved.
#[must_use]
pub fn merge_machine_sets(
    declared: &[MachineSet],
    defaults: &[MachineSet],
    default_workers: &[String],
    order: MergeOrder,
) -> Vec<MachineSet> {
    let kept = defaults.iter().filter(|default| {
        let replaced = declared.iter().any(|set| set.name == default.name);
        if replaced && !default_workers.contains(&default.name) {
            tracing::warn!(
                machine_set = %default.name,
                "Declared machine set replaces a non-worker default"
            );
        }
        !replaced
    });

    match order {
        MergeOrder::DefaultsFirst => kept.chain(declared).cloned().collect(),
        MergeOrder::DeclaredFirst => declared.iter().chain(kept).cloned().collect(),
    }
}

/// Refresh the OS image and version of default worker pools.
///
/// Default worker pools take their OS fields from the observed machine set of
/// the same name, so a scale request does not roll back an OS upgrade applied
/// since creation. A worker absent from `observed` gets empty OS fields, which
/// leaves the choice to the backend. Other defaults are returned unchanged.
#[must_use]
pub fn refresh_default_workers(
    defaults: &[MachineSet],
    default_workers: &[String],
    observed: &[MachineSet],
) -> Vec<MachineSet> {
    defaults
        .iter()
        .map(|default| {
            if !default_workers.contains(&default.name) {
                return default.clone();
            }
            let current = observed.iter().find(|set| set.name == default.name);
            MachineSet {
                os_image: current.map(|set| set.os_image.clone()).unwrap_or_default(),
                os_version: current.map(|set| set.os_version.clone()).unwrap_or_default(),
                ..default.clone()
            }
        })
        .collect()
}
