//! Filter expressions accepted by the `field` query parameter.

use caas_core::{SiteId, SpaceId};

/// Filter scoping a query to the clusters of one space.
#[must_use]
pub fn space_filter(space_id: &SpaceId) -> String {
    format!("spaceID eq {space_id}")
}

/// Filter scoping a query to one site (appliance).
#[must_use]
pub fn site_filter(site_id: &SiteId) -> String {
    format!("applianceID eq {site_id}")
}
