//! The machine blueprint resource.
//!
//! Machine blueprints are created synchronously and cannot be changed in
//! place; any change replaces the blueprint.

use async_trait::async_trait;
use caas_client::filter;
use caas_core::{CreateMachineBlueprint, MachineBlueprint, MachineBlueprintId, SiteId};
use serde::{Deserialize, Serialize};

use crate::context::ProviderContext;
use crate::error::{ResourceError, Result};
use crate::resource::Resource;

const KIND: &str = "machine blueprint";

/// Declared configuration of a machine blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineBlueprintSpec {
    /// Blueprint name.
    pub name: String,
    /// Site the blueprint belongs to.
    pub site_id: SiteId,
    /// Roles of machines built from the blueprint, e.g. `worker`.
    pub machine_roles: Vec<String>,
    /// Machine provider, e.g. `vmaas`.
    pub machine_provider: String,
    /// OS image.
    pub os_image: String,
    /// OS version.
    pub os_version: String,
    /// Compute instance type.
    pub compute_type: String,
    /// Size name, e.g. `xlarge`.
    pub size: String,
    /// Storage instance type.
    pub storage_type: String,
}

impl MachineBlueprintSpec {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.site_id.is_empty() {
            return Err(ResourceError::InvalidConfig(
                "machine blueprint needs a name and a site".to_string(),
            ));
        }
        if self.machine_roles.is_empty() {
            return Err(ResourceError::InvalidConfig(format!(
                "machine blueprint {} needs at least one machine role",
                self.name
            )));
        }
        Ok(())
    }

    fn to_request(&self) -> CreateMachineBlueprint {
        CreateMachineBlueprint {
            name: self.name.clone(),
            appliance_id: self.site_id.clone(),
            machine_roles: self.machine_roles.clone(),
            machine_provider: self.machine_provider.clone(),
            os_image: self.os_image.clone(),
            os_version: self.os_version.clone(),
            compute_instance_type: self.compute_type.clone(),
            size: self.size.clone(),
            storage_instance_type: self.storage_type.clone(),
        }
    }
}

/// Persisted state of a machine blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineBlueprintData {
    /// Backend identifier.
    pub id: Option<MachineBlueprintId>,
    /// Declared configuration.
    pub spec: MachineBlueprintSpec,
    /// The blueprint as last read.
    #[serde(default)]
    pub blueprint: Option<MachineBlueprint>,
}

impl MachineBlueprintData {
    /// State for a blueprint that does not exist yet.
    #[must_use]
    pub fn new(spec: MachineBlueprintSpec) -> Self {
        Self {
            spec,
            ..Self::default()
        }
    }
}

/// Create, read and delete machine blueprints.
#[derive(Debug, Clone)]
pub struct MachineBlueprintResource {
    context: ProviderContext,
}

impl MachineBlueprintResource {
    /// Create the resource.
    #[must_use]
    pub const fn new(context: ProviderContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Resource for MachineBlueprintResource {
    type State = MachineBlueprintData;

    fn kind(&self) -> &'static str {
        KIND
    }

    async fn create(&self, state: &mut MachineBlueprintData) -> Result<()> {
        state.spec.validate()?;

        let token = self.context.token().await?;
        let created = self
            .context
            .api()
            .create_machine_blueprint(&token, &state.spec.to_request())
            .await
            .inspect_err(|err| {
                tracing::error!(name = %state.spec.name, error = %err, "Machine blueprint create failed");
            })?;

        tracing::info!(blueprint_id = %created.id, name = %created.name, "Machine blueprint created");
        state.id = Some(created.id);

        self.read(state).await
    }

    async fn read(&self, state: &mut MachineBlueprintData) -> Result<()> {
        let id = state.id.clone().ok_or(ResourceError::MissingId(KIND))?;
        let token = self.context.token().await?;

        let blueprint = self
            .context
            .api()
            .get_machine_blueprint(&token, &id, &filter::site_filter(&state.spec.site_id))
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

    async fn delete(&self, state: &mut MachineBlueprintData) -> Result<()> {
        let id = state.id.clone().ok_or(ResourceError::MissingId(KIND))?;
        let token = self.context.token().await?;

        self.context
            .api()
            .delete_machine_blueprint(&token, &id)
            .await
            .inspect_err(|err| {
                tracing::error!(blueprint_id = %id, error = %err, "Machine blueprint delete failed");
            })?;

        tracing::info!(blueprint_id = %id, "Machine blueprint deleted");
        state.id = None;
        Ok(())
    }
}
