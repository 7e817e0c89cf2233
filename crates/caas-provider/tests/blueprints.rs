//! Machine and cluster blueprint resource tests.

use std::sync::Arc;

use caas_auth::StaticTokenProvider;
use caas_client::mock::ScriptedCaasApi;
use caas_core::{MachineBlueprintId, MachineSet, SiteId};
use caas_provider::{
    ClusterBlueprintData, ClusterBlueprintSpec, MachineBlueprintData, MachineBlueprintSpec,
    ProviderContext, Resource, ResourceError, Timeouts,
};

fn context() -> (Arc<ScriptedCaasApi>, ProviderContext) {
    let api = Arc::new(ScriptedCaasApi::new());
    let tokens = Arc::new(StaticTokenProvider::new("token-1"));
    let context = ProviderContext::new(api.clone(), tokens, Timeouts::default());
    (api, context)
}

fn machine_blueprint_spec() -> MachineBlueprintSpec {
    MachineBlueprintSpec {
        name: "xlarge-worker".to_string(),
        site_id: SiteId::new("site-1"),
        machine_roles: vec!["worker".to_string()],
        machine_provider: "vmaas".to_string(),
        os_image: "sles-custom".to_string(),
        os_version: "15.3".to_string(),
        compute_type: "General Purpose".to_string(),
        size: "xlarge".to_string(),
        storage_type: "General Purpose".to_string(),
    }
}

fn pool(name: &str, count: u32) -> MachineSet {
    MachineSet {
        name: name.to_string(),
        machine_blueprint_id: MachineBlueprintId::new(format!("mbp-{name}")),
        count,
        ..MachineSet::default()
    }
}

fn cluster_blueprint_spec() -> ClusterBlueprintSpec {
    ClusterBlueprintSpec {
        name: "standard".to_string(),
        k8s_version: "1.27.3".to_string(),
        default_storage_class: "gl-sbp-frontline".to_string(),
        site_id: SiteId::new("site-1"),
        cluster_provider: "ecp".to_string(),
        control_plane: pool("master", 1),
        worker_nodes: vec![pool("worker", 2)],
    }
}

#[tokio::test]
async fn machine_blueprint_lifecycle() {
    let (api, context) = context();
    let blueprints = context.machine_blueprints();

    let mut state = MachineBlueprintData::new(machine_blueprint_spec());
    blueprints.create(&mut state).await.unwrap();

    let id = state.id.clone().unwrap();
    let blueprint = state.blueprint.as_ref().unwrap();
    assert_eq!(blueprint.id, id);
    assert_eq!(blueprint.size, "xlarge");
    assert_eq!(blueprint.machine_roles, vec!["worker"]);
    assert_eq!(
        api.calls(),
        vec!["MachineBlueprintsPost", "MachineBlueprintsIdGet"]
    );

    blueprints.delete(&mut state).await.unwrap();
    assert_eq!(state.id, None);

    state.id = Some(id);
    assert!(blueprints.read(&mut state).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn machine_blueprint_update_not_supported() {
    let (_api, context) = context();
    let blueprints = context.machine_blueprints();

    let previous = MachineBlueprintData::new(machine_blueprint_spec());
    let mut state = previous.clone();
    state.spec.size = "large".to_string();

    assert!(matches!(
        blueprints.update(&mut state, &previous).await,
        Err(ResourceError::UpdateNotSupported("machine blueprint"))
    ));
}

#[tokio::test]
async fn machine_blueprint_create_rejected() {
    let (api, context) = context();
    api.fail_next("MachineBlueprintsPost", 400);

    let mut state = MachineBlueprintData::new(machine_blueprint_spec());
    let err = context
        .machine_blueprints()
        .create(&mut state)
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), Some(400));
    assert_eq!(state.id, None);
}

#[tokio::test]
async fn machine_blueprint_delete_failure_keeps_identifier() {
    let (api, context) = context();
    let blueprints = context.machine_blueprints();

    let mut state = MachineBlueprintData::new(machine_blueprint_spec());
    blueprints.create(&mut state).await.unwrap();

    api.fail_next("MachineBlueprintsIdDelete", 409);
    assert!(blueprints.delete(&mut state).await.is_err());
    assert!(state.id.is_some());
}

#[tokio::test]
async fn cluster_blueprint_lifecycle() {
    let (api, context) = context();
    let blueprints = context.cluster_blueprints();

    let mut state = ClusterBlueprintData::new(cluster_blueprint_spec());
    blueprints.create(&mut state).await.unwrap();

    let blueprint = state.blueprint.as_ref().unwrap();
    let names: Vec<&str> = blueprint.machine_sets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["master", "worker"]);
    assert_eq!(blueprint.k8s_version, "1.27.3");
    assert_eq!(blueprint.cluster_provider, "ecp");

    blueprints.delete(&mut state).await.unwrap();
    assert_eq!(state.id, None);
    assert_eq!(api.call_count("ClusterBlueprintsIdDelete"), 1);
}

#[tokio::test]
async fn cluster_blueprint_invalid_config_makes_no_calls() {
    let (api, context) = context();

    let mut state = ClusterBlueprintData::new(ClusterBlueprintSpec {
        worker_nodes: vec![],
        ..cluster_blueprint_spec()
    });
    let err = context
        .cluster_blueprints()
        .create(&mut state)
        .await
        .unwrap_err();

    assert!(matches!(err, ResourceError::InvalidConfig(_)));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn cluster_blueprint_update_not_supported() {
    let (_api, context) = context();
    let previous = ClusterBlueprintData::new(cluster_blueprint_spec());
    let mut state = previous.clone();

    let err = context
        .cluster_blueprints()
        .update(&mut state, &previous)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "cluster blueprint does not support update");
}
