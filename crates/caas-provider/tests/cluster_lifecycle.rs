//! Cluster lifecycle tests against a scripted CaaS API.
//!
//! Time is paused, so 10-second poll intervals and hour-long timeouts run
//! instantly while elapsed virtual time can still be asserted.

use std::sync::Arc;
use std::time::Duration;

use caas_auth::StaticTokenProvider;
use caas_client::mock::{self, ListStep, ScriptedCaasApi};
use caas_core::{
    Cluster, ClusterBlueprintId, ClusterId, ClusterState, MachineBlueprintId, MachineSet,
    MachineSetDetail, SiteId, SpaceId, CONTROL_PLANE_ROLE, WORKER_ROLE,
};
use caas_provider::{
    ClusterData, ClusterResource, ClusterSpec, ProviderContext, Resource, ResourceError, Timeouts,
};
use tokio::time::Instant;

const CLUSTER_ID: &str = "c-1";

struct Harness {
    api: Arc<ScriptedCaasApi>,
    tokens: Arc<StaticTokenProvider>,
    clusters: ClusterResource,
}

fn harness_with(timeouts: Timeouts) -> Harness {
    let api = Arc::new(ScriptedCaasApi::new());
    let tokens = Arc::new(StaticTokenProvider::new("token-1"));
    let context = ProviderContext::new(api.clone(), tokens.clone(), timeouts);
    api.set_kubeconfig("apiVersion: v1\nkind: Config\n");

    Harness {
        api,
        tokens,
        clusters: context.clusters(),
    }
}

fn harness() -> Harness {
    harness_with(Timeouts::default())
}

fn machine_set(name: &str, count: u32) -> MachineSet {
    MachineSet {
        name: name.to_string(),
        machine_blueprint_id: MachineBlueprintId::new(format!("mbp-{name}")),
        count,
        ..MachineSet::default()
    }
}

fn detail(name: &str, role: &str) -> MachineSetDetail {
    MachineSetDetail {
        name: name.to_string(),
        machine_roles: vec![role.to_string()],
        machine_provider: Some("vmaas".to_string()),
        ..MachineSetDetail::default()
    }
}

/// A cluster with the defaults a typical blueprint creates.
fn demo_cluster(state: ClusterState) -> Cluster {
    Cluster {
        space_id: SpaceId::new("space-1"),
        appliance_id: SiteId::new("site-1"),
        cluster_blueprint_id: ClusterBlueprintId::new("cbp-1"),
        machine_sets: vec![machine_set("master", 1), machine_set("worker", 2)],
        machine_sets_detail: vec![
            detail("master", CONTROL_PLANE_ROLE),
            detail("worker", WORKER_ROLE),
        ],
        api_endpoint: "https://demo.example.com:6443".to_string(),
        ..mock::cluster(CLUSTER_ID, state)
    }
}

fn spec() -> ClusterSpec {
    ClusterSpec {
        name: "demo".to_string(),
        blueprint_id: ClusterBlueprintId::new("cbp-1"),
        site_id: SiteId::new("site-1"),
        space_id: SpaceId::new("space-1"),
        ..ClusterSpec::default()
    }
}

/// Persisted state of a cluster that was created earlier.
fn existing(spec: ClusterSpec) -> ClusterData {
    let cluster = demo_cluster(ClusterState::Ready);
    ClusterData {
        id: Some(ClusterId::new(CLUSTER_ID)),
        spec,
        default_machine_sets: cluster.machine_sets.clone(),
        default_machine_sets_detail: cluster.machine_sets_detail.clone(),
        cluster: Some(cluster),
        kubeconfig: String::new(),
    }
}

fn names(sets: &[MachineSet]) -> Vec<(&str, u32)> {
    sets.iter().map(|set| (set.name.as_str(), set.count)).collect()
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test(start_paused = true)]
async fn create_demo_cluster() {
    let h = harness();
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    h.api.push_states(
        &demo_cluster(ClusterState::Initializing),
        &[
            ClusterState::Initializing,
            ClusterState::InfraProvisioning,
            ClusterState::Creating,
            ClusterState::Ready,
        ],
    );
    h.api.set_cluster(Some(demo_cluster(ClusterState::Ready)));

    let mut state = ClusterData::new(spec());
    let started = Instant::now();
    h.clusters.create(&mut state).await.unwrap();

    assert_eq!(state.id, Some(ClusterId::new(CLUSTER_ID)));
    assert_eq!(
        names(&state.default_machine_sets),
        vec![("master", 1), ("worker", 2)]
    );
    assert_eq!(state.default_machine_sets_detail.len(), 2);
    assert_eq!(state.cluster.as_ref().unwrap().state, ClusterState::Ready);
    assert!(state.kubeconfig.starts_with("apiVersion: v1"));

    assert_eq!(started.elapsed(), Duration::from_secs(30));
    assert_eq!(h.api.call_count("ClustersGet"), 4);
    assert_eq!(h.api.call_count("ClustersIdPut"), 0);
    assert_eq!(
        h.api.calls(),
        vec![
            "ClustersPost",
            "ClustersGet",
            "ClustersGet",
            "ClustersGet",
            "ClustersGet",
            "ClustersIdGet",
            "ClustersIdKubeconfigGet",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn token_is_fetched_for_every_poll_attempt() {
    let h = harness();
    h.api.push_states(
        &demo_cluster(ClusterState::Initializing),
        &[ClusterState::Creating, ClusterState::Creating, ClusterState::Ready],
    );
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    h.api.set_cluster(Some(demo_cluster(ClusterState::Ready)));

    let mut state = ClusterData::new(spec());
    h.clusters.create(&mut state).await.unwrap();

    // create + three polls + read
    assert_eq!(h.tokens.calls(), 5);
    assert!(h.api.tokens().iter().all(|token| token == "token-1"));
}

#[tokio::test(start_paused = true)]
async fn create_absorbs_fewer_than_three_server_errors() {
    let h = harness();
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    h.api.push_list(ListStep::Status(500));
    h.api.push_list(ListStep::Timeout);
    h.api
        .push_states(&demo_cluster(ClusterState::Creating), &[ClusterState::Ready]);
    h.api.set_cluster(Some(demo_cluster(ClusterState::Ready)));

    let mut state = ClusterData::new(spec());
    h.clusters.create(&mut state).await.unwrap();

    assert_eq!(state.id, Some(ClusterId::new(CLUSTER_ID)));
    assert_eq!(h.api.call_count("ClustersGet"), 3);
}

#[tokio::test(start_paused = true)]
async fn create_fails_after_three_server_errors() {
    let h = harness();
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    for status in [500, 504, 500] {
        h.api.push_list(ListStep::Status(status));
    }

    let mut state = ClusterData::new(spec());
    let err = h.clusters.create(&mut state).await.unwrap_err();

    match err {
        ResourceError::RetryLimitExceeded { attempts, ref source } => {
            assert_eq!(attempts, 3);
            assert_eq!(source.http_status(), Some(500));
        }
        other => panic!("expected RetryLimitExceeded, got {other:?}"),
    }
    assert_eq!(state.id, None);
    assert_eq!(h.api.call_count("ClustersGet"), 3);
}

#[tokio::test(start_paused = true)]
async fn create_fails_immediately_on_other_status() {
    let h = harness();
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    h.api.push_list(ListStep::Status(403));

    let mut state = ClusterData::new(spec());
    let err = h.clusters.create(&mut state).await.unwrap_err();

    assert_eq!(err.http_status(), Some(403));
    assert_eq!(h.api.call_count("ClustersGet"), 1);
}

#[tokio::test(start_paused = true)]
async fn create_fails_immediately_on_connection_error() {
    let h = harness();
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    h.api.push_list(ListStep::Transport);

    let mut state = ClusterData::new(spec());
    let err = h.clusters.create(&mut state).await.unwrap_err();

    assert!(matches!(err, ResourceError::Api(_)));
    assert_eq!(h.api.call_count("ClustersGet"), 1);
}

#[tokio::test(start_paused = true)]
async fn create_tolerates_three_invisible_attempts() {
    let h = harness();
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    for _ in 0..3 {
        h.api.push_list(ListStep::Clusters(vec![]));
    }
    h.api
        .push_states(&demo_cluster(ClusterState::Creating), &[ClusterState::Ready]);
    h.api.set_cluster(Some(demo_cluster(ClusterState::Ready)));

    let mut state = ClusterData::new(spec());
    h.clusters.create(&mut state).await.unwrap();

    assert_eq!(h.api.call_count("ClustersGet"), 4);
}

#[tokio::test(start_paused = true)]
async fn create_fails_after_four_invisible_attempts() {
    let h = harness();
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    for _ in 0..4 {
        h.api.push_list(ListStep::Clusters(vec![mock::cluster(
            "someone-else",
            ClusterState::Ready,
        )]));
    }

    let mut state = ClusterData::new(spec());
    let err = h.clusters.create(&mut state).await.unwrap_err();

    match err {
        ResourceError::NotVisible {
            cluster_id,
            attempts,
        } => {
            assert_eq!(cluster_id, ClusterId::new(CLUSTER_ID));
            assert_eq!(attempts, 4);
        }
        other => panic!("expected NotVisible, got {other:?}"),
    }
    assert_eq!(state.id, None);
}

#[tokio::test(start_paused = true)]
async fn create_times_out() {
    let h = harness_with(Timeouts {
        create_minutes: 1,
        ..Timeouts::default()
    });
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    h.api.push_states(
        &demo_cluster(ClusterState::Creating),
        &vec![ClusterState::Creating; 20],
    );

    let mut state = ClusterData::new(spec());
    let started = Instant::now();
    let err = h.clusters.create(&mut state).await.unwrap_err();

    assert!(matches!(
        err,
        ResourceError::Timeout {
            operation: "cluster create",
            ..
        }
    ));
    assert!(started.elapsed() <= Duration::from_secs(70));
    assert_eq!(h.api.call_count("ClustersGet"), 6);
    assert_eq!(state.id, None);
}

#[tokio::test(start_paused = true)]
async fn create_fails_fast_on_unexpected_state() {
    let h = harness();
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    h.api.push_states(
        &demo_cluster(ClusterState::Creating),
        &[
            ClusterState::Creating,
            ClusterState::from("failed"),
        ],
    );

    let mut state = ClusterData::new(spec());
    let err = h.clusters.create(&mut state).await.unwrap_err();

    match err {
        ResourceError::UnexpectedState { state, .. } => {
            assert_eq!(state, ClusterState::Unknown("failed".to_string()));
        }
        other => panic!("expected UnexpectedState, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn create_rejected_by_api() {
    let h = harness();
    h.api.fail_next("ClustersPost", 400);

    let mut state = ClusterData::new(spec());
    let err = h.clusters.create(&mut state).await.unwrap_err();

    assert_eq!(err.http_status(), Some(400));
    assert!(err.to_string().contains("ClustersPost"));
    assert_eq!(h.api.call_count("ClustersGet"), 0);
}

#[tokio::test(start_paused = true)]
async fn create_with_worker_nodes_issues_follow_up_update() {
    let h = harness();
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    h.api.push_states(
        &demo_cluster(ClusterState::Creating),
        &[
            ClusterState::Creating,
            ClusterState::Ready,
            // follow-up update
            ClusterState::Updating,
            ClusterState::InfraProvisioning,
            ClusterState::Ready,
        ],
    );
    h.api.set_cluster(Some(demo_cluster(ClusterState::Ready)));

    let mut state = ClusterData::new(ClusterSpec {
        worker_nodes: vec![machine_set("worker", 3), machine_set("gpu", 1)],
        kubernetes_version: Some("1.27.3".to_string()),
        ..spec()
    });
    h.clusters.create(&mut state).await.unwrap();

    let requests = h.api.update_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        names(&requests[0].machine_sets),
        vec![("master", 1), ("worker", 3), ("gpu", 1)]
    );
    assert_eq!(requests[0].kubernetes_version, "1.27.3");
    assert_eq!(h.api.call_count("ClustersGet"), 5);
    assert_eq!(
        names(&state.default_machine_sets),
        vec![("master", 1), ("worker", 2)]
    );
}

#[tokio::test(start_paused = true)]
async fn follow_up_update_shares_the_create_deadline() {
    let h = harness_with(Timeouts {
        create_minutes: 1,
        ..Timeouts::default()
    });
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    h.api.push_states(
        &demo_cluster(ClusterState::Creating),
        &[
            ClusterState::Creating,
            ClusterState::Creating,
            ClusterState::Creating,
            ClusterState::Creating,
            ClusterState::Creating,
            ClusterState::Ready,
            // follow-up update
            ClusterState::Updating,
            ClusterState::Updating,
            ClusterState::Updating,
            ClusterState::Updating,
            ClusterState::Updating,
            ClusterState::Ready,
        ],
    );
    h.api.set_cluster(Some(demo_cluster(ClusterState::Ready)));

    let mut state = ClusterData::new(ClusterSpec {
        worker_nodes: vec![machine_set("gpu", 1)],
        ..spec()
    });
    let started = Instant::now();
    let err = h.clusters.create(&mut state).await.unwrap_err();

    match err {
        ResourceError::Timeout { operation, timeout } => {
            assert_eq!(operation, "cluster create");
            assert_eq!(timeout, Duration::from_secs(60));
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert_eq!(started.elapsed(), Duration::from_secs(60));
    assert_eq!(h.api.call_count("ClustersIdPut"), 1);
    assert_eq!(h.api.call_count("ClustersGet"), 7);
    assert_eq!(h.api.call_count("ClustersIdGet"), 0);
    assert_eq!(state.id, Some(ClusterId::new(CLUSTER_ID)));
}

#[tokio::test(start_paused = true)]
async fn follow_up_failure_keeps_identifier() {
    let h = harness();
    let mut no_workers = demo_cluster(ClusterState::Ready);
    no_workers.machine_sets_detail = vec![detail("master", CONTROL_PLANE_ROLE)];
    h.api.set_create_response(demo_cluster(ClusterState::Initializing));
    h.api.push_list(ListStep::Clusters(vec![no_workers]));

    let mut state = ClusterData::new(ClusterSpec {
        worker_nodes: vec![machine_set("gpu", 1)],
        ..spec()
    });
    let err = h.clusters.create(&mut state).await.unwrap_err();

    assert!(matches!(err, ResourceError::NoWorkerMachineSet));
    assert_eq!(state.id, Some(ClusterId::new(CLUSTER_ID)));
    assert_eq!(h.api.call_count("ClustersIdPut"), 0);
}

// =============================================================================
// Read
// =============================================================================

#[tokio::test]
async fn read_projects_cluster_and_kubeconfig() {
    let h = harness();
    let mut remote = demo_cluster(ClusterState::Updating);
    remote.kubernetes_version = "1.26.5".to_string();
    h.api.set_cluster(Some(remote));

    let mut state = existing(spec());
    h.clusters.read(&mut state).await.unwrap();

    let cluster = state.cluster.as_ref().unwrap();
    assert_eq!(cluster.state, ClusterState::Updating);
    assert_eq!(cluster.kubernetes_version, "1.26.5");
    assert_eq!(cluster.api_endpoint, "https://demo.example.com:6443");
    assert!(!state.kubeconfig.is_empty());
    assert_eq!(h.api.call_count("ClustersGet"), 0);
}

#[tokio::test]
async fn read_missing_cluster_is_not_found() {
    let h = harness();
    h.api.set_cluster(None);

    let mut state = existing(spec());
    let err = h.clusters.read(&mut state).await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn read_without_identifier() {
    let h = harness();
    let mut state = ClusterData::new(spec());
    assert!(matches!(
        h.clusters.read(&mut state).await,
        Err(ResourceError::MissingId("cluster"))
    ));
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test(start_paused = true)]
async fn update_scales_declared_pools_first() {
    let h = harness();
    let previous = existing(spec());
    let mut state = existing(ClusterSpec {
        worker_nodes: vec![machine_set("gpu", 2)],
        ..spec()
    });
    h.api.push_states(
        &demo_cluster(ClusterState::Updating),
        &[ClusterState::Updating, ClusterState::Ready],
    );
    h.api.set_cluster(Some(demo_cluster(ClusterState::Ready)));

    h.clusters.update(&mut state, &previous).await.unwrap();

    let requests = h.api.update_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        names(&requests[0].machine_sets),
        vec![("gpu", 2), ("master", 1), ("worker", 2)]
    );
    assert!(requests[0].kubernetes_version.is_empty());
}

#[tokio::test(start_paused = true)]
async fn update_keeps_upgraded_default_worker_os() {
    let h = harness();
    let previous = existing(spec());
    let mut state = existing(ClusterSpec {
        worker_nodes: vec![machine_set("extra", 1)],
        ..spec()
    });

    // The default worker pool was upgraded since creation.
    let observed = state.cluster.as_mut().unwrap();
    observed.machine_sets[1].os_image = "sles-custom".to_string();
    observed.machine_sets[1].os_version = "15.4".to_string();
    state.default_machine_sets[0].os_image = "sles".to_string();
    state.default_machine_sets[0].os_version = "15.2".to_string();

    h.api
        .push_states(&demo_cluster(ClusterState::Ready), &[ClusterState::Ready]);
    h.api.set_cluster(Some(demo_cluster(ClusterState::Ready)));

    h.clusters.update(&mut state, &previous).await.unwrap();

    let request = &h.api.update_requests()[0];
    let worker = request
        .machine_sets
        .iter()
        .find(|set| set.name == "worker")
        .unwrap();
    assert_eq!(worker.os_image, "sles-custom");
    assert_eq!(worker.os_version, "15.4");

    let master = request
        .machine_sets
        .iter()
        .find(|set| set.name == "master")
        .unwrap();
    assert_eq!(master.os_version, "15.2");
}

#[tokio::test(start_paused = true)]
async fn update_with_version_only() {
    let h = harness();
    let previous = existing(spec());
    let mut state = existing(ClusterSpec {
        kubernetes_version: Some("1.28.1".to_string()),
        ..spec()
    });
    h.api.push_states(
        &demo_cluster(ClusterState::Upgrading),
        &[
            ClusterState::Upgrading,
            ClusterState::InfraDeprovisioning,
            ClusterState::Ready,
        ],
    );
    h.api.set_cluster(Some(demo_cluster(ClusterState::Ready)));

    h.clusters.update(&mut state, &previous).await.unwrap();

    let requests = h.api.update_requests();
    assert_eq!(requests[0].kubernetes_version, "1.28.1");
    assert_eq!(
        names(&requests[0].machine_sets),
        vec![("master", 1), ("worker", 2)]
    );
}

#[tokio::test]
async fn update_without_changes_only_reads() {
    let h = harness();
    let previous = existing(spec());
    let mut state = existing(spec());
    h.api.set_cluster(Some(demo_cluster(ClusterState::Ready)));

    h.clusters.update(&mut state, &previous).await.unwrap();

    assert_eq!(
        h.api.calls(),
        vec!["ClustersIdGet", "ClustersIdKubeconfigGet"]
    );
}

#[tokio::test(start_paused = true)]
async fn update_is_bounded_by_update_timeout() {
    let h = harness_with(Timeouts {
        update_minutes: 1,
        ..Timeouts::default()
    });
    let previous = existing(spec());
    let mut state = existing(ClusterSpec {
        worker_nodes: vec![machine_set("gpu", 2)],
        ..spec()
    });
    h.api.push_states(
        &demo_cluster(ClusterState::Updating),
        &vec![ClusterState::Updating; 20],
    );

    let started = Instant::now();
    let err = h.clusters.update(&mut state, &previous).await.unwrap_err();

    assert!(matches!(
        err,
        ResourceError::Timeout {
            operation: "cluster update",
            ..
        }
    ));
    assert_eq!(started.elapsed(), Duration::from_secs(60));
    assert_eq!(h.api.call_count("ClustersGet"), 6);
    assert_eq!(state.id, Some(ClusterId::new(CLUSTER_ID)));
}

#[tokio::test(start_paused = true)]
async fn update_failure_keeps_identifier() {
    let h = harness();
    let previous = existing(spec());
    let mut state = existing(ClusterSpec {
        worker_nodes: vec![machine_set("gpu", 2)],
        ..spec()
    });
    for _ in 0..3 {
        h.api.push_list(ListStep::Status(500));
    }

    let err = h.clusters.update(&mut state, &previous).await.unwrap_err();

    assert!(matches!(err, ResourceError::RetryLimitExceeded { .. }));
    assert_eq!(state.id, Some(ClusterId::new(CLUSTER_ID)));
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test(start_paused = true)]
async fn delete_absent_cluster_is_immediate_success() {
    let h = harness();
    h.api.push_list(ListStep::Clusters(vec![]));

    let mut state = existing(spec());
    let started = Instant::now();
    h.clusters.delete(&mut state).await.unwrap();

    assert_eq!(state.id, None);
    assert_eq!(h.api.call_count("ClustersGet"), 1);
    // Only the initial delay elapsed.
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn delete_waits_through_deleting() {
    let h = harness();
    h.api.push_states(
        &demo_cluster(ClusterState::Deleting),
        &[ClusterState::Deleting, ClusterState::Deleting],
    );

    let mut state = existing(spec());
    h.clusters.delete(&mut state).await.unwrap();

    assert_eq!(state.id, None);
    assert_eq!(h.api.call_count("ClustersGet"), 3);
    assert_eq!(h.api.calls()[0], "ClustersIdDelete");
}

#[tokio::test(start_paused = true)]
async fn delete_failure_keeps_identifier() {
    let h = harness();
    h.api.push_list(ListStep::Status(500));
    h.api.push_list(ListStep::Status(500));
    h.api.push_list(ListStep::Status(500));

    let mut state = existing(spec());
    let err = h.clusters.delete(&mut state).await.unwrap_err();

    assert!(matches!(err, ResourceError::RetryLimitExceeded { attempts: 3, .. }));
    assert_eq!(state.id, Some(ClusterId::new(CLUSTER_ID)));
}

#[tokio::test(start_paused = true)]
async fn delete_timeout_keeps_identifier() {
    let h = harness_with(Timeouts {
        delete_minutes: 1,
        ..Timeouts::default()
    });
    h.api.push_states(
        &demo_cluster(ClusterState::Deleting),
        &vec![ClusterState::Deleting; 20],
    );

    let mut state = existing(spec());
    let err = h.clusters.delete(&mut state).await.unwrap_err();

    assert!(err.is_retriable());
    assert!(matches!(
        err,
        ResourceError::Timeout {
            operation: "cluster delete",
            ..
        }
    ));
    assert_eq!(state.id, Some(ClusterId::new(CLUSTER_ID)));
}

#[tokio::test(start_paused = true)]
async fn delete_rejected_by_api_keeps_identifier() {
    let h = harness();
    h.api.fail_next("ClustersIdDelete", 409);

    let mut state = existing(spec());
    let err = h.clusters.delete(&mut state).await.unwrap_err();

    assert_eq!(err.http_status(), Some(409));
    assert_eq!(state.id, Some(ClusterId::new(CLUSTER_ID)));
    assert_eq!(h.api.call_count("ClustersGet"), 0);
}
