//! Stories about HPA convergence against a real API server

use k8s_openapi::api::autoscaling::v2::{
    HorizontalPodAutoscaler, MetricSpec, MetricTarget, ResourceMetricSource,
};
use kube::api::{Api, ApiResource, DynamicObject, PostParams};
use kube::Client;
use tokio_util::sync::CancellationToken;

use lws_operator::controller::{reconcile_hpa, HpaAction, HpaClientImpl};
use lws_operator::crd::{LeaderWorkerSet, LeaderWorkerSetSpec, ScalePolicy};
use lws_operator::hpa::TypeDescriptor;

use super::helpers::{create_namespace, delete_namespace, ensure_test_cluster, TEST_FIELD_MANAGER};

// =============================================================================
// Test Fixtures
// =============================================================================

fn cpu_metric() -> MetricSpec {
    MetricSpec {
        type_: "Resource".to_string(),
        resource: Some(ResourceMetricSource {
            name: "cpu".to_string(),
            target: MetricTarget {
                type_: "Utilization".to_string(),
                average_utilization: Some(80),
                ..Default::default()
            },
        }),
        ..Default::default()
    }
}

fn sample_lws(name: &str, max_replicas: i32) -> LeaderWorkerSet {
    LeaderWorkerSet::new(
        name,
        LeaderWorkerSetSpec {
            replicas: 1,
            scale_policy: Some(ScalePolicy {
                min_replicas: None,
                max_replicas,
                metrics: Some(vec![cpu_metric()]),
            }),
            ..Default::default()
        },
    )
}

async fn create_lws(client: &Client, namespace: &str, lws: &LeaderWorkerSet) -> LeaderWorkerSet {
    let api: Api<LeaderWorkerSet> = Api::namespaced(client.clone(), namespace);
    api.create(&PostParams::default(), lws)
        .await
        .expect("LeaderWorkerSet should be created")
}

// =============================================================================
// Stories
// =============================================================================

/// Story: turning on autoscaling creates an HPA, and nothing more happens
/// until the policy changes
#[tokio::test]
#[ignore]
async fn story_autoscaling_policy_drives_hpa() {
    let client = ensure_test_cluster().await;
    let namespace = "lws-hpa-story";
    create_namespace(&client, namespace).await;

    let hpa_client = HpaClientImpl::new(client.clone(), TEST_FIELD_MANAGER);
    let descriptor = TypeDescriptor::of::<LeaderWorkerSet>();
    let cancel = CancellationToken::new();

    let stored = create_lws(&client, namespace, &sample_lws("inference", 5)).await;

    // A parent read through the dynamic API resolves to the same descriptor
    let dynamic: Api<DynamicObject> = Api::namespaced_with(
        client.clone(),
        namespace,
        &ApiResource::erase::<LeaderWorkerSet>(&()),
    );
    let untyped = dynamic.get("inference").await.expect("LWS readable");
    let types = untyped.types.as_ref().expect("dynamic object has type meta");
    assert_eq!(TypeDescriptor::from_type_meta(types), descriptor);

    let action = reconcile_hpa(&stored, &descriptor, &hpa_client, &cancel)
        .await
        .expect("first pass succeeds");
    assert_eq!(action, HpaAction::Created);

    // The server defaults minReplicas; that must not look like drift
    let action = reconcile_hpa(&stored, &descriptor, &hpa_client, &cancel)
        .await
        .expect("second pass succeeds");
    assert_eq!(action, HpaAction::Unchanged);

    let mut raised = stored.clone();
    if let Some(policy) = raised.spec.scale_policy.as_mut() {
        policy.max_replicas = 8;
    }
    let action = reconcile_hpa(&raised, &descriptor, &hpa_client, &cancel)
        .await
        .expect("update pass succeeds");
    assert_eq!(action, HpaAction::Updated);

    let hpas: Api<HorizontalPodAutoscaler> = Api::namespaced(client.clone(), namespace);
    let hpa = hpas.get("inference").await.expect("HPA exists");
    assert_eq!(hpa.spec.expect("HPA has spec").max_replicas, 8);
    let owner = &hpa.metadata.owner_references.expect("HPA is owned")[0];
    assert_eq!(owner.kind, "LeaderWorkerSet");
    assert_eq!(Some(owner.uid.clone()), stored.metadata.uid);

    delete_namespace(&client, namespace).await;
}

/// Story: a LeaderWorkerSet without a policy never touches an existing HPA
#[tokio::test]
#[ignore]
async fn story_no_policy_leaves_cluster_untouched() {
    let client = ensure_test_cluster().await;
    let namespace = "lws-hpa-skip";
    create_namespace(&client, namespace).await;

    let mut lws = sample_lws("batch", 3);
    lws.spec.scale_policy = None;
    let stored = create_lws(&client, namespace, &lws).await;

    let hpa_client = HpaClientImpl::new(client.clone(), TEST_FIELD_MANAGER);
    let action = reconcile_hpa(
        &stored,
        &TypeDescriptor::of::<LeaderWorkerSet>(),
        &hpa_client,
        &CancellationToken::new(),
    )
    .await
    .expect("skip succeeds");
    assert_eq!(action, HpaAction::Skipped);

    let hpas: Api<HorizontalPodAutoscaler> = Api::namespaced(client.clone(), namespace);
    assert!(hpas.get_opt("batch").await.expect("list works").is_none());

    delete_namespace(&client, namespace).await;
}
