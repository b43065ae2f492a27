//! Shared setup for cluster tests

use std::time::Duration;

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, DeleteParams, Patch, PatchParams};
use kube::{Client, CustomResourceExt};

use lws_operator::crd::LeaderWorkerSet;

/// Field manager used for test writes
pub const TEST_FIELD_MANAGER: &str = "lws-operator-test";

/// Connect to the cluster and make sure the CRD is installed
pub async fn ensure_test_cluster() -> Client {
    let client = Client::try_default()
        .await
        .expect("kubeconfig should point at a test cluster");

    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let crd = LeaderWorkerSet::crd();
    let name = crd.metadata.name.clone().expect("CRD has a name");
    crds.patch(
        &name,
        &PatchParams::apply(TEST_FIELD_MANAGER).force(),
        &Patch::Apply(&crd),
    )
    .await
    .expect("CRD should install");

    // Wait for the CRD to be served
    let lws: Api<LeaderWorkerSet> = Api::all(client.clone());
    for _ in 0..30 {
        if lws.list(&Default::default()).await.is_ok() {
            return client;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    panic!("LeaderWorkerSet CRD was not established in time");
}

/// Create a fresh namespace for one test
pub async fn create_namespace(client: &Client, name: &str) {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let ns = serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": { "name": name }
    });
    namespaces
        .patch(name, &PatchParams::apply(TEST_FIELD_MANAGER), &Patch::Apply(&ns))
        .await
        .expect("namespace should be created");
}

/// Delete a test namespace, ignoring errors
pub async fn delete_namespace(client: &Client, name: &str) {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let _ = namespaces.delete(name, &DeleteParams::default()).await;
}
