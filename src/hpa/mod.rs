//! Desired HorizontalPodAutoscaler for a LeaderWorkerSet
//!
//! Pure construction, no I/O. The HPA shares the parent's name and namespace,
//! targets the parent through its scale subresource, and carries a controller
//! owner reference so the garbage collector removes it with the parent.

mod owner;
pub mod semantic;

use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::crd::{LeaderWorkerSet, ScalePolicy};
use crate::Error;

pub use owner::{
    controller_of, controller_owner_reference, is_controlled_by, TypeDescriptor,
};
pub(crate) use owner::object_key;

/// Kind of the derived object, used in errors and logs
pub const HPA_KIND: &str = "HorizontalPodAutoscaler";

/// Build the HPA that `policy` asks for on behalf of `lws`
///
/// `policy` is the parent's requested scale policy; callers gate on
/// [`crate::crd::LeaderWorkerSetSpec::requested_scale_policy`] first.
/// `minReplicas` is passed through unset when unset, and metrics keep their
/// declared order.
pub fn build_desired_hpa(
    lws: &LeaderWorkerSet,
    policy: &ScalePolicy,
    descriptor: &TypeDescriptor,
) -> Result<HorizontalPodAutoscaler, Error> {
    let owner = controller_owner_reference(descriptor, &lws.metadata)?;
    let namespace = lws
        .metadata
        .namespace
        .clone()
        .ok_or_else(|| Error::ownership(object_key(&lws.metadata), "parent has no namespace"))?;

    Ok(HorizontalPodAutoscaler {
        metadata: ObjectMeta {
            name: Some(owner.name.clone()),
            namespace: Some(namespace),
            owner_references: Some(vec![owner.clone()]),
            ..Default::default()
        },
        spec: Some(HorizontalPodAutoscalerSpec {
            scale_target_ref: CrossVersionObjectReference {
                api_version: Some(owner.api_version),
                kind: owner.kind,
                name: owner.name,
            },
            min_replicas: policy.min_replicas,
            max_replicas: policy.max_replicas,
            metrics: policy.metrics.clone(),
            behavior: None,
        }),
        status: None,
    })
}
