//! LeaderWorkerSet Custom Resource Definition
//!
//! A LeaderWorkerSet runs groups of pods (one leader, N workers) as a unit.
//! Only the fields this operator acts on are modelled here: replica count,
//! startup policy and the optional scale policy that drives the derived
//! HorizontalPodAutoscaler.

use k8s_openapi::api::autoscaling::v2::MetricSpec;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Specification for a LeaderWorkerSet
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "leaderworkerset.x-k8s.io",
    version = "v1",
    kind = "LeaderWorkerSet",
    plural = "leaderworkersets",
    shortname = "lws",
    namespaced,
    status = "LeaderWorkerSetStatus",
    scale = r#"{"specReplicasPath":".spec.replicas","statusReplicasPath":".status.replicas","labelSelectorPath":".status.hpaPodSelector"}"#,
    printcolumn = r#"{"name":"Replicas","type":"integer","jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Ready","type":"integer","jsonPath":".status.readyReplicas"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct LeaderWorkerSetSpec {
    /// Number of leader/worker groups
    #[serde(default = "default_replicas")]
    pub replicas: i32,

    /// When worker pods are created relative to the leader
    #[serde(default)]
    pub startup_policy: StartupPolicy,

    /// Autoscaling policy; when set with metrics, an HPA targets this LeaderWorkerSet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_policy: Option<ScalePolicy>,
}

fn default_replicas() -> i32 {
    1
}

impl Default for LeaderWorkerSetSpec {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            startup_policy: StartupPolicy::default(),
            scale_policy: None,
        }
    }
}

impl LeaderWorkerSetSpec {
    /// The scale policy, only if it requests at least one metric
    ///
    /// A policy without metrics is treated the same as no policy: nothing is
    /// derived from it.
    pub fn requested_scale_policy(&self) -> Option<&ScalePolicy> {
        self.scale_policy.as_ref().filter(|p| p.has_metrics())
    }

    /// Validate the LeaderWorkerSet specification
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.replicas < 0 {
            return Err(crate::Error::invalid_argument(format!(
                "replicas must be non-negative, got {}",
                self.replicas
            )));
        }
        if let Some(ref policy) = self.scale_policy {
            policy.validate()?;
        }
        Ok(())
    }
}

/// When workers start relative to their leader
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum StartupPolicy {
    /// Workers are created as soon as the leader pod exists
    #[default]
    LeaderCreated,
    /// Workers are created once the leader pod is ready
    LeaderReady,
}

impl std::fmt::Display for StartupPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LeaderCreated => write!(f, "LeaderCreated"),
            Self::LeaderReady => write!(f, "LeaderReady"),
        }
    }
}

/// Autoscaling policy for a LeaderWorkerSet
///
/// Copied into the derived HorizontalPodAutoscaler. Metric order is kept as
/// declared because the autoscaler evaluates them in order.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScalePolicy {
    /// Lower bound on replicas; left unset so the API server default applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i32>,

    /// Upper bound on replicas
    pub max_replicas: i32,

    /// Metrics passed through verbatim to the HPA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "metrics_schema")]
    pub metrics: Option<Vec<MetricSpec>>,
}

impl ScalePolicy {
    /// Whether at least one metric is declared
    pub fn has_metrics(&self) -> bool {
        self.metrics.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Validate replica bounds
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_replicas < 1 {
            return Err(crate::Error::invalid_argument(format!(
                "scalePolicy.maxReplicas must be at least 1, got {}",
                self.max_replicas
            )));
        }
        // minReplicas 0 is valid with HPAScaleToZero; the API server decides
        if let Some(min) = self.min_replicas {
            if min > self.max_replicas {
                return Err(crate::Error::invalid_argument(format!(
                    "scalePolicy.minReplicas ({}) cannot exceed maxReplicas ({})",
                    min, self.max_replicas
                )));
            }
        }
        Ok(())
    }
}

/// Schema for `scalePolicy.metrics`: a list of opaque objects
///
/// `MetricSpec` is owned by the autoscaling API, so the CRD only asserts the
/// list shape and leaves field validation to the HPA endpoint.
fn metrics_schema(_: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
    use schemars::schema::{ArrayValidation, InstanceType, Schema, SchemaObject, SingleOrVec};

    let item = SchemaObject {
        instance_type: Some(InstanceType::Object.into()),
        extensions: [(
            "x-kubernetes-preserve-unknown-fields".to_string(),
            serde_json::Value::Bool(true),
        )]
        .into_iter()
        .collect(),
        ..Default::default()
    };

    Schema::Object(SchemaObject {
        instance_type: Some(InstanceType::Array.into()),
        array: Some(Box::new(ArrayValidation {
            items: Some(SingleOrVec::Single(Box::new(Schema::Object(item)))),
            ..Default::default()
        })),
        ..Default::default()
    })
}

/// Status for a LeaderWorkerSet
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderWorkerSetStatus {
    /// Number of groups created
    #[serde(default)]
    pub replicas: i32,

    /// Number of groups whose pods are all ready
    #[serde(default)]
    pub ready_replicas: i32,

    /// Number of groups running the latest template
    #[serde(default)]
    pub updated_replicas: i32,

    /// Label selector the HPA uses to find leader pods (scale subresource)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hpa_pod_selector: Option<String>,
}
