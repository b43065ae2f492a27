//! Server-side apply configuration for LeaderWorkerSet
//!
//! A partial LeaderWorkerSet: only fields that were set are serialized, so the
//! result can be sent as an apply patch that claims exactly those fields.
//!
//! ```
//! use lws_operator::apply::LeaderWorkerSetApplyConfiguration;
//!
//! let config = LeaderWorkerSetApplyConfiguration::new("svc", "ns")
//!     .with_labels([("app", "svc")])
//!     .with_finalizers(["example.com/cleanup"])
//!     .unwrap();
//! assert_eq!(config.name(), Some("svc"));
//! ```

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::{Patch, PatchParams};
use kube::Resource;
use serde::Serialize;

use crate::crd::{LeaderWorkerSet, LeaderWorkerSetSpec, LeaderWorkerSetStatus};
use crate::Error;

/// Partial LeaderWorkerSet for server-side apply
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderWorkerSetApplyConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ObjectMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec: Option<LeaderWorkerSetSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<LeaderWorkerSetStatus>,
}

impl LeaderWorkerSetApplyConfiguration {
    /// Start a configuration for the LeaderWorkerSet `namespace/name`
    ///
    /// Kind and apiVersion are filled in from the resource type.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::default()
            .with_kind(LeaderWorkerSet::kind(&()))
            .with_api_version(LeaderWorkerSet::api_version(&()))
            .with_name(name)
            .with_namespace(namespace)
    }

    /// Set the kind
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the apiVersion
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    fn meta(&mut self) -> &mut ObjectMeta {
        self.metadata.get_or_insert_with(ObjectMeta::default)
    }

    /// Set `metadata.name`
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.meta().name = Some(name.into());
        self
    }

    /// Set `metadata.generateName`
    pub fn with_generate_name(mut self, prefix: impl Into<String>) -> Self {
        self.meta().generate_name = Some(prefix.into());
        self
    }

    /// Set `metadata.namespace`
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.meta().namespace = Some(namespace.into());
        self
    }

    /// Set `metadata.uid`
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.meta().uid = Some(uid.into());
        self
    }

    /// Set `metadata.resourceVersion`
    pub fn with_resource_version(mut self, resource_version: impl Into<String>) -> Self {
        self.meta().resource_version = Some(resource_version.into());
        self
    }

    /// Set `metadata.generation`
    pub fn with_generation(mut self, generation: i64) -> Self {
        self.meta().generation = Some(generation);
        self
    }

    /// Merge entries into `metadata.labels`, overwriting existing keys
    pub fn with_labels<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let labels = self.meta().labels.get_or_insert_with(BTreeMap::new);
        labels.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Merge entries into `metadata.annotations`, overwriting existing keys
    pub fn with_annotations<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let annotations = self.meta().annotations.get_or_insert_with(BTreeMap::new);
        annotations.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Append to `metadata.ownerReferences`
    ///
    /// Every reference must name its apiVersion, kind, name and uid; nothing is
    /// appended if any of them is incomplete.
    pub fn with_owner_references(
        mut self,
        references: impl IntoIterator<Item = OwnerReference>,
    ) -> Result<Self, Error> {
        let references: Vec<OwnerReference> = references.into_iter().collect();
        for r in &references {
            let missing = [
                ("apiVersion", &r.api_version),
                ("kind", &r.kind),
                ("name", &r.name),
                ("uid", &r.uid),
            ]
            .into_iter()
            .find(|(_, value)| value.is_empty());
            if let Some((field, _)) = missing {
                return Err(Error::invalid_argument(format!(
                    "owner reference is missing {}",
                    field
                )));
            }
        }
        self.meta()
            .owner_references
            .get_or_insert_with(Vec::new)
            .extend(references);
        Ok(self)
    }

    /// Append to `metadata.finalizers`
    ///
    /// Nothing is appended if any finalizer is empty.
    pub fn with_finalizers<S: Into<String>>(
        mut self,
        finalizers: impl IntoIterator<Item = S>,
    ) -> Result<Self, Error> {
        let finalizers: Vec<String> = finalizers.into_iter().map(Into::into).collect();
        if finalizers.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::invalid_argument("finalizer cannot be empty"));
        }
        self.meta()
            .finalizers
            .get_or_insert_with(Vec::new)
            .extend(finalizers);
        Ok(self)
    }

    /// Set the spec
    pub fn with_spec(mut self, spec: LeaderWorkerSetSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: LeaderWorkerSetStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// `metadata.name`, if set
    pub fn name(&self) -> Option<&str> {
        self.metadata.as_ref()?.name.as_deref()
    }

    /// `metadata.namespace`, if set
    pub fn namespace(&self) -> Option<&str> {
        self.metadata.as_ref()?.namespace.as_deref()
    }

    /// Apply patch and params for `Api::patch`, owned by `field_manager`
    pub fn into_patch(self, field_manager: &str) -> (Patch<Self>, PatchParams) {
        (Patch::Apply(self), PatchParams::apply(field_manager))
    }
}
