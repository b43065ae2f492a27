//! Owner reference encoding
//!
//! Owner references are computed from an explicit [`TypeDescriptor`] plus the
//! parent's metadata, so nothing depends on a process-wide type registry.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::TypeMeta;
use kube::Resource;

use crate::Error;

/// API version and kind of a parent object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Group/version, e.g. `leaderworkerset.x-k8s.io/v1`
    pub api_version: String,
    /// Kind, e.g. `LeaderWorkerSet`
    pub kind: String,
}

impl TypeDescriptor {
    /// Create a descriptor from explicit values
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// Resolve the descriptor of a statically typed resource
    pub fn of<K>() -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        Self {
            api_version: K::api_version(&()).into_owned(),
            kind: K::kind(&()).into_owned(),
        }
    }

    /// Resolve the descriptor from an object's `TypeMeta`
    pub fn from_type_meta(types: &TypeMeta) -> Self {
        Self {
            api_version: types.api_version.clone(),
            kind: types.kind.clone(),
        }
    }
}

/// Human-readable `namespace/name` for error messages
pub(crate) fn object_key(meta: &ObjectMeta) -> String {
    match (meta.namespace.as_deref(), meta.name.as_deref()) {
        (Some(ns), Some(name)) => format!("{}/{}", ns, name),
        (None, Some(name)) => name.to_string(),
        _ => crate::error::UNKNOWN_OBJECT.to_string(),
    }
}

/// Build the controller owner reference pointing at `parent`
///
/// Fails when the descriptor is incomplete or the parent has no name or uid;
/// neither is fixed by retrying the same object.
pub fn controller_owner_reference(
    descriptor: &TypeDescriptor,
    parent: &ObjectMeta,
) -> Result<OwnerReference, Error> {
    let key = object_key(parent);

    if descriptor.api_version.is_empty() {
        return Err(Error::ownership(key, "parent type has no apiVersion"));
    }
    if descriptor.kind.is_empty() {
        return Err(Error::ownership(key, "parent type has no kind"));
    }
    let name = parent
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::ownership(key.clone(), "parent has no name"))?;
    let uid = parent
        .uid
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::ownership(key.clone(), "parent has no uid"))?;

    Ok(OwnerReference {
        api_version: descriptor.api_version.clone(),
        kind: descriptor.kind.clone(),
        name: name.to_string(),
        uid: uid.to_string(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

/// The controller owner reference of an object, if any
pub fn controller_of(meta: &ObjectMeta) -> Option<&OwnerReference> {
    meta.owner_references
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|r| r.controller == Some(true))
}

/// Whether `meta` is controlled by the object with the given uid
pub fn is_controlled_by(meta: &ObjectMeta, owner_uid: &str) -> bool {
    controller_of(meta).is_some_and(|r| r.uid == owner_uid)
}
