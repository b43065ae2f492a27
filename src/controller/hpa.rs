//! HorizontalPodAutoscaler convergence
//!
//! One pass: gate on the scale policy, build the desired HPA, read the current
//! one, then create, update or leave it alone. There is no retry, lock or
//! backoff here; the caller re-runs the whole pass on error. Concurrent
//! writers are arbitrated by the resourceVersion carried on update.

use std::future::Future;

use async_trait::async_trait;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use kube::api::{Api, PostParams};
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

use crate::crd::LeaderWorkerSet;
use crate::hpa::semantic::hpa_specs_equal;
use crate::hpa::{
    build_desired_hpa, controller_of, is_controlled_by, object_key, TypeDescriptor, HPA_KIND,
};
use crate::Error;

/// Storage operations on HorizontalPodAutoscalers
///
/// This trait allows mocking the Kubernetes client in tests while using
/// the real client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HpaClient: Send + Sync {
    /// Get an HPA by namespace and name, `None` if it does not exist
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<HorizontalPodAutoscaler>, Error>;

    /// Create an HPA
    ///
    /// An object that already exists surfaces as [`Error::Conflict`].
    async fn create(&self, hpa: &HorizontalPodAutoscaler) -> Result<HorizontalPodAutoscaler, Error>;

    /// Update an HPA
    ///
    /// `hpa.metadata.resource_version` must be the version read by the
    /// preceding get; a stale version surfaces as [`Error::Conflict`].
    async fn update(&self, hpa: &HorizontalPodAutoscaler) -> Result<HorizontalPodAutoscaler, Error>;
}

/// Real Kubernetes client implementation
pub struct HpaClientImpl {
    client: Client,
    field_manager: String,
}

impl HpaClientImpl {
    /// Create a new HpaClientImpl writing as `field_manager`
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        }
    }
}

/// Namespace and name of an object we are about to write
fn write_key(hpa: &HorizontalPodAutoscaler) -> Result<(&str, &str), Error> {
    let namespace = hpa
        .metadata
        .namespace
        .as_deref()
        .ok_or_else(|| Error::invalid_argument("HorizontalPodAutoscaler has no namespace"))?;
    let name = hpa
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| Error::invalid_argument("HorizontalPodAutoscaler has no name"))?;
    Ok((namespace, name))
}

#[async_trait]
impl HpaClient for HpaClientImpl {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<HorizontalPodAutoscaler>, Error> {
        let api: Api<HorizontalPodAutoscaler> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(hpa) => Ok(Some(hpa)),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
            Err(e) => Err(Error::from_read(e, HPA_KIND, namespace, name)),
        }
    }

    async fn create(
        &self,
        hpa: &HorizontalPodAutoscaler,
    ) -> Result<HorizontalPodAutoscaler, Error> {
        let (namespace, name) = write_key(hpa)?;
        let api: Api<HorizontalPodAutoscaler> = Api::namespaced(self.client.clone(), namespace);
        api.create(&self.post_params(), hpa)
            .await
            .map_err(|e| Error::from_write(e, HPA_KIND, namespace, name))
    }

    async fn update(
        &self,
        hpa: &HorizontalPodAutoscaler,
    ) -> Result<HorizontalPodAutoscaler, Error> {
        let (namespace, name) = write_key(hpa)?;
        let api: Api<HorizontalPodAutoscaler> = Api::namespaced(self.client.clone(), namespace);
        api.replace(name, &self.post_params(), hpa)
            .await
            .map_err(|e| Error::from_write(e, HPA_KIND, namespace, name))
    }
}

/// Outcome of one HPA reconciliation pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HpaAction {
    /// No scale policy with metrics; nothing was read or written
    Skipped,
    /// The HPA did not exist and was created
    Created,
    /// The HPA existed with a different spec and was replaced
    Updated,
    /// The HPA already matched; nothing was written
    Unchanged,
}

impl std::fmt::Display for HpaAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped => write!(f, "Skipped"),
            Self::Created => write!(f, "Created"),
            Self::Updated => write!(f, "Updated"),
            Self::Unchanged => write!(f, "Unchanged"),
        }
    }
}

/// Race a storage call against cancellation
async fn cancellable<T>(
    cancel: &CancellationToken,
    operation: &str,
    key: &str,
    call: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            Err(Error::cancelled(format!("{} {} {}", operation, HPA_KIND, key)))
        }
        result = call => result,
    }
}

/// Converge the HPA derived from `lws` towards its scale policy
///
/// Returns [`HpaAction::Skipped`] without touching storage when the parent has
/// no scale policy or no metrics. An existing HPA at the derived key that is not
/// controlled by `lws` is never modified ([`Error::NotOwned`]).
#[instrument(skip_all, fields(lws = %object_key(&lws.metadata)))]
pub async fn reconcile_hpa(
    lws: &LeaderWorkerSet,
    descriptor: &TypeDescriptor,
    client: &dyn HpaClient,
    cancel: &CancellationToken,
) -> Result<HpaAction, Error> {
    let Some(policy) = lws.spec.requested_scale_policy() else {
        debug!("no scale policy or metrics specified, skipping HPA reconciliation");
        return Ok(HpaAction::Skipped);
    };

    let mut desired = build_desired_hpa(lws, policy, descriptor)?;
    let (namespace, name) = {
        let (ns, n) = write_key(&desired)?;
        (ns.to_string(), n.to_string())
    };
    let key = format!("{}/{}", namespace, name);

    if cancel.is_cancelled() {
        return Err(Error::cancelled(format!("get {} {}", HPA_KIND, key)));
    }

    let current = cancellable(cancel, "get", &key, client.get(&namespace, &name)).await?;

    let Some(current) = current else {
        debug!(namespace = %namespace, name = %name, "creating HPA");
        cancellable(cancel, "create", &key, client.create(&desired)).await?;
        return Ok(HpaAction::Created);
    };

    let owner_uid = controller_of(&desired.metadata)
        .map(|r| r.uid.as_str())
        .unwrap_or_default();
    if !is_controlled_by(&current.metadata, owner_uid) {
        return Err(Error::NotOwned {
            kind: HPA_KIND.to_string(),
            namespace,
            name,
        });
    }

    let unchanged = match (desired.spec.as_ref(), current.spec.as_ref()) {
        (Some(d), Some(c)) => hpa_specs_equal(d, c),
        _ => false,
    };
    if unchanged {
        return Ok(HpaAction::Unchanged);
    }

    debug!(namespace = %namespace, name = %name, "updating HPA");
    desired.metadata.resource_version = current.metadata.resource_version.clone();
    cancellable(cancel, "update", &key, client.update(&desired)).await?;
    Ok(HpaAction::Updated)
}
