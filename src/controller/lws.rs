//! LeaderWorkerSet controller
//!
//! Thin runtime wrapper around [`reconcile_hpa`]: it validates the parent,
//! runs one convergence pass and maps errors to requeue delays.

use std::sync::Arc;

use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::hpa::{reconcile_hpa, HpaAction, HpaClient, HpaClientImpl};
use crate::config::{OperatorConfig, RequeuePolicy};
use crate::crd::LeaderWorkerSet;
use crate::hpa::TypeDescriptor;
use crate::{Error, ErrorKind};

/// Controller context shared by every reconciliation
pub struct Context {
    /// HPA storage (trait object for testability)
    pub hpa: Arc<dyn HpaClient>,
    /// Type of the parent resource, used for owner references
    pub descriptor: TypeDescriptor,
    /// Process-wide cancellation, triggered on shutdown
    pub cancel: CancellationToken,
    /// Requeue delays for failed passes
    pub requeue: RequeuePolicy,
}

impl Context {
    /// Create a new controller context with the given Kubernetes client
    pub fn new(client: Client, config: &OperatorConfig, cancel: CancellationToken) -> Self {
        Self {
            hpa: Arc::new(HpaClientImpl::new(client, config.field_manager.clone())),
            descriptor: TypeDescriptor::of::<LeaderWorkerSet>(),
            cancel,
            requeue: config.requeue_policy(),
        }
    }

    /// Create a context with a custom HPA client for testing
    #[cfg(test)]
    pub fn for_testing(hpa: Arc<dyn HpaClient>) -> Self {
        Self {
            hpa,
            descriptor: TypeDescriptor::of::<LeaderWorkerSet>(),
            cancel: CancellationToken::new(),
            requeue: RequeuePolicy::default(),
        }
    }
}

/// Reconcile a LeaderWorkerSet's HorizontalPodAutoscaler
///
/// Successful passes wait for the next change to the LeaderWorkerSet or its
/// HPA; the controller watches both.
#[instrument(
    skip(lws, ctx),
    fields(lws = %lws.name_any(), namespace = %lws.namespace().unwrap_or_default())
)]
pub async fn reconcile(lws: Arc<LeaderWorkerSet>, ctx: Arc<Context>) -> Result<Action, Error> {
    if lws.metadata.deletion_timestamp.is_some() {
        debug!("LeaderWorkerSet is being deleted, HPA is garbage collected with it");
        return Ok(Action::await_change());
    }

    if let Err(e) = lws.spec.validate() {
        warn!(error = %e, "LeaderWorkerSet validation failed");
        return Err(e);
    }

    let action = reconcile_hpa(&lws, &ctx.descriptor, ctx.hpa.as_ref(), &ctx.cancel).await?;
    match action {
        HpaAction::Created | HpaAction::Updated => info!(%action, "reconciled HPA"),
        HpaAction::Skipped | HpaAction::Unchanged => debug!(%action, "HPA up to date"),
    }

    Ok(Action::await_change())
}

/// Error policy for the controller
///
/// Conflicts requeue quickly for a fresh read, transient failures back off,
/// and errors that need a spec or cluster change requeue slowly.
pub fn error_policy(lws: Arc<LeaderWorkerSet>, error: &Error, ctx: Arc<Context>) -> Action {
    let kind = error.kind();
    error!(
        ?error,
        ?kind,
        lws = %lws.name_any(),
        namespace = %lws.namespace().unwrap_or_default(),
        "reconciliation failed"
    );

    match kind {
        ErrorKind::Cancelled => Action::await_change(),
        _ if !error.is_retryable() => Action::requeue(ctx.requeue.permanent),
        ErrorKind::Conflict => Action::requeue(ctx.requeue.conflict),
        _ => Action::requeue(ctx.requeue.transient),
    }
}
