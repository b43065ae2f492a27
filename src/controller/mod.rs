//! Controllers for LeaderWorkerSet child resources
//!
//! [`hpa`] holds the convergence engine and its storage seam; [`lws`] wires it
//! into the `kube` controller runtime.

mod hpa;
mod lws;
#[cfg(test)]
pub(crate) mod testing;

pub use hpa::{reconcile_hpa, HpaAction, HpaClient, HpaClientImpl};
pub use lws::{error_policy, reconcile, Context};
