//! Custom Resource Definitions for the LWS operator

mod leaderworkerset;

use kube::CustomResourceExt;

use crate::Error;

pub use leaderworkerset::{
    LeaderWorkerSet, LeaderWorkerSetSpec, LeaderWorkerSetStatus, ScalePolicy, StartupPolicy,
};

/// Render the LeaderWorkerSet CRD as YAML
pub fn crd_yaml() -> Result<String, Error> {
    serde_yaml::to_string(&LeaderWorkerSet::crd())
        .map_err(|e| Error::serialization(format!("LeaderWorkerSet CRD: {}", e)))
}
