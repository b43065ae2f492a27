//! Operator configuration
//!
//! Every setting is a CLI flag with an environment variable fallback so the
//! same binary runs unchanged under a Deployment.

use std::time::Duration;

use clap::Args;

use crate::telemetry::LogFormat;
use crate::{Error, DEFAULT_FIELD_MANAGER};

/// Runtime configuration for the controller
#[derive(Args, Debug, Clone)]
pub struct OperatorConfig {
    /// Field manager recorded on every HPA write
    #[arg(long, env = "LWS_FIELD_MANAGER", default_value = DEFAULT_FIELD_MANAGER)]
    pub field_manager: String,

    /// Only watch LeaderWorkerSets in this namespace (all namespaces if unset)
    #[arg(long, env = "LWS_WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,

    /// Log output format
    #[arg(long, env = "LWS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Requeue delay after an optimistic concurrency conflict, in seconds
    #[arg(long, env = "LWS_CONFLICT_REQUEUE_SECS", default_value_t = 1)]
    pub conflict_requeue_secs: u64,

    /// Requeue delay after a transient API error, in seconds
    #[arg(long, env = "LWS_ERROR_REQUEUE_SECS", default_value_t = 30)]
    pub error_requeue_secs: u64,

    /// Requeue delay after an error that needs a spec or cluster change, in seconds
    #[arg(long, env = "LWS_PERMANENT_ERROR_REQUEUE_SECS", default_value_t = 300)]
    pub permanent_error_requeue_secs: u64,

    /// Server-side timeout for watch requests, in seconds
    #[arg(long, env = "LWS_WATCH_TIMEOUT_SECS", default_value_t = 25)]
    pub watch_timeout_secs: u32,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            watch_namespace: None,
            log_format: LogFormat::Json,
            conflict_requeue_secs: 1,
            error_requeue_secs: 30,
            permanent_error_requeue_secs: 300,
            watch_timeout_secs: 25,
        }
    }
}

impl OperatorConfig {
    /// Check the configuration before the controller starts
    pub fn validate(&self) -> Result<(), Error> {
        if self.field_manager.trim().is_empty() {
            return Err(Error::invalid_argument("field manager cannot be empty"));
        }
        if self.watch_namespace.as_deref().is_some_and(str::is_empty) {
            return Err(Error::invalid_argument("watch namespace cannot be empty"));
        }
        for (name, secs) in [
            ("conflict requeue interval", self.conflict_requeue_secs),
            ("error requeue interval", self.error_requeue_secs),
            ("permanent error requeue interval", self.permanent_error_requeue_secs),
        ] {
            if secs == 0 {
                return Err(Error::invalid_argument(format!("{} must be positive", name)));
            }
        }
        // The API server caps watch timeouts below five minutes
        if self.watch_timeout_secs == 0 || self.watch_timeout_secs >= 295 {
            return Err(Error::invalid_argument(
                "watch timeout must be between 1 and 294 seconds",
            ));
        }
        Ok(())
    }

    /// Requeue delays derived from this configuration
    pub fn requeue_policy(&self) -> RequeuePolicy {
        RequeuePolicy {
            conflict: Duration::from_secs(self.conflict_requeue_secs),
            transient: Duration::from_secs(self.error_requeue_secs),
            permanent: Duration::from_secs(self.permanent_error_requeue_secs),
        }
    }
}

/// How long to wait before re-running a failed reconciliation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequeuePolicy {
    /// After a conflict; a fresh read usually succeeds right away
    pub conflict: Duration,
    /// After network or server errors
    pub transient: Duration,
    /// After build, validation or ownership errors
    pub permanent: Duration,
}

impl Default for RequeuePolicy {
    fn default() -> Self {
        OperatorConfig::default().requeue_policy()
    }
}
