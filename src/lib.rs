//! LWS Operator - keeps LeaderWorkerSet autoscalers in sync with their scale policy
//!
//! A LeaderWorkerSet that declares a scale policy with metrics gets exactly one
//! HorizontalPodAutoscaler with the same name and namespace, targeting the
//! LeaderWorkerSet's scale subresource and owned by it.
//!
//! # Modules
//!
//! - [`crd`] - LeaderWorkerSet Custom Resource Definition
//! - [`hpa`] - Desired HPA construction, owner references and semantic equality
//! - [`controller`] - Convergence engine and controller runtime wiring
//! - [`apply`] - Server-side apply configuration for LeaderWorkerSet
//! - [`config`] - Operator configuration (CLI flags and environment)
//! - [`telemetry`] - Logging initialization
//! - [`error`] - Error types for the operator

#![deny(missing_docs)]

pub mod apply;
pub mod config;
pub mod controller;
pub mod crd;
pub mod error;
pub mod hpa;
pub mod telemetry;

pub use error::{Error, ErrorKind};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default field manager for writes made by the operator
pub const DEFAULT_FIELD_MANAGER: &str = "lws-operator";
