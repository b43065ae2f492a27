//! Error types for the LeaderWorkerSet operator
//!
//! Errors are grouped into kinds so the controller runtime can pick a requeue
//! strategy without string matching: conflicts warrant a fresh read, transient
//! API failures warrant backoff, and build/validation failures need a spec or
//! environment change before another attempt can succeed.

use thiserror::Error;

/// Placeholder used in messages when an object has no name
pub const UNKNOWN_OBJECT: &str = "unknown";

/// Main error type for operator operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error that is not a conflict or a rejection
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Owner reference for a derived object could not be computed
    #[error("cannot encode owner reference for {parent}: {message}")]
    OwnershipEncoding {
        /// Parent object (`namespace/name`, or `unknown`)
        parent: String,
        /// What was missing
        message: String,
    },

    /// An object exists at the derived key but is controlled by someone else
    #[error("{kind} {namespace}/{name} exists and is not controlled by this LeaderWorkerSet")]
    NotOwned {
        /// Kind of the existing object
        kind: String,
        /// Namespace of the existing object
        namespace: String,
        /// Name of the existing object
        name: String,
    },

    /// Optimistic concurrency conflict (stale resourceVersion or already exists)
    #[error("conflict on {kind} {namespace}/{name}: {message}")]
    Conflict {
        /// Kind of the object being written
        kind: String,
        /// Namespace of the object being written
        namespace: String,
        /// Name of the object being written
        name: String,
        /// Message returned by the API server
        message: String,
    },

    /// The API server rejected the object as invalid
    #[error("{kind} {namespace}/{name} rejected: {message}")]
    Rejected {
        /// Kind of the object being written
        kind: String,
        /// Namespace of the object being written
        namespace: String,
        /// Name of the object being written
        name: String,
        /// Message returned by the API server
        message: String,
    },

    /// The API server refused the request (401/403), usually missing RBAC
    #[error("not permitted to access {kind} {namespace}/{name}: {message}")]
    Forbidden {
        /// Kind of the object being accessed
        kind: String,
        /// Namespace of the object being accessed
        namespace: String,
        /// Name of the object being accessed
        name: String,
        /// Message returned by the API server
        message: String,
    },

    /// The reconciliation pass was cancelled by the caller
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// A builder or configuration value was invalid
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of an [`Error`] for the caller's retry decisions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Desired state could not be built (missing type metadata, uid, ...)
    Build,
    /// Concurrent writer or foreign owner; re-read before trying again
    Conflict,
    /// Storage rejected the payload; retrying the same payload will fail
    Validation,
    /// Network, timeout or server availability problem
    Transient,
    /// Credentials or RBAC do not allow the call
    Permission,
    /// Caller cancelled the pass
    Cancelled,
    /// Programming or configuration error
    InvalidArgument,
    /// Encoding failure outside the reconcile path
    Internal,
}

impl Error {
    /// Create an ownership-encoding error for the given parent
    pub fn ownership(parent: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::OwnershipEncoding {
            parent: parent.into(),
            message: msg.into(),
        }
    }

    /// Create an invalid-argument error with the given message
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a cancellation error naming the interrupted operation
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled(operation.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Map a kube error from a read of `kind namespace/name` into the taxonomy
    ///
    /// 401/403 become [`Error::Forbidden`]; everything else is passed through
    /// unchanged as [`Error::Kube`].
    pub fn from_read(err: kube::Error, kind: &str, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 401 || ae.code == 403 => Self::Forbidden {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: ae.message,
            },
            other => Self::Kube(other),
        }
    }

    /// Map a kube error from a write against `kind namespace/name` into the taxonomy
    ///
    /// 409 becomes [`Error::Conflict`], 400/422 become [`Error::Rejected`],
    /// 401/403 become [`Error::Forbidden`], and everything else is passed
    /// through unchanged as [`Error::Kube`].
    pub fn from_write(err: kube::Error, kind: &str, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 409 => Self::Conflict {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: ae.message,
            },
            kube::Error::Api(ae) if ae.code == 400 || ae.code == 422 => Self::Rejected {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: ae.message,
            },
            other => Self::from_read(other, kind, namespace, name),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Kube(_) => ErrorKind::Transient,
            Self::OwnershipEncoding { .. } => ErrorKind::Build,
            Self::NotOwned { .. } | Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Rejected { .. } => ErrorKind::Validation,
            Self::Forbidden { .. } => ErrorKind::Permission,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Whether re-running the whole pass can succeed without outside intervention
    ///
    /// `NotOwned` is a conflict kind but needs someone to remove or release the
    /// foreign object first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Kube(_) | Self::Conflict { .. })
    }
}
