//! Error types for teleingest.
//!
//! Error messages follow one format throughout the crate: all lowercase,
//! `"<operation> failed: <reason>"` for failures and
//! `"<entity> not found: <identifier>"` for missing resources, always
//! including the identifier (workload, container, mount point) when one is
//! available.

use std::path::PathBuf;
use thiserror::Error;

/// Classification attached to session errors, used to map onto RPC status
/// codes and HTTP responses without string matching on error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    /// No ingest (or container) exists for the given identifier.
    NotFound,
    /// A mount point or mount port is already claimed by a live intercept
    /// or ingest.
    AlreadyExists,
    /// The workload's agent reports no containers that can be ingested.
    Unavailable,
    /// The operation raced with a session disconnect. Benign when observed
    /// while leaving an ingest.
    Canceled,
    /// Client-side flag or validation failure. Never produced by the
    /// session manager.
    User,
    /// Anything else.
    #[default]
    Other,
}

/// Result type alias using teleingest's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in teleingest operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Session operation failed with a status classification.
    ///
    /// This is the variant the session manager produces: the `kind` carries
    /// the RPC status, the message carries the human-readable detail.
    #[error("{message}")]
    Session {
        /// Status classification.
        kind: ErrorKind,
        /// Full error message, already formatted.
        message: String,
    },

    /// Agent resolution failed.
    #[error("agent resolution failed for workload {workload}: {reason}")]
    AgentResolve {
        /// Workload whose agent could not be resolved.
        workload: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Pod access (mount / port-forward) could not be established.
    #[error("pod access failed: {operation}: {reason}")]
    PodAccess {
        /// The operation that failed (e.g. "initial start").
        operation: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Configuration operation failed.
    #[error("config operation failed: {operation}: {reason}")]
    Config {
        /// The operation that failed (e.g. "load", "parse").
        operation: String,
        /// The reason for the failure.
        reason: String,
    },

    /// A local handler process could not be started.
    ///
    /// Tagged separately so the presentation layer never attributes the
    /// failure to the remote daemon.
    #[error("handler start failed: {0}")]
    HandlerStart(String),

    /// Environment file could not be written.
    #[error("environment file write failed: {}: {reason}", path.display())]
    EnvWrite {
        /// Target path.
        path: PathBuf,
        /// The reason for the failure.
        reason: String,
    },

    /// Mount point preparation failed.
    #[error("mount point preparation failed: {reason}")]
    MountPrepare {
        /// The reason for the failure.
        reason: String,
    },

    /// IO error wrapper.
    #[error("io operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a `NotFound` session error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Session {
            kind: ErrorKind::NotFound,
            message: message.into(),
        }
    }

    /// Create an `AlreadyExists` session error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::Session {
            kind: ErrorKind::AlreadyExists,
            message: message.into(),
        }
    }

    /// Create an `Unavailable` session error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Session {
            kind: ErrorKind::Unavailable,
            message: message.into(),
        }
    }

    /// Create a `Canceled` session error.
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::Session {
            kind: ErrorKind::Canceled,
            message: message.into(),
        }
    }

    /// Create a `User` error for client-side validation failures.
    pub fn user(message: impl Into<String>) -> Self {
        Self::Session {
            kind: ErrorKind::User,
            message: message.into(),
        }
    }

    /// Create an agent resolution error.
    pub fn agent_resolve(workload: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AgentResolve {
            workload: workload.into(),
            reason: reason.into(),
        }
    }

    /// Create a pod access error.
    pub fn pod_access(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PodAccess {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a config operation error.
    pub fn config(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a mount point preparation error.
    pub fn mount_prepare(reason: impl Into<String>) -> Self {
        Self::MountPrepare {
            reason: reason.into(),
        }
    }

    /// The status classification of this error.
    ///
    /// Session errors carry their kind explicitly; everything else maps to
    /// `Other` except handler-start failures, which are user-facing.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Session { kind, .. } => *kind,
            Self::HandlerStart(_) => ErrorKind::User,
            _ => ErrorKind::Other,
        }
    }

    /// True when this error only reports a benign cancellation.
    pub fn is_canceled(&self) -> bool {
        self.kind() == ErrorKind::Canceled
    }
}
