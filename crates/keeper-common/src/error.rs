//! Unified error types for the Keeper workspace.
//!
//! Every crate returns [`KeeperError`] so that a failing change reaches the
//! orchestrator's caller verbatim, without re-wrapping at crate boundaries.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A permission or capability error.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Description of the denied operation.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// The call context's deadline passed before the operation ran.
    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded {
        /// Operation that observed the expired deadline.
        operation: &'static str,
    },

    /// The container runtime rejected an operation.
    #[error("runtime error: {message}")]
    Runtime {
        /// Description of the rejected operation.
        message: String,
    },

    /// The service registry rejected an operation.
    #[error("registry error: {message}")]
    Registry {
        /// Description of the rejected operation.
        message: String,
    },

    /// A mutation succeeded but the paused task could not be resumed.
    ///
    /// The container may be left paused.
    #[error("container {id} may be left paused: resume failed: {source}")]
    ResumeFailed {
        /// Container whose task failed to resume.
        id: String,
        /// Error reported by the resume call.
        source: Box<KeeperError>,
    },
}

impl KeeperError {
    /// Returns `true` for [`KeeperError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, KeeperError>;
