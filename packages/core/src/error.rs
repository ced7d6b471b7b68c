//! Error types for the policy core.
//!
//! The splitter, tagger and metadata helper never fail; errors come from the
//! lifecycle rules, version bookkeeping, record decoding and the CLI's IO.

use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::{Role, TransitionKind};
use crate::types::{PolicyStatus, VersionNumber};

/// Main error type for the policy core.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A required field is missing or a record has the wrong shape.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The requested lifecycle transition is not legal from the current status.
    #[error("Invalid transition: cannot {transition} a policy in status '{from}'")]
    InvalidTransition {
        from: PolicyStatus,
        transition: TransitionKind,
    },

    /// The acting role may not perform this transition.
    #[error("Permission denied: role '{role}' may not {transition} a policy")]
    PermissionDenied {
        role: Role,
        transition: TransitionKind,
    },

    /// The newest version record disagrees with the policy's version counter.
    #[error("Version history out of sync for policy {policy_id}: policy is at {policy_version}, latest version record is {}", .latest.map(|v| v.to_string()).unwrap_or_else(|| "missing".to_string()))]
    VersionMismatch {
        policy_id: Uuid,
        policy_version: VersionNumber,
        latest: Option<VersionNumber>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl PolicyError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type alias for policy core operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
