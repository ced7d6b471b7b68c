use policyhub_core::{PolicyError, PolicyStatus, VersionNumber};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("policy not found: {0}")]
    PolicyNotFound(Uuid),

    #[error("version conflict on policy {policy_id}: expected current version {expected}")]
    VersionConflict { policy_id: Uuid, expected: VersionNumber },

    #[error("status conflict on policy {policy_id}: expected status '{expected}'")]
    StatusConflict { policy_id: Uuid, expected: PolicyStatus },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    /// Whether the error came from the storage layer.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Migration(_)
                | Self::PolicyNotFound(_)
                | Self::VersionConflict { .. }
                | Self::StatusConflict { .. }
                | Self::Storage(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
