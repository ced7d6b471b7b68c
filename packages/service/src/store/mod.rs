//! Storage collaborators for policies, versions, sections and frameworks.
//!
//! The service only talks to [`PolicyStore`]; the PostgreSQL implementation is
//! used in deployments, the in-memory one in tests and local tooling.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgPolicyStore;

use async_trait::async_trait;
use policyhub_core::{
    ComplianceFramework, Policy, PolicySection, PolicyStatus, PolicyVersion, VersionNumber,
};
use uuid::Uuid;

use crate::error::Result;

/// Persistence operations needed by the policy service.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Insert a new policy row. Tags are linked separately.
    async fn insert_policy(&self, policy: &Policy) -> Result<()>;

    /// Fetch a policy with its tags, or `PolicyNotFound`.
    async fn get_policy(&self, policy_id: Uuid) -> Result<Policy>;

    /// List policies, newest first, optionally filtered by status.
    async fn list_policies(&self, status: Option<PolicyStatus>) -> Result<Vec<Policy>>;

    async fn insert_version(&self, version: &PolicyVersion) -> Result<()>;

    /// Version history of a policy, newest first.
    async fn list_versions(&self, policy_id: Uuid) -> Result<Vec<PolicyVersion>>;

    /// Write the edited policy fields and its new version record atomically.
    /// Tags are not written here; see [`PolicyStore::link_tags`].
    ///
    /// Fails with `VersionConflict` when the stored version is no longer
    /// `expected`, in which case nothing is written.
    async fn commit_update(
        &self,
        policy: &Policy,
        expected: VersionNumber,
        version: &PolicyVersion,
    ) -> Result<()>;

    /// Write status, reviewer and rejection reason.
    ///
    /// Fails with `StatusConflict` when the stored status is no longer
    /// `expected`.
    async fn update_status(&self, policy: &Policy, expected: PolicyStatus) -> Result<()>;

    /// Replace the tag links of a policy.
    async fn link_tags(&self, policy_id: Uuid, tags: &[String]) -> Result<()>;

    /// Replace all sections of a policy.
    async fn replace_sections(&self, policy_id: Uuid, sections: &[PolicySection]) -> Result<()>;

    /// Sections of a policy in section number order.
    async fn list_sections(&self, policy_id: Uuid) -> Result<Vec<PolicySection>>;

    async fn list_frameworks(&self) -> Result<Vec<ComplianceFramework>>;

    /// Delete a policy together with its versions, tags and sections.
    async fn delete_policy(&self, policy_id: Uuid) -> Result<()>;
}
