use std::collections::HashMap;

use async_trait::async_trait;
use policyhub_core::{
    ComplianceFramework, Policy, PolicySection, PolicyStatus, PolicyVersion, VersionNumber,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PolicyStore;
use crate::error::{Result, ServiceError};

#[derive(Debug, Default)]
struct Tables {
    policies: HashMap<Uuid, Policy>,
    versions: HashMap<Uuid, Vec<PolicyVersion>>,
    sections: HashMap<Uuid, Vec<PolicySection>>,
    frameworks: Vec<ComplianceFramework>,
}

impl Tables {
    fn policy_mut(&mut self, policy_id: Uuid) -> Result<&mut Policy> {
        self.policies
            .get_mut(&policy_id)
            .ok_or(ServiceError::PolicyNotFound(policy_id))
    }

    fn ensure_exists(&self, policy_id: Uuid) -> Result<()> {
        if self.policies.contains_key(&policy_id) {
            Ok(())
        } else {
            Err(ServiceError::PolicyNotFound(policy_id))
        }
    }

    fn ensure_unused_number(&self, version: &PolicyVersion) -> Result<()> {
        let taken = self
            .versions
            .get(&version.policy_id)
            .is_some_and(|versions| versions.iter().any(|v| v.number == version.number));
        if taken {
            return Err(ServiceError::Storage(format!(
                "version {} already exists for policy {}",
                version.label, version.policy_id
            )));
        }
        Ok(())
    }
}

/// In-process store with the same semantics as the PostgreSQL store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the framework list used for tagging.
    pub fn with_frameworks(frameworks: Vec<ComplianceFramework>) -> Self {
        Self {
            tables: RwLock::new(Tables {
                frameworks,
                ..Tables::default()
            }),
        }
    }

    /// Replace the framework list.
    pub async fn set_frameworks(&self, frameworks: Vec<ComplianceFramework>) {
        self.tables.write().await.frameworks = frameworks;
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn insert_policy(&self, policy: &Policy) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.policies.contains_key(&policy.id) {
            return Err(ServiceError::Storage(format!(
                "policy {} already exists",
                policy.id
            )));
        }
        // Tags only become visible once linked.
        let mut row = policy.clone();
        row.tags.clear();
        tables.policies.insert(policy.id, row);
        Ok(())
    }

    async fn get_policy(&self, policy_id: Uuid) -> Result<Policy> {
        self.tables
            .read()
            .await
            .policies
            .get(&policy_id)
            .cloned()
            .ok_or(ServiceError::PolicyNotFound(policy_id))
    }

    async fn list_policies(&self, status: Option<PolicyStatus>) -> Result<Vec<Policy>> {
        let tables = self.tables.read().await;
        let mut policies: Vec<Policy> = tables
            .policies
            .values()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        policies.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(policies)
    }

    async fn insert_version(&self, version: &PolicyVersion) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.ensure_exists(version.policy_id)?;
        tables.ensure_unused_number(version)?;
        tables
            .versions
            .entry(version.policy_id)
            .or_default()
            .push(version.clone());
        Ok(())
    }

    async fn list_versions(&self, policy_id: Uuid) -> Result<Vec<PolicyVersion>> {
        let tables = self.tables.read().await;
        let mut versions = tables.versions.get(&policy_id).cloned().unwrap_or_default();
        versions.sort_by(|a, b| (b.created_at, b.number).cmp(&(a.created_at, a.number)));
        Ok(versions)
    }

    async fn commit_update(
        &self,
        policy: &Policy,
        expected: VersionNumber,
        version: &PolicyVersion,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let stored = tables.policy_mut(policy.id)?;
        if stored.version != expected {
            return Err(ServiceError::VersionConflict {
                policy_id: policy.id,
                expected,
            });
        }
        tables.ensure_unused_number(version)?;

        let stored = tables.policy_mut(policy.id)?;
        let tags = std::mem::take(&mut stored.tags);
        *stored = Policy {
            tags,
            ..policy.clone()
        };
        tables
            .versions
            .entry(policy.id)
            .or_default()
            .push(version.clone());
        Ok(())
    }

    async fn update_status(&self, policy: &Policy, expected: PolicyStatus) -> Result<()> {
        let mut tables = self.tables.write().await;
        let stored = tables.policy_mut(policy.id)?;
        if stored.status != expected {
            return Err(ServiceError::StatusConflict {
                policy_id: policy.id,
                expected,
            });
        }
        stored.status = policy.status;
        stored.reviewer_id = policy.reviewer_id.clone();
        stored.rejection_reason = policy.rejection_reason.clone();
        stored.updated_at = policy.updated_at;
        Ok(())
    }

    async fn link_tags(&self, policy_id: Uuid, tags: &[String]) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.policy_mut(policy_id)?.tags = tags.to_vec();
        Ok(())
    }

    async fn replace_sections(&self, policy_id: Uuid, sections: &[PolicySection]) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.ensure_exists(policy_id)?;
        tables.sections.insert(policy_id, sections.to_vec());
        Ok(())
    }

    async fn list_sections(&self, policy_id: Uuid) -> Result<Vec<PolicySection>> {
        let tables = self.tables.read().await;
        let mut sections = tables.sections.get(&policy_id).cloned().unwrap_or_default();
        sections.sort_by_key(|s| s.section_number);
        Ok(sections)
    }

    async fn list_frameworks(&self) -> Result<Vec<ComplianceFramework>> {
        Ok(self.tables.read().await.frameworks.clone())
    }

    async fn delete_policy(&self, policy_id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.policies.remove(&policy_id).is_none() {
            return Err(ServiceError::PolicyNotFound(policy_id));
        }
        tables.versions.remove(&policy_id);
        tables.sections.remove(&policy_id);
        Ok(())
    }
}
