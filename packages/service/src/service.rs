//! Policy use cases: create, edit, review workflow and re-splitting.
//!
//! Only the primary write of each operation decides its outcome. Secondary
//! writes (initial version row, tag links, sections) and notifications are
//! logged when they fail and never roll back the primary write.

use std::sync::Arc;

use chrono::Utc;
use policyhub_core::lifecycle::apply_transition;
use policyhub_core::versioning::{initial_version, next_version, verify_version_history};
use policyhub_core::{
    segment_policy, Actor, NewPolicy, Policy, PolicySection, PolicyStatus, PolicyUpdate,
    PolicyVersion, Transition,
};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::store::PolicyStore;

/// Outcome of re-splitting a batch of policies.
#[derive(Debug, Default)]
pub struct ResplitReport {
    pub resplit: Vec<Uuid>,
    pub failed: Vec<(Uuid, ServiceError)>,
}

impl ResplitReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct PolicyService {
    store: Arc<dyn PolicyStore>,
    notifier: Arc<dyn Notifier>,
}

impl PolicyService {
    pub fn new(store: Arc<dyn PolicyStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &dyn PolicyStore {
        self.store.as_ref()
    }

    /// Create a draft policy at v1.0 and split it into tagged sections.
    #[tracing::instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_policy(&self, input: NewPolicy, author_id: &str) -> Result<Policy> {
        let policy = Policy::create(input, author_id, Utc::now())?;
        self.store.insert_policy(&policy).await?;
        tracing::info!(policy_id = %policy.id, "policy created");

        if let Err(e) = self.store.insert_version(&initial_version(&policy)).await {
            tracing::warn!(policy_id = %policy.id, error = %e, "failed to record initial version");
        }
        self.link_tags(&policy).await;
        if let Err(e) = self.resplit(&policy).await {
            tracing::warn!(policy_id = %policy.id, error = %e, "failed to split policy into sections");
        }

        self.send(&policy, NotificationKind::Created).await;
        Ok(policy)
    }

    /// Apply an edit, bumping the version by 0.1.
    ///
    /// Sections are rebuilt only when the content text changed.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_policy(
        &self,
        policy_id: Uuid,
        update: PolicyUpdate,
        editor_id: &str,
    ) -> Result<Policy> {
        update.validate()?;
        let mut policy = self.store.get_policy(policy_id).await?;

        let now = Utc::now();
        let content_changed = update.changes_content(&policy);
        let version = next_version(&policy, &update.change_description, editor_id, now)?;
        let expected = policy.version;

        update.apply_to(&mut policy, now);
        policy.version = version.number;
        self.store.commit_update(&policy, expected, &version).await?;
        tracing::info!(version = %version.label, content_changed, "policy updated");

        if update.tags.is_some() {
            self.link_tags(&policy).await;
        }
        if content_changed {
            if let Err(e) = self.resplit(&policy).await {
                tracing::warn!(error = %e, "failed to re-split policy after edit");
            }
        }

        Ok(policy)
    }

    /// Move a policy through the review workflow.
    #[tracing::instrument(skip(self, transition, actor), fields(transition = %transition.kind(), actor = %actor.id))]
    pub async fn transition(
        &self,
        policy_id: Uuid,
        transition: &Transition,
        actor: &Actor,
    ) -> Result<Policy> {
        let mut policy = self.store.get_policy(policy_id).await?;

        let outcome = apply_transition(policy.status, transition, actor)?;
        outcome.apply_to(&mut policy, Utc::now());
        self.store.update_status(&policy, outcome.from).await?;
        tracing::info!(from = %outcome.from, to = %outcome.to, "policy status changed");

        let kind = match transition {
            Transition::SubmitForReview { .. } => NotificationKind::SubmittedForReview {
                reviewer_id: outcome.reviewer_id().unwrap_or_default().to_string(),
            },
            Transition::Approve => NotificationKind::Approved,
            Transition::Reject { .. } => NotificationKind::Rejected {
                reason: outcome.rejection_reason().unwrap_or_default().to_string(),
            },
            Transition::Publish => NotificationKind::Published,
            Transition::Archive => NotificationKind::Archived,
        };
        self.send(&policy, kind).await;

        Ok(policy)
    }

    /// Re-split a stored policy against the current framework list.
    #[tracing::instrument(skip(self))]
    pub async fn resplit_policy(&self, policy_id: Uuid) -> Result<Vec<PolicySection>> {
        let policy = self.store.get_policy(policy_id).await?;
        self.resplit(&policy).await
    }

    /// Re-split each policy in turn. A failure is logged and recorded, and the
    /// remaining policies are still processed.
    pub async fn resplit_policies(&self, policy_ids: &[Uuid]) -> ResplitReport {
        let mut report = ResplitReport::default();

        for &policy_id in policy_ids {
            match self.resplit_policy(policy_id).await {
                Ok(sections) => {
                    tracing::info!(%policy_id, sections = sections.len(), "policy re-split");
                    report.resplit.push(policy_id);
                }
                Err(e) => {
                    tracing::error!(%policy_id, error = %e, "failed to re-split policy");
                    report.failed.push((policy_id, e));
                }
            }
        }

        report
    }

    /// Re-split every stored policy.
    pub async fn resplit_all(&self) -> Result<ResplitReport> {
        let ids: Vec<Uuid> = self
            .store
            .list_policies(None)
            .await?
            .into_iter()
            .map(|policy| policy.id)
            .collect();
        Ok(self.resplit_policies(&ids).await)
    }

    pub async fn get_policy(&self, policy_id: Uuid) -> Result<Policy> {
        self.store.get_policy(policy_id).await
    }

    /// List policies, optionally by status. `under_review` also lists `review`.
    pub async fn list_policies(&self, status: Option<PolicyStatus>) -> Result<Vec<Policy>> {
        match status {
            Some(status) if status.is_in_review() => {
                let mut policies = self.store.list_policies(Some(PolicyStatus::Review)).await?;
                policies.extend(self.store.list_policies(Some(PolicyStatus::UnderReview)).await?);
                policies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(policies)
            }
            _ => self.store.list_policies(status).await,
        }
    }

    pub async fn list_versions(&self, policy_id: Uuid) -> Result<Vec<PolicyVersion>> {
        self.store.list_versions(policy_id).await
    }

    pub async fn list_sections(&self, policy_id: Uuid) -> Result<Vec<PolicySection>> {
        self.store.list_sections(policy_id).await
    }

    /// Check that the newest version record matches the policy's counter.
    pub async fn verify_history(&self, policy_id: Uuid) -> Result<()> {
        let policy = self.store.get_policy(policy_id).await?;
        let versions = self.store.list_versions(policy_id).await?;
        verify_version_history(&policy, &versions)?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_policy(&self, policy_id: Uuid) -> Result<()> {
        self.store.delete_policy(policy_id).await
    }

    async fn resplit(&self, policy: &Policy) -> Result<Vec<PolicySection>> {
        let frameworks = self.store.list_frameworks().await?;
        let sections = segment_policy(&policy.content, &frameworks);
        self.store.replace_sections(policy.id, &sections).await?;
        tracing::debug!(policy_id = %policy.id, sections = sections.len(), "sections replaced");
        Ok(sections)
    }

    async fn link_tags(&self, policy: &Policy) {
        if let Err(e) = self.store.link_tags(policy.id, &policy.tags).await {
            tracing::warn!(policy_id = %policy.id, error = %e, "failed to link tags");
        }
    }

    async fn send(&self, policy: &Policy, kind: NotificationKind) {
        let notification = Notification {
            policy_id: policy.id,
            policy_title: policy.title.clone(),
            author_id: policy.author_id.clone(),
            kind,
        };
        if let Err(e) = self.notifier.notify(&notification).await {
            tracing::warn!(
                policy_id = %policy.id,
                event = notification.kind.event(),
                error = %e,
                "notification failed"
            );
        }
    }
}
