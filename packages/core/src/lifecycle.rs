//! Review workflow for policy documents.
//!
//! ```text
//! draft --submit--> review --approve--> approved --publish--> active --archive--> archived
//!   ^                  |
//!   +-----reject-------+
//! ```
//!
//! `under_review` is accepted wherever `review` is, but no transition produces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::validate_required;
use crate::error::{PolicyError, Result};
use crate::types::{Policy, PolicyStatus};

/// Role of the user requesting a transition.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Author,
    Reviewer,
    Admin,
}

/// The user requesting a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// Transition names, without their payloads.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransitionKind {
    SubmitForReview,
    Approve,
    Reject,
    Publish,
    Archive,
}

impl TransitionKind {
    /// Every transition, in workflow order.
    pub const ALL: [Self; 5] = [
        Self::SubmitForReview,
        Self::Approve,
        Self::Reject,
        Self::Publish,
        Self::Archive,
    ];

    /// Status the policy ends up in.
    #[must_use]
    pub fn target(self) -> PolicyStatus {
        match self {
            Self::SubmitForReview => PolicyStatus::Review,
            Self::Approve => PolicyStatus::Approved,
            Self::Reject => PolicyStatus::Draft,
            Self::Publish => PolicyStatus::Active,
            Self::Archive => PolicyStatus::Archived,
        }
    }

    /// Whether the transition may start from `status`.
    #[must_use]
    pub fn is_legal_from(self, status: PolicyStatus) -> bool {
        match self {
            Self::SubmitForReview => status == PolicyStatus::Draft,
            Self::Approve | Self::Reject => status.is_in_review(),
            Self::Publish => status == PolicyStatus::Approved,
            Self::Archive => status == PolicyStatus::Active,
        }
    }

    /// Whether `role` may trigger the transition.
    #[must_use]
    pub fn permits(self, role: Role) -> bool {
        match self {
            Self::SubmitForReview => true,
            Self::Approve | Self::Reject => matches!(role, Role::Reviewer | Role::Admin),
            Self::Publish | Self::Archive => role == Role::Admin,
        }
    }
}

/// A requested status change with its required inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    SubmitForReview { reviewer_id: String },
    Approve,
    Reject { reason: String },
    Publish,
    Archive,
}

impl Transition {
    #[must_use]
    pub fn kind(&self) -> TransitionKind {
        match self {
            Self::SubmitForReview { .. } => TransitionKind::SubmitForReview,
            Self::Approve => TransitionKind::Approve,
            Self::Reject { .. } => TransitionKind::Reject,
            Self::Publish => TransitionKind::Publish,
            Self::Archive => TransitionKind::Archive,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::SubmitForReview { reviewer_id } => validate_required("reviewer", reviewer_id),
            Self::Reject { reason } => validate_required("rejection reason", reason),
            Self::Approve | Self::Publish | Self::Archive => Ok(()),
        }
    }
}

/// Result of a legal transition, ready to be written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub from: PolicyStatus,
    pub to: PolicyStatus,
    pub transition: Transition,
}

impl TransitionOutcome {
    /// Reviewer assigned by this transition, if any.
    #[must_use]
    pub fn reviewer_id(&self) -> Option<&str> {
        match &self.transition {
            Transition::SubmitForReview { reviewer_id } => Some(reviewer_id.trim()),
            _ => None,
        }
    }

    /// Rejection reason recorded by this transition, if any.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.transition {
            Transition::Reject { reason } => Some(reason.trim()),
            _ => None,
        }
    }

    /// Write the new status and its side effects onto a policy.
    ///
    /// Submitting assigns the reviewer and clears an earlier rejection reason.
    pub fn apply_to(&self, policy: &mut Policy, now: DateTime<Utc>) {
        policy.status = self.to;
        match &self.transition {
            Transition::SubmitForReview { .. } => {
                policy.reviewer_id = self.reviewer_id().map(str::to_string);
                policy.rejection_reason = None;
            }
            Transition::Reject { .. } => {
                policy.rejection_reason = self.rejection_reason().map(str::to_string);
            }
            Transition::Approve | Transition::Publish | Transition::Archive => {}
        }
        policy.updated_at = now;
    }
}

/// Transitions that are legal from `status`, regardless of role.
#[must_use]
pub fn allowed_transitions(status: PolicyStatus) -> Vec<TransitionKind> {
    TransitionKind::ALL
        .into_iter()
        .filter(|kind| kind.is_legal_from(status))
        .collect()
}

/// Check a transition request against the workflow.
///
/// Legality is checked first, then the actor's role, then the transition's
/// required inputs. On error the caller must leave the status unchanged.
pub fn apply_transition(
    current: PolicyStatus,
    transition: &Transition,
    actor: &Actor,
) -> Result<TransitionOutcome> {
    let kind = transition.kind();

    if !kind.is_legal_from(current) {
        return Err(PolicyError::InvalidTransition {
            from: current,
            transition: kind,
        });
    }

    if !kind.permits(actor.role) {
        return Err(PolicyError::PermissionDenied {
            role: actor.role,
            transition: kind,
        });
    }

    transition.validate()?;

    Ok(TransitionOutcome {
        from: current,
        to: kind.target(),
        transition: transition.clone(),
    })
}
