//! Core data types for policy documents.
//!
//! These types are the stable shape exposed to storage, export and search
//! collaborators.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{normalize_tags, validate_optional, validate_required};
use crate::error::Result;

/// Workflow state of a policy document.
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
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PolicyStatus {
    /// Being written by its author.
    Draft,

    /// Submitted and waiting for a reviewer's decision.
    Review,

    /// Filtering synonym for `Review`; never produced by a transition.
    UnderReview,

    /// Approved by a reviewer, not yet published.
    Approved,

    /// Published and externally visible.
    Active,

    /// Retired from active listings.
    Archived,
}

impl PolicyStatus {
    /// Get the string value used in storage rows.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Whether the policy is awaiting a review decision.
    #[must_use]
    pub fn is_in_review(self) -> bool {
        matches!(self, Self::Review | Self::UnderReview)
    }

    /// Whether the policy appears in active listings.
    #[must_use]
    pub fn is_listed_active(self) -> bool {
        self == Self::Active
    }
}

/// Numeric version counter, held in tenths so repeated increments never drift.
///
/// Serializes as a decimal number (`1.1`) and displays with exactly one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct VersionNumber(u32);

impl VersionNumber {
    /// Version of a newly created policy (1.0).
    pub const INITIAL: Self = Self(10);

    /// Create a version number from a count of tenths (`11` is 1.1).
    #[must_use]
    pub const fn from_tenths(tenths: u32) -> Self {
        Self(tenths)
    }

    /// Number of tenths in this version.
    #[must_use]
    pub const fn tenths(self) -> u32 {
        self.0
    }

    /// The version after this one (`+ 0.1`).
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Human label, e.g. `v1.2`.
    #[must_use]
    pub fn label(self) -> String {
        format!("v{self}")
    }

    /// Numeric value as stored by the persistence layer.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl From<VersionNumber> for f64 {
    fn from(version: VersionNumber) -> Self {
        f64::from(version.0) / 10.0
    }
}

impl TryFrom<f64> for VersionNumber {
    type Error = String;

    fn try_from(value: f64) -> std::result::Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("invalid version number: {value}"));
        }
        let tenths = (value * 10.0).round();
        if tenths > f64::from(u32::MAX) {
            return Err(format!("version number out of range: {value}"));
        }
        Ok(Self(tenths as u32))
    }
}

/// A policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: PolicyStatus,
    pub version: VersionNumber,
    pub author_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    /// Build a new draft policy at version 1.0 from validated input.
    pub fn create(input: NewPolicy, author_id: impl Into<String>, now: DateTime<Utc>) -> Result<Self> {
        input.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            content: input.content,
            policy_type: input.policy_type.trim().to_string(),
            tags: normalize_tags(&input.tags),
            status: PolicyStatus::Draft,
            version: VersionNumber::INITIAL,
            author_id: author_id.into(),
            reviewer_id: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Input for creating a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPolicy {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewPolicy {
    /// Title, content and type are required.
    pub fn validate(&self) -> Result<()> {
        validate_required("title", &self.title)?;
        validate_required("content", &self.content)?;
        validate_required("type", &self.policy_type)?;
        Ok(())
    }
}

/// A content-affecting edit of an existing policy.
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "type")]
    pub policy_type: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub change_description: String,
}

impl PolicyUpdate {
    /// Create an update carrying only a change description.
    #[must_use]
    pub fn new(change_description: impl Into<String>) -> Self {
        Self {
            change_description: change_description.into(),
            ..Self::default()
        }
    }

    /// Replace the policy content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Replace the policy title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replace the free-form tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// The change description is required; provided title, content and type must not be blank.
    pub fn validate(&self) -> Result<()> {
        validate_required("change description", &self.change_description)?;
        validate_optional("title", self.title.as_deref())?;
        validate_optional("content", self.content.as_deref())?;
        validate_optional("type", self.policy_type.as_deref())?;
        Ok(())
    }

    /// Whether applying this update changes the policy's content text.
    #[must_use]
    pub fn changes_content(&self, policy: &Policy) -> bool {
        self.content
            .as_deref()
            .is_some_and(|content| content != policy.content)
    }

    /// Apply the field changes to a policy. The version counter is not touched.
    pub fn apply_to(&self, policy: &mut Policy, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            policy.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            policy.description.clone_from(description);
        }
        if let Some(content) = &self.content {
            policy.content.clone_from(content);
        }
        if let Some(policy_type) = &self.policy_type {
            policy.policy_type = policy_type.trim().to_string();
        }
        if let Some(tags) = &self.tags {
            policy.tags = normalize_tags(tags);
        }
        policy.updated_at = now;
    }
}

/// One historical edit of a policy. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVersion {
    pub version_id: Uuid,
    pub policy_id: Uuid,
    pub number: VersionNumber,
    pub label: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub edited_by: String,
}

/// A titled, numbered chunk of a policy's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySection {
    pub section_number: u32,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub compliance_tags: Vec<String>,
}

impl PolicySection {
    /// Create an untagged section.
    #[must_use]
    pub fn new(section_number: u32, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            section_number,
            title: title.into(),
            content: content.into(),
            compliance_tags: Vec::new(),
        }
    }

    /// Attach compliance tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.compliance_tags = tags;
        self
    }
}

/// A control within a compliance framework, matched against policy text by keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFramework {
    pub framework_name: String,
    pub control_id: String,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

impl ComplianceFramework {
    /// Create a framework control with keywords.
    #[must_use]
    pub fn new(
        framework_name: impl Into<String>,
        control_id: impl Into<String>,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            framework_name: framework_name.into(),
            control_id: control_id.into(),
            keywords: Some(keywords.into_iter().map(Into::into).collect()),
        }
    }

    /// Keywords, empty when the record carries none.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        self.keywords.as_deref().unwrap_or_default()
    }

    /// Compliance tag identifier, e.g. `ISO27001-A.9`.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}-{}", self.framework_name, self.control_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn new_policy() -> NewPolicy {
        NewPolicy {
            title: " Access Control ".to_string(),
            description: "Who gets in".to_string(),
            content: "# Scope\nEveryone".to_string(),
            policy_type: "security".to_string(),
            tags: vec!["iam".to_string(), "iam".to_string()],
        }
    }

    #[test]
    fn test_status_string_forms() {
        assert_eq!(PolicyStatus::UnderReview.as_str(), "under_review");
        assert_eq!(PolicyStatus::Active.to_string(), "active");
        assert_eq!(
            PolicyStatus::from_str("archived").ok(),
            Some(PolicyStatus::Archived)
        );
        assert!(PolicyStatus::from_str("published").is_err());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&PolicyStatus::UnderReview).unwrap();
        assert_eq!(json, "\"under_review\"");
        let status: PolicyStatus = serde_json::from_str("\"review\"").unwrap();
        assert_eq!(status, PolicyStatus::Review);
    }

    #[test]
    fn test_status_predicates() {
        assert!(PolicyStatus::Review.is_in_review());
        assert!(PolicyStatus::UnderReview.is_in_review());
        assert!(!PolicyStatus::Draft.is_in_review());
        assert!(PolicyStatus::Active.is_listed_active());
        assert!(!PolicyStatus::Archived.is_listed_active());
    }

    #[test]
    fn test_version_number_increments() {
        let v = VersionNumber::INITIAL;
        assert_eq!(v.to_string(), "1.0");
        assert_eq!(v.next().label(), "v1.1");
        assert_eq!(VersionNumber::from_tenths(19).next().label(), "v2.0");
    }

    #[test]
    fn test_version_number_no_drift() {
        let mut v = VersionNumber::INITIAL;
        for _ in 0..30 {
            v = v.next();
        }
        assert_eq!(v.label(), "v4.0");
        assert_eq!(v.as_f64(), 4.0);
    }

    #[test]
    fn test_version_number_serde() {
        let json = serde_json::to_string(&VersionNumber::from_tenths(12)).unwrap();
        assert_eq!(json, "1.2");
        let v: VersionNumber = serde_json::from_str("2.3").unwrap();
        assert_eq!(v, VersionNumber::from_tenths(23));
        let v: VersionNumber = serde_json::from_str("1").unwrap();
        assert_eq!(v, VersionNumber::INITIAL);
        assert!(serde_json::from_str::<VersionNumber>("-1.0").is_err());
    }

    #[test]
    fn test_policy_create() {
        let now = Utc::now();
        let policy = Policy::create(new_policy(), "author-1", now).unwrap();
        assert_eq!(policy.title, "Access Control");
        assert_eq!(policy.status, PolicyStatus::Draft);
        assert_eq!(policy.version, VersionNumber::INITIAL);
        assert_eq!(policy.tags, vec!["iam"]);
        assert_eq!(policy.created_at, now);
    }

    #[test]
    fn test_policy_create_requires_fields() {
        let mut input = new_policy();
        input.policy_type = String::new();
        assert!(Policy::create(input, "author-1", Utc::now()).is_err());
    }

    #[test]
    fn test_policy_serializes_type_field() {
        let policy = Policy::create(new_policy(), "author-1", Utc::now()).unwrap();
        let value = serde_json::to_value(&policy).unwrap();
        assert_eq!(value["type"], "security");
        assert_eq!(value["version"], 1.0);
        assert!(value.get("reviewer_id").is_none());
    }

    #[test]
    fn test_update_validation() {
        assert!(PolicyUpdate::new("Tightened scope").validate().is_ok());
        assert!(PolicyUpdate::new("  ").validate().is_err());
        assert!(PolicyUpdate::new("x").with_title("").validate().is_err());
    }

    #[test]
    fn test_update_apply() {
        let mut policy = Policy::create(new_policy(), "author-1", Utc::now()).unwrap();
        let update = PolicyUpdate::new("Rewrite")
            .with_content("# Scope\nContractors too")
            .with_tags(vec!["iam".to_string(), " vendors".to_string()]);

        assert!(update.changes_content(&policy));
        update.apply_to(&mut policy, Utc::now());
        assert_eq!(policy.content, "# Scope\nContractors too");
        assert_eq!(policy.tags, vec!["iam", "vendors"]);
        assert_eq!(policy.title, "Access Control");
        assert!(!update.changes_content(&policy));
    }

    #[test]
    fn test_framework_keywords_absent() {
        let framework: ComplianceFramework =
            serde_json::from_str(r#"{"framework_name":"PCI","control_id":"3.4"}"#).unwrap();
        assert!(framework.keywords().is_empty());
        assert_eq!(framework.tag(), "PCI-3.4");
    }
}
