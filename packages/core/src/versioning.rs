//! Version records for policy edits.
//!
//! Every content-affecting update bumps the policy's counter by 0.1 and
//! appends exactly one `PolicyVersion`. Numbers are never reused: reverting
//! content is a new version too.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::{validate_required, INITIAL_VERSION_DESCRIPTION};
use crate::error::{PolicyError, Result};
use crate::types::{Policy, PolicyVersion, VersionNumber};

/// Build the `v1.0` record for a newly created policy.
#[must_use]
pub fn initial_version(policy: &Policy) -> PolicyVersion {
    PolicyVersion {
        version_id: Uuid::new_v4(),
        policy_id: policy.id,
        number: VersionNumber::INITIAL,
        label: VersionNumber::INITIAL.label(),
        description: INITIAL_VERSION_DESCRIPTION.to_string(),
        created_at: policy.created_at,
        edited_by: policy.author_id.clone(),
    }
}

/// Build the record for the next edit of `policy`.
///
/// The caller commits the returned record together with setting the policy's
/// counter to `record.number`.
pub fn next_version(
    policy: &Policy,
    description: &str,
    edited_by: &str,
    now: DateTime<Utc>,
) -> Result<PolicyVersion> {
    validate_required("change description", description)?;
    let number = policy.version.next();

    Ok(PolicyVersion {
        version_id: Uuid::new_v4(),
        policy_id: policy.id,
        number,
        label: number.label(),
        description: description.trim().to_string(),
        created_at: now,
        edited_by: edited_by.to_string(),
    })
}

/// The most recently created version, by creation time.
///
/// Ties on `created_at` go to the higher number.
#[must_use]
pub fn current_version(versions: &[PolicyVersion]) -> Option<&PolicyVersion> {
    versions
        .iter()
        .max_by_key(|version| (version.created_at, version.number))
}

/// Check that the newest version record matches the policy's counter.
pub fn verify_version_history(policy: &Policy, versions: &[PolicyVersion]) -> Result<()> {
    let latest = current_version(versions).map(|version| version.number);
    if latest == Some(policy.version) {
        Ok(())
    } else {
        Err(PolicyError::VersionMismatch {
            policy_id: policy.id,
            policy_version: policy.version,
            latest,
        })
    }
}
