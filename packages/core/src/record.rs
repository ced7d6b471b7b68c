//! Decoding of loosely-typed records into policy types.
//!
//! Rows arrive from the storage layer (or from files) as JSON values. They are
//! decoded here, once, and shape mismatches fail fast as validation errors
//! instead of travelling further inward.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::validate_required;
use crate::error::{PolicyError, Result};
use crate::types::{ComplianceFramework, Policy, PolicySection, PolicyVersion};

/// Decode a record of a named kind, mapping shape errors to `Validation`.
fn decode<T: DeserializeOwned>(kind: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| PolicyError::Validation(format!("invalid {kind} record: {e}")))
}

/// Decode a policy row.
pub fn decode_policy(value: Value) -> Result<Policy> {
    let policy: Policy = decode("policy", value)?;
    validate_required("policy title", &policy.title)?;
    validate_required("policy type", &policy.policy_type)?;
    Ok(policy)
}

/// Decode a version row.
pub fn decode_version(value: Value) -> Result<PolicyVersion> {
    let version: PolicyVersion = decode("version", value)?;
    validate_required("version label", &version.label)?;
    Ok(version)
}

/// Decode a section row.
pub fn decode_section(value: Value) -> Result<PolicySection> {
    let section: PolicySection = decode("section", value)?;
    if section.section_number == 0 {
        return Err(PolicyError::validation(
            "invalid section record: section_number must be at least 1",
        ));
    }
    validate_required("section title", &section.title)?;
    Ok(section)
}

/// Decode a list of compliance framework rows.
///
/// Expects a JSON array; every element must decode.
pub fn decode_frameworks(value: Value) -> Result<Vec<ComplianceFramework>> {
    let Value::Array(items) = value else {
        return Err(PolicyError::validation(
            "invalid framework list: expected an array",
        ));
    };

    items
        .into_iter()
        .map(|item| {
            let framework: ComplianceFramework = decode("framework", item)?;
            validate_required("framework name", &framework.framework_name)?;
            validate_required("control id", &framework.control_id)?;
            Ok(framework)
        })
        .collect()
}
