//! Keyword-driven compliance tagging of policy sections.

use crate::splitting::SplitEngine;
use crate::types::{ComplianceFramework, PolicySection};

/// Return the tags of every framework whose keywords occur in `content`.
///
/// Matching is a case-insensitive substring test. Tags follow the order of
/// `frameworks`; each framework contributes at most one tag. Frameworks
/// without keywords never match, and blank keywords are ignored.
///
/// # Examples
/// ```
/// use policyhub_core::tagging::tag_section;
/// use policyhub_core::types::ComplianceFramework;
///
/// let frameworks = vec![
///     ComplianceFramework::new("ISO27001", "A.9", ["access control"]),
///     ComplianceFramework::new("PCI", "3.4", ["cardholder"]),
/// ];
/// let tags = tag_section("This covers encryption and access control.", &frameworks);
/// assert_eq!(tags, vec!["ISO27001-A.9"]);
/// ```
pub fn tag_section(content: &str, frameworks: &[ComplianceFramework]) -> Vec<String> {
    let haystack = content.to_lowercase();

    frameworks
        .iter()
        .filter(|framework| matches_any_keyword(&haystack, framework))
        .map(ComplianceFramework::tag)
        .collect()
}

fn matches_any_keyword(haystack: &str, framework: &ComplianceFramework) -> bool {
    framework
        .keywords()
        .iter()
        .map(|keyword| keyword.trim())
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| haystack.contains(&keyword.to_lowercase()))
}

/// Attach compliance tags to each section, replacing any tags it already had.
pub fn tag_sections(
    sections: Vec<PolicySection>,
    frameworks: &[ComplianceFramework],
) -> Vec<PolicySection> {
    sections
        .into_iter()
        .map(|section| {
            let tags = tag_section(&section.content, frameworks);
            section.with_tags(tags)
        })
        .collect()
}

/// Split content with the default rules and tag every section.
pub fn segment_policy(content: &str, frameworks: &[ComplianceFramework]) -> Vec<PolicySection> {
    let sections = SplitEngine::default().split(content);
    let tagged = tag_sections(sections, frameworks);
    tracing::debug!(
        sections = tagged.len(),
        tagged = tagged.iter().filter(|s| !s.compliance_tags.is_empty()).count(),
        "policy segmented"
    );
    tagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frameworks() -> Vec<ComplianceFramework> {
        vec![
            ComplianceFramework::new("ISO27001", "A.9", ["access control"]),
            ComplianceFramework::new("PCI", "3.4", ["cardholder"]),
        ]
    }

    #[test]
    fn test_single_match() {
        assert_eq!(
            tag_section("This covers encryption and access control.", &frameworks()),
            vec!["ISO27001-A.9"]
        );
    }

    #[test]
    fn test_no_frameworks() {
        assert!(tag_section("access control", &[]).is_empty());
    }

    #[test]
    fn test_case_insensitive_both_ways() {
        let frameworks = vec![ComplianceFramework::new("GDPR", "Art.32", ["Personal Data"])];
        assert_eq!(
            tag_section("We protect PERSONAL DATA at rest.", &frameworks),
            vec!["GDPR-Art.32"]
        );
    }

    #[test]
    fn test_multiple_matches_follow_framework_order() {
        let content = "Cardholder data requires strict access control.";
        assert_eq!(
            tag_section(content, &frameworks()),
            vec!["ISO27001-A.9", "PCI-3.4"]
        );
    }

    #[test]
    fn test_one_tag_per_framework() {
        let frameworks = vec![ComplianceFramework::new(
            "ISO27001",
            "A.10",
            ["encryption", "cryptographic", "key"],
        )];
        assert_eq!(
            tag_section("Encryption keys use cryptographic modules.", &frameworks),
            vec!["ISO27001-A.10"]
        );
    }

    #[test]
    fn test_absent_and_empty_keywords_never_match() {
        let frameworks = vec![
            ComplianceFramework {
                framework_name: "SOC2".to_string(),
                control_id: "CC6.1".to_string(),
                keywords: None,
            },
            ComplianceFramework {
                framework_name: "SOC2".to_string(),
                control_id: "CC6.2".to_string(),
                keywords: Some(Vec::new()),
            },
            ComplianceFramework::new("NIST", "AC-2", ["", "   "]),
        ];
        assert!(tag_section("anything at all", &frameworks).is_empty());
    }

    #[test]
    fn test_substring_match() {
        let frameworks = vec![ComplianceFramework::new("HIPAA", "164.312", ["audit"])];
        assert_eq!(
            tag_section("Auditing is enabled", &frameworks),
            vec!["HIPAA-164.312"]
        );
    }

    #[test]
    fn test_idempotent() {
        let content = "cardholder";
        assert_eq!(
            tag_section(content, &frameworks()),
            tag_section(content, &frameworks())
        );
    }

    #[test]
    fn test_segment_policy_tags_each_section() {
        let content = "# Access\nAccess control for all.\n# Payments\nCardholder data.\n# Misc\nNothing.\n";
        let sections = segment_policy(content, &frameworks());
        let tags: Vec<_> = sections.iter().map(|s| s.compliance_tags.clone()).collect();
        assert_eq!(
            tags,
            vec![
                vec!["ISO27001-A.9".to_string()],
                vec!["PCI-3.4".to_string()],
                Vec::new(),
            ]
        );
    }

    #[test]
    fn test_tag_sections_replaces_existing_tags() {
        let section = PolicySection::new(1, "A", "no keywords").with_tags(vec!["stale".to_string()]);
        let tagged = tag_sections(vec![section], &frameworks());
        assert!(tagged[0].compliance_tags.is_empty());
    }

    #[test]
    fn test_heading_text_not_matched() {
        let sections = segment_policy("# Access control\nBody without keywords\n", &frameworks());
        assert!(sections[0].compliance_tags.is_empty());
    }
}
