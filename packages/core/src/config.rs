//! Configuration constants and validation functions for the policy core.

use crate::error::{PolicyError, Result};

/// Title given to content that precedes the first heading.
pub const INTRODUCTION_TITLE: &str = "Introduction";

/// Title of the single section emitted for documents without headings.
pub const FALLBACK_SECTION_TITLE: &str = "Policy Content";

/// Change description recorded on the first version of every policy.
pub const INITIAL_VERSION_DESCRIPTION: &str = "Initial version";

/// Maximum length (in characters) of an extracted title, ellipsis included.
pub const METADATA_TITLE_MAX_CHARS: usize = 120;

/// Maximum length (in characters) of an extracted description, before the ellipsis.
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// Reading speed used for reading-time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Text wrap width for plain-text export.
pub const TEXT_WRAP_WIDTH: usize = 100;

/// Ensure a required text field is present and not blank.
///
/// # Examples
/// ```
/// use policyhub_core::config::validate_required;
///
/// assert!(validate_required("title", "Access Control Policy").is_ok());
/// assert!(validate_required("title", "   ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(PolicyError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Ensure an optional text field, when provided, is not blank.
pub fn validate_optional(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => validate_required(field, v),
        None => Ok(()),
    }
}

/// Normalize free-form policy tags.
///
/// Trims each tag, drops blanks and removes duplicates while keeping the
/// first occurrence's position.
///
/// # Examples
/// ```
/// use policyhub_core::config::normalize_tags;
///
/// let tags = vec![" gdpr ".to_string(), "".to_string(), "gdpr".to_string(), "hr".to_string()];
/// assert_eq!(normalize_tags(&tags), vec!["gdpr", "hr"]);
/// ```
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

const ELLIPSIS: &str = "...";

/// Truncate text to at most `max_chars` characters, cutting at a word boundary
/// and appending `...` when anything was removed.
///
/// Falls back to a hard cut when the first word alone exceeds the limit.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let hard_cut: String = text.chars().take(max_chars).collect();
    let cut = match hard_cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => hard_cut[..idx].trim_end(),
        _ => hard_cut.as_str(),
    };
    format!("{cut}{ELLIPSIS}")
}

/// Like [`truncate_at_word`], but the result including `...` never exceeds
/// `max_chars`.
///
/// # Examples
/// ```
/// use policyhub_core::config::truncate_within;
///
/// assert_eq!(truncate_within("the quick brown fox", 12), "the...");
/// assert_eq!(truncate_within("the quick", 12), "the quick");
/// ```
pub fn truncate_within(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    truncate_at_word(text, max_chars.saturating_sub(ELLIPSIS.len()))
}
