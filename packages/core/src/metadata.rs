//! Metadata derived from raw policy content.
//!
//! Used to prefill title and description when a policy is imported from a
//! file, and for listing statistics.

use serde::{Deserialize, Serialize};

use crate::config::{
    truncate_at_word, truncate_within, DESCRIPTION_MAX_CHARS, METADATA_TITLE_MAX_CHARS, WORDS_PER_MINUTE,
};
use crate::splitting::SplitEngine;

/// Metadata extracted from policy content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    /// First heading's title, or the first non-blank line.
    pub title: Option<String>,

    /// First paragraph after the title line.
    pub description: Option<String>,

    pub word_count: usize,

    pub heading_count: usize,

    /// Estimated reading time, rounded up.
    pub reading_minutes: usize,
}

/// Extract metadata from policy content.
///
/// # Examples
/// ```
/// use policyhub_core::metadata::extract_metadata;
///
/// let metadata = extract_metadata("# Access Control\nOnly staff may enter.\n");
/// assert_eq!(metadata.title.as_deref(), Some("Access Control"));
/// assert_eq!(metadata.description.as_deref(), Some("Only staff may enter."));
/// assert_eq!(metadata.word_count, 7);
/// ```
#[must_use]
pub fn extract_metadata(content: &str) -> PolicyMetadata {
    let engine = SplitEngine::default();
    let lines: Vec<&str> = content.lines().collect();

    let headings: Vec<Option<String>> = lines.iter().map(|line| engine.heading_title(line)).collect();
    let heading_count = headings.iter().filter(|h| h.is_some()).count();

    let title_index = headings
        .iter()
        .position(Option::is_some)
        .or_else(|| lines.iter().position(|line| !line.trim().is_empty()));

    let title = title_index.map(|idx| {
        let raw = headings[idx]
            .clone()
            .unwrap_or_else(|| lines[idx].trim().to_string());
        truncate_within(&raw, METADATA_TITLE_MAX_CHARS)
    });

    let description = title_index.and_then(|idx| {
        let paragraph = first_paragraph(&lines[idx + 1..], &headings[idx + 1..])?;
        Some(truncate_at_word(&paragraph, DESCRIPTION_MAX_CHARS))
    });

    let word_count = content.split_whitespace().count();

    PolicyMetadata {
        title,
        description,
        word_count,
        heading_count,
        reading_minutes: word_count.div_ceil(WORDS_PER_MINUTE),
    }
}

/// Join the first run of non-blank, non-heading lines with single spaces.
fn first_paragraph(lines: &[&str], headings: &[Option<String>]) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();

    for (line, heading) in lines.iter().zip(headings) {
        let trimmed = line.trim();
        let ends_paragraph = trimmed.is_empty() || heading.is_some();
        if ends_paragraph {
            if !parts.is_empty() {
                break;
            }
            continue;
        }
        parts.push(trimmed);
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_content() {
        assert_eq!(extract_metadata(""), PolicyMetadata::default());
        assert_eq!(extract_metadata("  \n "), PolicyMetadata::default());
    }

    #[test]
    fn test_title_from_first_heading() {
        let metadata = extract_metadata("Draft notes\n\n# Incident Response\nCall the SOC.\n");
        assert_eq!(metadata.title.as_deref(), Some("Incident Response"));
        assert_eq!(metadata.description.as_deref(), Some("Call the SOC."));
        assert_eq!(metadata.heading_count, 1);
    }

    #[test]
    fn test_title_from_first_line_without_headings() {
        let metadata = extract_metadata("\nAcceptable Use\n\nDo not share passwords.\nEver.\n\nMore.");
        assert_eq!(metadata.title.as_deref(), Some("Acceptable Use"));
        assert_eq!(
            metadata.description.as_deref(),
            Some("Do not share passwords. Ever.")
        );
        assert_eq!(metadata.heading_count, 0);
    }

    #[test]
    fn test_description_skips_headings_until_paragraph() {
        let metadata = extract_metadata("# Policy\n## Purpose\n\nKeep data safe.\n## Scope\nAll.\n");
        assert_eq!(metadata.description.as_deref(), Some("Keep data safe."));
        assert_eq!(metadata.heading_count, 3);
    }

    #[test]
    fn test_description_stops_at_heading() {
        let metadata = extract_metadata("# A\nfirst line\n1. Next\nsecond\n");
        assert_eq!(metadata.description.as_deref(), Some("first line"));
    }

    #[test]
    fn test_no_description() {
        let metadata = extract_metadata("# Only a heading");
        assert_eq!(metadata.title.as_deref(), Some("Only a heading"));
        assert!(metadata.description.is_none());
    }

    #[test]
    fn test_long_description_truncated() {
        let body = "word ".repeat(100);
        let metadata = extract_metadata(&format!("# T\n{body}"));
        let description = metadata.description.unwrap();
        assert!(description.ends_with("..."));
        assert!(description.chars().count() <= DESCRIPTION_MAX_CHARS + 3);
    }

    #[test]
    fn test_long_title_fits_limit_with_ellipsis() {
        let heading = "Scope ".repeat(30);
        let metadata = extract_metadata(&format!("# {}\nBody.", heading.trim_end()));
        let title = metadata.title.unwrap();
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 116);
        assert!(title.chars().count() <= METADATA_TITLE_MAX_CHARS);
    }

    #[test]
    fn test_reading_minutes() {
        assert_eq!(extract_metadata("one two three").reading_minutes, 1);
        let long = "w ".repeat(401);
        assert_eq!(extract_metadata(&long).reading_minutes, 3);
    }
}
