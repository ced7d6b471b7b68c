//! Heading rules used to find section boundaries.

use regex::Regex;
use std::sync::LazyLock;

/// Markdown-style heading: one to three `#`, ASCII spaces or tabs, then the title.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,3})[ \t]+(\S.*)$").expect("valid regex"));

/// Numbered heading: dot-separated ASCII digit groups, a literal dot, spaces or tabs, then the title.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)*)\.[ \t]+(\S.*)$").expect("valid regex"));

/// Trait for heading detection rules.
///
/// Rules are evaluated in registration order; the first rule that matches a
/// line decides its title and later rules are not consulted.
pub trait HeadingRule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Return the heading title if `line` is a heading under this rule.
    fn match_heading(&self, line: &str) -> Option<String>;
}

/// `# Title`, `## Title`, `### Title`. Four or more hashes are body text.
pub struct MarkdownHeading;

impl HeadingRule for MarkdownHeading {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn match_heading(&self, line: &str) -> Option<String> {
        capture_title(&MARKDOWN_HEADING, line)
    }
}

/// `1. Title`, `2.3. Title`, `4.1.2. Title`.
pub struct NumberedHeading;

impl HeadingRule for NumberedHeading {
    fn name(&self) -> &'static str {
        "numbered"
    }

    fn match_heading(&self, line: &str) -> Option<String> {
        capture_title(&NUMBERED_HEADING, line)
    }
}

/// Extract capture group 2 as a trimmed title.
fn capture_title(pattern: &Regex, line: &str) -> Option<String> {
    let title = pattern.captures(line)?.get(2)?.as_str().trim_end();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_levels() {
        assert_eq!(MarkdownHeading.match_heading("# Purpose"), Some("Purpose".to_string()));
        assert_eq!(MarkdownHeading.match_heading("## Scope"), Some("Scope".to_string()));
        assert_eq!(
            MarkdownHeading.match_heading("###   Roles and duties"),
            Some("Roles and duties".to_string())
        );
    }

    #[test]
    fn test_markdown_too_deep() {
        assert_eq!(MarkdownHeading.match_heading("#### Deep heading"), None);
        assert_eq!(MarkdownHeading.match_heading("###### Deep heading"), None);
    }

    #[test]
    fn test_markdown_requires_space_and_text() {
        assert_eq!(MarkdownHeading.match_heading("#Purpose"), None);
        assert_eq!(MarkdownHeading.match_heading("#   "), None);
        assert_eq!(MarkdownHeading.match_heading("#"), None);
        assert_eq!(MarkdownHeading.match_heading(" # Indented"), None);
    }

    #[test]
    fn test_markdown_trims_trailing_whitespace() {
        assert_eq!(
            MarkdownHeading.match_heading("# Purpose  \r"),
            Some("Purpose".to_string())
        );
    }

    #[test]
    fn test_numbered_headings() {
        assert_eq!(NumberedHeading.match_heading("1. Purpose"), Some("Purpose".to_string()));
        assert_eq!(NumberedHeading.match_heading("1.1. Scope"), Some("Scope".to_string()));
        assert_eq!(
            NumberedHeading.match_heading("2.3.4. Key rotation"),
            Some("Key rotation".to_string())
        );
    }

    #[test]
    fn test_numbered_requires_trailing_dot_and_text() {
        assert_eq!(NumberedHeading.match_heading("1.5"), None);
        assert_eq!(NumberedHeading.match_heading("1.5."), None);
        assert_eq!(NumberedHeading.match_heading("1.1 Scope"), None);
        assert_eq!(NumberedHeading.match_heading("1..2. Broken"), None);
        assert_eq!(NumberedHeading.match_heading("a. Lettered"), None);
    }

    #[test]
    fn test_numbered_requires_ascii_digits() {
        assert_eq!(NumberedHeading.match_heading("\u{0663}. Scope"), None);
        assert_eq!(NumberedHeading.match_heading("1.\u{0662}. Scope"), None);
        assert_eq!(NumberedHeading.match_heading("\u{FF11}. Scope"), None);
    }

    #[test]
    fn test_separator_must_be_space_or_tab() {
        assert_eq!(NumberedHeading.match_heading("1.\u{00A0}Scope"), None);
        assert_eq!(MarkdownHeading.match_heading("#\u{00A0}Scope"), None);
        assert_eq!(MarkdownHeading.match_heading("#\u{2003}Scope"), None);
        assert_eq!(NumberedHeading.match_heading("1.\tScope"), Some("Scope".to_string()));
        assert_eq!(MarkdownHeading.match_heading("##\tScope"), Some("Scope".to_string()));
    }

    #[test]
    fn test_deep_markdown_is_not_numbered_either() {
        assert_eq!(NumberedHeading.match_heading("###### Deep heading"), None);
    }
}
