//! Split engine that turns policy content into numbered sections.

use super::strategy::{HeadingRule, MarkdownHeading, NumberedHeading};
use crate::config::{FALLBACK_SECTION_TITLE, INTRODUCTION_TITLE};
use crate::types::PolicySection;

/// Engine for splitting policy content at heading lines.
///
/// Walks the content line by line, opening a section at every heading and
/// accumulating the lines that follow it. Never fails: content without any
/// heading becomes a single fallback section.
pub struct SplitEngine {
    rules: Vec<Box<dyn HeadingRule>>,
}

impl Default for SplitEngine {
    /// Markdown headings take precedence over numbered headings.
    fn default() -> Self {
        Self::new()
            .with_rule(MarkdownHeading)
            .with_rule(NumberedHeading)
    }
}

/// Section being accumulated.
struct OpenSection {
    number: u32,
    title: String,
    content: String,
}

impl OpenSection {
    fn into_section(self) -> Option<PolicySection> {
        if self.content.trim().is_empty() {
            None
        } else {
            Some(PolicySection::new(self.number, self.title, self.content))
        }
    }
}

impl SplitEngine {
    /// Create an engine without any heading rules.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register a heading rule after the existing ones.
    #[must_use]
    pub fn with_rule(mut self, rule: impl HeadingRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Return the heading title of `line`, using the first rule that matches.
    #[must_use]
    pub fn heading_title(&self, line: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| {
            let title = rule.match_heading(line)?;
            tracing::trace!(rule = rule.name(), title = %title, "heading detected");
            Some(title)
        })
    }

    /// Split content into sections.
    ///
    /// Sections whose body is blank are dropped without renumbering the
    /// sections after them.
    pub fn split(&self, content: &str) -> Vec<PolicySection> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let mut sections = Vec::new();
        let mut current: Option<OpenSection> = None;
        let mut counter: u32 = 0;
        let mut saw_heading = false;

        for line in content.lines() {
            if let Some(title) = self.heading_title(line) {
                saw_heading = true;
                if let Some(section) = current.take().and_then(OpenSection::into_section) {
                    sections.push(section);
                }
                counter += 1;
                current = Some(OpenSection {
                    number: counter,
                    title,
                    content: String::new(),
                });
            } else if let Some(open) = current.as_mut() {
                open.content.push_str(line);
                open.content.push('\n');
            } else if !line.trim().is_empty() && counter == 0 {
                counter = 1;
                current = Some(OpenSection {
                    number: counter,
                    title: INTRODUCTION_TITLE.to_string(),
                    content: format!("{line}\n"),
                });
            }
        }

        if let Some(section) = current.and_then(OpenSection::into_section) {
            sections.push(section);
        }

        if !saw_heading || sections.is_empty() {
            tracing::debug!(
                had_headings = saw_heading,
                "no sections found, using single fallback section"
            );
            return vec![PolicySection::new(1, FALLBACK_SECTION_TITLE, content)];
        }

        sections
    }
}
