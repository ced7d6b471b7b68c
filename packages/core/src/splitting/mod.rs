//! Section splitting for policy documents.
//!
//! Content is split at heading lines (markdown `#`..`###` or numbered
//! `1.`, `1.2.`) into 1-based, numbered sections.

mod engine;
mod strategy;

pub use engine::SplitEngine;
pub use strategy::{HeadingRule, MarkdownHeading, NumberedHeading};

use crate::types::PolicySection;

/// Split content with the default heading rules.
///
/// # Examples
/// ```
/// use policyhub_core::splitting::split_sections;
///
/// let sections = split_sections("# Purpose\nProtect data.\n# Scope\nAll staff.\n");
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[1].title, "Scope");
/// assert_eq!(sections[1].content, "All staff.\n");
/// ```
pub fn split_sections(content: &str) -> Vec<PolicySection> {
    SplitEngine::default().split(content)
}
