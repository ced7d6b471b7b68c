//! Export of policies to downloadable formats.

use chrono::{DateTime, Utc};
use serde::Serialize;
use textwrap::{fill, Options};
use uuid::Uuid;

use crate::config::TEXT_WRAP_WIDTH;
use crate::error::Result;
use crate::types::{Policy, PolicySection, PolicyStatus, VersionNumber};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Yaml,
    Text,
}

impl ExportFormat {
    /// File extension for downloads.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Text => "txt",
        }
    }
}

/// Stable export shape of a policy with its sections.
#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    id: Uuid,
    title: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
    #[serde(rename = "type")]
    policy_type: &'a str,
    status: PolicyStatus,
    version: VersionNumber,
    version_label: String,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
    author_id: &'a str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    content: &'a str,
    sections: &'a [PolicySection],
}

impl<'a> ExportDocument<'a> {
    fn new(policy: &'a Policy, sections: &'a [PolicySection]) -> Self {
        Self {
            id: policy.id,
            title: &policy.title,
            description: &policy.description,
            policy_type: &policy.policy_type,
            status: policy.status,
            version: policy.version,
            version_label: policy.version.label(),
            tags: &policy.tags,
            author_id: &policy.author_id,
            created_at: policy.created_at,
            updated_at: policy.updated_at,
            content: &policy.content,
            sections,
        }
    }
}

/// Render a policy and its sections in the requested format.
pub fn export_policy(
    policy: &Policy,
    sections: &[PolicySection],
    format: ExportFormat,
) -> Result<String> {
    let document = ExportDocument::new(policy, sections);
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&document)?),
        ExportFormat::Yaml => Ok(serde_yaml_ng::to_string(&document)?),
        ExportFormat::Text => Ok(render_text(policy)),
    }
}

/// Plain-text rendering: a header block followed by the content.
fn render_text(policy: &Policy) -> String {
    let mut out = String::new();

    out.push_str(&policy.title);
    out.push('\n');
    out.push_str(&"=".repeat(policy.title.chars().count()));
    out.push_str("\n\n");

    out.push_str(&format!("Type: {}\n", policy.policy_type));
    out.push_str(&format!("Status: {}\n", policy.status));
    out.push_str(&format!("Version: {}\n", policy.version.label()));
    if !policy.tags.is_empty() {
        out.push_str(&format!("Tags: {}\n", policy.tags.join(", ")));
    }
    out.push_str(&format!(
        "Last updated: {}\n",
        policy.updated_at.format("%Y-%m-%d")
    ));

    if !policy.description.trim().is_empty() {
        out.push('\n');
        out.push_str(&wrap_lines(policy.description.trim()));
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&wrap_lines(policy.content.trim_end()));
    out.push('\n');
    out
}

/// Wrap each overlong line on its own so headings and list items keep their lines.
fn wrap_lines(text: &str) -> String {
    let options = Options::new(TEXT_WRAP_WIDTH).break_words(false);
    text.lines()
        .map(|line| {
            if line.chars().count() > TEXT_WRAP_WIDTH {
                fill(line, &options)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
