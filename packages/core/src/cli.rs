//! Command-line interface for offline policy processing.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;

use crate::error::Result;
use crate::export::{export_policy, ExportFormat};
use crate::metadata::extract_metadata;
use crate::record::{decode_frameworks, decode_policy};
use crate::tagging::segment_policy;
use crate::types::{ComplianceFramework, PolicySection};

/// PolicyHub - Split, tag and export security policy documents.
#[derive(Parser)]
#[command(name = "policyhub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a policy file into sections and tag them.
    Split {
        /// Policy content file (markdown or plain text)
        file: PathBuf,

        /// YAML or JSON list of compliance framework controls
        #[arg(short, long)]
        frameworks: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
    },

    /// Show title, description and word statistics of a policy file.
    Metadata {
        /// Policy content file
        file: PathBuf,
    },

    /// Export a policy record (JSON) with its sections.
    Export {
        /// Policy record file
        policy: PathBuf,

        /// YAML or JSON list of compliance framework controls
        #[arg(short, long)]
        frameworks: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            file,
            frameworks,
            format,
        } => split_command(&file, frameworks.as_deref(), format),
        Commands::Metadata { file } => metadata_command(&file),
        Commands::Export {
            policy,
            frameworks,
            format,
        } => export_command(&policy, frameworks.as_deref(), format),
    }
}

/// Load compliance frameworks from a YAML (or JSON) file.
pub fn load_frameworks(path: &Path) -> Result<Vec<ComplianceFramework>> {
    let text = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_yaml_ng::from_str(&text)?;
    decode_frameworks(value)
}

fn load_optional_frameworks(path: Option<&Path>) -> Result<Vec<ComplianceFramework>> {
    match path {
        Some(path) => load_frameworks(path),
        None => Ok(Vec::new()),
    }
}

/// Execute the split command.
fn split_command(file: &Path, frameworks: Option<&Path>, format: ExportFormat) -> Result<()> {
    let content = fs::read_to_string(file)?;
    let frameworks = load_optional_frameworks(frameworks)?;

    let sections = segment_policy(&content, &frameworks);
    tracing::info!(file = %file.display(), sections = sections.len(), "policy split");

    print!("{}", render_sections(&sections, format)?);
    Ok(())
}

/// Render sections for terminal output.
pub fn render_sections(sections: &[PolicySection], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(sections)?)),
        ExportFormat::Yaml => Ok(serde_yaml_ng::to_string(sections)?),
        ExportFormat::Text => {
            let mut out = String::new();
            for section in sections {
                out.push_str(&format!("[{}] {}", section.section_number, section.title));
                if !section.compliance_tags.is_empty() {
                    out.push_str(&format!(" ({})", section.compliance_tags.join(", ")));
                }
                out.push('\n');
                out.push_str(&section.content);
                if !section.content.ends_with('\n') {
                    out.push('\n');
                }
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// Execute the metadata command.
fn metadata_command(file: &Path) -> Result<()> {
    let content = fs::read_to_string(file)?;
    let metadata = extract_metadata(&content);

    let none = || style("(none)").dim().to_string();
    println!(
        "  Title: {}",
        metadata
            .title
            .as_deref()
            .map(|t| style(t).green().to_string())
            .unwrap_or_else(none)
    );
    println!(
        "  Description: {}",
        metadata.description.as_deref().map(str::to_string).unwrap_or_else(none)
    );
    println!("  Words: {}", metadata.word_count);
    println!("  Headings: {}", metadata.heading_count);
    println!("  Reading time: {} min", metadata.reading_minutes);

    Ok(())
}

/// Execute the export command.
fn export_command(policy_file: &Path, frameworks: Option<&Path>, format: ExportFormat) -> Result<()> {
    let text = fs::read_to_string(policy_file)?;
    let policy = decode_policy(serde_json::from_str(&text)?)?;
    let frameworks = load_optional_frameworks(frameworks)?;

    let sections = segment_policy(&policy.content, &frameworks);
    let out = export_policy(&policy, &sections, format)?;
    print!("{out}");
    if !out.ends_with('\n') {
        println!();
    }
    Ok(())
}
