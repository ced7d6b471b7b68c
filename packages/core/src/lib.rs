//! PolicyHub core - segmentation, compliance tagging and lifecycle rules for
//! security policy documents.
//!
//! Everything in this crate is synchronous and performs no I/O outside the
//! CLI: callers hand in plain data and get plain data back.
//!
//! # Example
//!
//! ```
//! use policyhub_core::{segment_policy, ComplianceFramework};
//!
//! let frameworks = vec![ComplianceFramework::new("ISO27001", "A.9", ["access control"])];
//! let sections = segment_policy("# Access\nAccess control applies to all.\n", &frameworks);
//!
//! assert_eq!(sections[0].title, "Access");
//! assert_eq!(sections[0].compliance_tags, vec!["ISO27001-A.9"]);
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants and field validation
//! - [`types`]: Policy, version, section and framework types
//! - [`error`]: Error types and Result alias
//! - [`splitting`]: Section splitting at heading lines
//! - [`tagging`]: Keyword-driven compliance tagging
//! - [`lifecycle`]: Review workflow transitions
//! - [`versioning`]: Version numbering and history checks
//! - [`metadata`]: Title/description extraction from content
//! - [`record`]: Decoding of loosely-typed storage rows
//! - [`export`]: JSON, YAML and plain-text export
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod metadata;
pub mod record;
pub mod splitting;
pub mod tagging;
pub mod types;
pub mod versioning;

// Re-export main functions
pub use splitting::split_sections;
pub use tagging::{segment_policy, tag_section};

// Re-export commonly used items
pub use error::{PolicyError, Result};
pub use lifecycle::{apply_transition, Actor, Role, Transition, TransitionKind, TransitionOutcome};
pub use types::{
    ComplianceFramework, NewPolicy, Policy, PolicySection, PolicyStatus, PolicyUpdate,
    PolicyVersion, VersionNumber,
};
