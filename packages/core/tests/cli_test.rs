//! End-to-end tests for the policyhub binary and the segmentation pipeline,
//! using fixture files under `tests/fixtures`.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;

use policyhub_core::cli::load_frameworks;
use policyhub_core::segment_policy;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture(name: &str) -> String {
    let path = fixture(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn policyhub() -> Command {
    Command::cargo_bin("policyhub").unwrap()
}

#[test]
fn test_fixture_segmentation() {
    let content = load_fixture("access_control.md");
    let frameworks = load_frameworks(&fixture("frameworks.yaml")).unwrap();

    let sections = segment_policy(&content, &frameworks);

    let summary: Vec<(u32, &str, Vec<&str>)> = sections
        .iter()
        .map(|s| {
            (
                s.section_number,
                s.title.as_str(),
                s.compliance_tags.iter().map(String::as_str).collect(),
            )
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            (1, "Introduction", vec![]),
            (2, "Purpose", vec!["ISO27001-A.9"]),
            (3, "Account Management", vec!["ISO27001-A.9", "NIST-IA-2"]),
            (5, "Cardholder Data", vec!["PCI-DSS-3.4"]),
            (6, "Exceptions", vec![]),
        ]
    );
    assert_eq!(
        sections[0].content,
        "This policy applies to all employees, contractors and vendors.\n\n"
    );
}

#[test]
fn test_split_text_output() {
    policyhub()
        .arg("split")
        .arg(fixture("access_control.md"))
        .arg("--frameworks")
        .arg(fixture("frameworks.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("[2] Purpose (ISO27001-A.9)"))
        .stdout(predicate::str::contains("[5] Cardholder Data (PCI-DSS-3.4)"))
        .stdout(predicate::str::contains("Empty Heading").not());
}

#[test]
fn test_split_json_output() {
    let output = policyhub()
        .arg("split")
        .arg(fixture("access_control.md"))
        .args(["--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let sections = value.as_array().unwrap();
    assert_eq!(sections.len(), 5);
    assert_eq!(sections[1]["title"], "Purpose");
    assert_eq!(sections[1]["compliance_tags"], serde_json::json!([]));
}

#[test]
fn test_split_plain_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.txt");
    fs::write(&path, "Just plain text, no headings.").unwrap();

    policyhub()
        .arg("split")
        .arg(&path)
        .assert()
        .success()
        .stdout("[1] Policy Content\nJust plain text, no headings.\n\n");
}

#[test]
fn test_split_missing_file() {
    policyhub()
        .args(["split", "does-not-exist.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: IO error"));
}

#[test]
fn test_metadata_command() {
    policyhub()
        .arg("metadata")
        .arg(fixture("access_control.md"))
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Title: Purpose"))
        .stdout(predicate::str::contains(
            "Description: Define how access control is granted and revoked.",
        ))
        .stdout(predicate::str::contains("Headings: 5"));
}

#[test]
fn test_export_text() {
    policyhub()
        .arg("export")
        .arg(fixture("policy.json"))
        .args(["--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Access Control Policy\n"))
        .stdout(predicate::str::contains("Version: v1.2"))
        .stdout(predicate::str::contains("Status: active"));
}

#[test]
fn test_export_json_includes_tagged_sections() {
    let output = policyhub()
        .arg("export")
        .arg(fixture("policy.json"))
        .arg("-f")
        .arg(fixture("frameworks.yaml"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["version"], 1.2);
    assert_eq!(value["sections"][0]["compliance_tags"][0], "ISO27001-A.9");
    assert_eq!(value["sections"][1]["title"], "Review");
}

#[test]
fn test_export_rejects_bad_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"title": "No id"}"#).unwrap();

    policyhub()
        .arg("export")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid policy record"));
}
