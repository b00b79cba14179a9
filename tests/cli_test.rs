mod fixtures;

use fixtures::{build_jar, write_catalog, write_file, APACHE_TEXT};
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn license_scout() -> Command {
    Command::new(env!("CARGO_BIN_EXE_license-scout"))
}

#[test]
fn test_cli_help() {
    let output = license_scout()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("license-scout"));
    assert!(stdout.contains("--path"));
    assert!(stdout.contains("--licenses"));
    assert!(stdout.contains("--overrides"));
    assert!(stdout.contains("--archive-type"));
    assert!(stdout.contains("--output-file"));
}

#[test]
fn test_cli_missing_required_flags() {
    let output = license_scout().output().expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("required"));
}

#[test]
fn test_cli_invalid_root() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = write_catalog(temp_dir.path());

    let output = license_scout()
        .args(["--path", "/nonexistent/path/that/does/not/exist", "--licenses"])
        .arg(&catalog)
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("does not exist") || stderr.contains("Invalid arguments"));
}

#[test]
fn test_cli_json_to_stdout() {
    let workspace = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let catalog = write_catalog(workspace.path());
    write_file(
        &root.path().join("lib").join("commons.jar"),
        build_jar(&[("META-INF/LICENSE.txt", APACHE_TEXT.as_bytes())]),
    );

    let output = license_scout()
        .arg("--path")
        .arg(root.path())
        .arg("--licenses")
        .arg(&catalog)
        .arg("-q")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["artifacts"][0]["path"], "lib/commons.jar");
    assert_eq!(report["artifacts"][0]["licenses"][0]["spdxId"], "Apache-2.0");
    assert_eq!(report["artifacts"][0]["detectionStatus"], "DETECTED");
}

#[test]
fn test_cli_csv_to_file() {
    let workspace = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let catalog = write_catalog(workspace.path());
    let report_path = workspace.path().join("report.csv");
    write_file(
        &root.path().join("app").join("package.json"),
        r#"{"name": "app", "version": "1.0.0", "license": "GPL-2.0"}"#,
    );

    let output = license_scout()
        .arg("--path")
        .arg(root.path())
        .arg("--licenses")
        .arg(&catalog)
        .args(["--archive-type", "npm", "--format", "csv", "--output-file"])
        .arg(&report_path)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let csv = fs::read_to_string(&report_path).unwrap();
    let row = csv.lines().nth(1).unwrap();
    assert!(row.starts_with("npm,app,1.0.0,app,"));
    assert!(row.contains("DETECTED,NOT_ACCEPTED,GPL-2.0"));
}
