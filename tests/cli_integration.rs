//! Integration tests for the CLI
//!
//! Drives the built binary end-to-end: apply, check, and list against a
//! temporary project tree.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const BINARY: &str = env!("CARGO_BIN_EXE_gradle-patcher");

/// Helper to create a test project with an advice file
fn setup_test_project() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::write(dir.path().join("settings.gradle"), "include ':app'\n").unwrap();

    fs::write(
        dir.path().join("build.gradle"),
        r#"dependencies {
    api project(':b')
    testImplementation('c:c:2') { because 'covered elsewhere' }
}
"#,
    )
    .unwrap();

    fs::write(
        dir.path().join("advice.json"),
        r#"{
  "meta": { "name": "cli-test" },
  "advice": [
    { "kind": "change", "coordinates": ":b", "from": "api", "to": "compileOnly" },
    { "kind": "remove", "coordinates": "c:c:2", "from": "testImplementation" }
  ]
}"#,
    )
    .unwrap();

    dir
}

fn run(project: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(BINARY)
        .args(args)
        .current_dir(project)
        .output()
        .expect("failed to run gradle-patcher");
    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        output.status.success(),
    )
}

#[test]
fn test_apply_rewrites_scripts() {
    let project = setup_test_project();
    let (stdout, stderr, success) = run(
        project.path(),
        &[
            "apply",
            "--project",
            project.path().to_str().unwrap(),
            "--advice",
            project.path().join("advice.json").to_str().unwrap(),
        ],
    );

    assert!(success, "apply failed: {stdout}\n{stderr}");
    assert!(stdout.contains("Summary:"));
    assert!(stdout.contains("1 rewritten"));

    let content = fs::read_to_string(project.path().join("build.gradle")).unwrap();
    assert!(content.contains("compileOnly project(':b')"));
    assert!(!content.contains("testImplementation"));
}

#[test]
fn test_apply_dry_run_leaves_files_alone() {
    let project = setup_test_project();
    let before = fs::read_to_string(project.path().join("build.gradle")).unwrap();

    let (stdout, _, success) = run(
        project.path(),
        &[
            "apply",
            "--dry-run",
            "--diff",
            "--project",
            project.path().to_str().unwrap(),
            "--advice",
            project.path().join("advice.json").to_str().unwrap(),
        ],
    );

    assert!(success);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("Would rewrite"));
    // The diff shows the change without applying it
    assert!(stdout.contains("+    compileOnly project(':b')"));

    let after = fs::read_to_string(project.path().join("build.gradle")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_apply_exits_nonzero_on_parse_failure() {
    let project = setup_test_project();
    fs::write(
        project.path().join("build.gradle"),
        "dependencies {\n    api 'broken\n}\n",
    )
    .unwrap();

    let (_, stderr, success) = run(
        project.path(),
        &[
            "apply",
            "--project",
            project.path().to_str().unwrap(),
            "--advice",
            project.path().join("advice.json").to_str().unwrap(),
        ],
    );

    assert!(!success);
    assert!(stderr.contains("parse errors"));
}

#[test]
fn test_check_reports_without_writing() {
    let project = setup_test_project();
    let before = fs::read_to_string(project.path().join("build.gradle")).unwrap();

    let (stdout, _, success) = run(
        project.path(),
        &[
            "check",
            "--project",
            project.path().to_str().unwrap(),
            "--advice",
            project.path().join("advice.json").to_str().unwrap(),
        ],
    );

    assert!(success);
    assert!(stdout.contains("Advice Check Report"));
    assert!(stdout.contains("would be rewritten"));

    let after = fs::read_to_string(project.path().join("build.gradle")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_list_shows_declarations() {
    let project = setup_test_project();
    let (stdout, _, success) = run(
        project.path(),
        &["list", "--project", project.path().to_str().unwrap()],
    );

    assert!(success);
    assert!(stdout.contains("build.gradle"));
    assert!(stdout.contains("api"));
    assert!(stdout.contains("':b'"));
}

#[test]
fn test_help_output() {
    let output = Command::new(BINARY).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("apply"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("list"));
}
