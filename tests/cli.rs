use std::path::Path;

use assert_cmd::Command;
use fs_err as fs;
use predicates::prelude::*;

const CONFIG: &str = r#"[package]
name = "demo"
version = "1.0.0"
authors = ["Demo Author"]
github = "demo"
"#;

const README: &str = "# demo\n\nby Demo Author\n\n## DESCRIPTION:\n\nA demo gem.\n\n## INSTALLATION:\n\n    gem install demo\n";

/// A small gem project without version control.
fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("creating the project dir failed");
    for (file, content) in [
        ("gemkit.toml", CONFIG),
        ("README.md", README),
        ("CHANGES.md", "# CHANGES\n\n## demo 1.0.0 -- 2024-05-01\n\n* First release.\n"),
        ("lib/demo.rb", "module Demo; end\n"),
        ("test/test_demo.rb", "# test\n"),
        ("bin/demo", "#!/usr/bin/env ruby\n"),
        (".gitignore", "*.log\n/pkg\n"),
        ("debug.log", "noise\n"),
    ] {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn gemkit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gemkit").expect("binary exists");
    cmd.arg("-C")
        .arg(dir)
        .env_remove("RUST_LOG")
        .env_remove("VERSION")
        .env("GEMKIT_COLOR", "never");
    cmd
}

#[test]
fn files_lists_package_files() {
    let dir = project();
    gemkit(dir.path())
        .arg("files")
        .assert()
        .success()
        .stdout(predicate::str::contains("lib/demo.rb"))
        .stdout(predicate::str::contains("bin/demo"))
        .stdout(predicate::str::contains("debug.log").not());
}

#[test]
fn files_lists_ignored_files() {
    let dir = project();
    gemkit(dir.path())
        .args(["files", "ignored"])
        .assert()
        .success()
        .stdout("debug.log\n");
}

#[test]
fn missing_config_points_to_the_config_file() {
    let dir = tempfile::tempdir().unwrap();
    gemkit(dir.path())
        .arg("files")
        .assert()
        .failure()
        .stderr(predicate::str::contains("gemkit.toml"));
}

#[test]
fn check_without_version_exits_with_one() {
    let dir = project();
    gemkit(dir.path())
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("expected VERSION=1.0.0"));
}

#[test]
fn check_with_wrong_version_exits_with_two() {
    let dir = project();
    gemkit(dir.path())
        .arg("check")
        .env("VERSION", "0.9.0")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "expected VERSION=1.0.0 but got VERSION=0.9.0",
        ));
}

#[test]
fn check_with_matching_version_succeeds() {
    let dir = project();
    gemkit(dir.path())
        .args(["check", "--expected-version", "1.0.0"])
        .assert()
        .success();
}

#[test]
fn build_writes_the_archive() {
    let dir = project();
    gemkit(dir.path()).arg("build").assert().success();

    assert!(dir.path().join("pkg/demo-1.0.0.tar.gz").is_file());
    let manifest = fs::read_to_string(dir.path().join("demo.manifest.json")).unwrap();
    assert!(manifest.contains("\"lib/demo.rb\""));
    assert!(!manifest.contains("debug.log"));
}

#[test]
fn announce_prints_markdown() {
    let dir = project();
    gemkit(dir.path())
        .arg("announce")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "## [demo](https://github.com/demo/demo)",
        ))
        .stdout(predicate::str::contains("#### demo 1.0.0 -- 2024-05-01"));
}

#[test]
fn clean_dry_run_keeps_files() {
    let dir = project();
    let trash = tempfile::tempdir().unwrap();
    gemkit(dir.path())
        .args(["clean", "--dry-run", "--trash-dir"])
        .arg(trash.path())
        .assert()
        .success();
    assert!(dir.path().join("debug.log").is_file());
    assert!(!trash.path().join("demo").exists());
}
