// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use branchreport::cmd::cli::GenerateOptions;
use branchreport::cmd::generate::run;
use branchreport::errors::ReportErrors;
use std::path::Path;
use std::process::{Command, Output};

use crate::common::TestRepo;

#[allow(dead_code)]
mod common;

/// main: a.txt.  dev: one commit on top adding b.txt.
fn small_repo() -> Result<TestRepo> {
    let repo = TestRepo::init()?;
    repo.write("a.txt", "one\n")?;
    repo.commit_all("initial")?;
    repo.checkout_new("dev")?;
    repo.write("b.txt", "two\n")?;
    repo.commit_all("add b")?;
    repo.checkout("main")?;
    Ok(repo)
}

fn options(repo: &Path, output: &Path) -> GenerateOptions {
    GenerateOptions {
        source: String::from("dev"),
        target: String::from("main"),
        output: Some(output.to_path_buf()),
        repo: Some(repo.to_path_buf()),
        fetch: None,
        override_config: None,
    }
}

fn branchreport(args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_branchreport"))
        .args(args)
        .arg("--no-progress")
        .output()?)
}

#[test]
fn malformed_config_outside_repository_is_not_a_repository() -> Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::create_dir_all(dir.path().join(".config"))?;
    std::fs::write(dir.path().join(".config/branchreport.toml"), "fetch = [")?;

    let err = run(&options(dir.path(), &dir.path().join("report.txt"))).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReportErrors>(),
        Some(ReportErrors::NotARepository { .. })
    ));
    assert!(!dir.path().join("report.txt").exists());
    Ok(())
}

#[test]
fn config_read_from_repository_root_in_subdirectory() -> Result<()> {
    let repo = small_repo()?;
    // Fetching from this remote fails, so the run only succeeds when the root config's `skip` is honoured.
    let missing = repo.path().join("no-such-remote");
    repo.git(&["remote", "add", "origin", &missing.to_string_lossy()])?;
    repo.write(".config/branchreport.toml", "fetch = \"skip\"\n")?;
    repo.write("nested/keep.txt", "x\n")?;

    let out = tempfile::tempdir()?;
    let output = out.path().join("report.txt");
    let report = run(&options(&repo.path().join("nested"), &output))?;
    assert_eq!(report.summary.commits_ahead, 1);
    assert!(output.exists());
    Ok(())
}

#[test]
fn exit_zero_when_report_written() -> Result<()> {
    let repo = small_repo()?;
    let out = tempfile::tempdir()?;
    let output = out.path().join("report.txt");

    let result = branchreport(&[
        "dev",
        "main",
        &output.to_string_lossy(),
        "-C",
        &repo.path().to_string_lossy(),
        "--fetch",
        "skip",
    ])?;
    assert_eq!(result.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&result.stdout).contains("Report written to: "));
    assert!(output.exists());
    Ok(())
}

#[test]
fn exit_one_outside_repository() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("report.txt");

    let result = branchreport(&[
        "dev",
        "main",
        &output.to_string_lossy(),
        "-C",
        &dir.path().to_string_lossy(),
    ])?;
    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("error: "));
    assert!(stderr.contains("is not inside a git working tree"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn exit_one_for_missing_branch() -> Result<()> {
    let repo = small_repo()?;
    let out = tempfile::tempdir()?;
    let output = out.path().join("report.txt");

    let result = branchreport(&[
        "nope",
        "main",
        &output.to_string_lossy(),
        "-C",
        &repo.path().to_string_lossy(),
        "--fetch",
        "skip",
    ])?;
    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("branch 'nope' does not exist"));
    assert!(!output.exists());
    Ok(())
}
