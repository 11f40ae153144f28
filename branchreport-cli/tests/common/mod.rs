// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use branchreport::cmd::cli::FetchMode;
use branchreport::report::{ComparisonRequest, Report, ReportConfig, generate_report};
use branchreport::scm::git::GitScm;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use thiserror::Error;
use time::macros::datetime;

#[derive(Error, Debug)]
pub enum TestError {
    #[error(
        "test sub-command '{command:?}' failed with exit code {status:?} and stderr {stderr:?})"
    )]
    SubcommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Runs git with a fixed identity and no signing, so commits work on any machine.
pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(["-c", "commit.gpgsign=false", "-c", "core.autocrlf=false"])
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "author@example.com")
        .env("GIT_COMMITTER_NAME", "Test Committer")
        .env("GIT_COMMITTER_EMAIL", "committer@example.com")
        .output()?;

    if !output.status.success() {
        return Err(TestError::SubcommandFailed {
            command: format!("git {}", args.join(" ")),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// A throw-away repository with `main` checked out.
pub struct TestRepo {
    pub dir: TempDir,
}

impl TestRepo {
    pub fn init() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("branchreport-test").tempdir()?;
        git(dir.path(), &["init", "-q"])?;
        git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"])?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self, args: &[&str]) -> Result<String> {
        git(self.path(), args)
    }

    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> Result<()> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn remove(&self, relative: &str) -> Result<()> {
        fs::remove_file(self.path().join(relative))?;
        Ok(())
    }

    pub fn commit_all(&self, message: &str) -> Result<()> {
        self.git(&["add", "-A"])?;
        self.git(&["commit", "-q", "-m", message])?;
        Ok(())
    }

    pub fn checkout(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", "-q", branch])?;
        Ok(())
    }

    pub fn checkout_new(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", "-q", "-b", branch])?;
        Ok(())
    }
}

pub fn request(source: &str, target: &str, output_path: PathBuf) -> ComparisonRequest {
    ComparisonRequest {
        source_ref: String::from(source),
        target_ref: String::from(target),
        output_path,
        requested_at: datetime!(2024-03-05 14:07:09 UTC),
    }
}

pub fn offline() -> ReportConfig {
    ReportConfig {
        fetch_mode: FetchMode::Skip,
        ..ReportConfig::default()
    }
}

/// Generates a report for `project_dir` into a fresh directory, returning it with the report text.
pub fn generate(
    project_dir: &Path,
    source: &str,
    target: &str,
    config: &ReportConfig,
) -> Result<(TempDir, Report, String)> {
    let out_dir = tempfile::Builder::new().prefix("branchreport-out").tempdir()?;
    let output_path = out_dir.path().join("report.txt");
    let report = generate_report(
        &GitScm::new(project_dir.to_path_buf()),
        &request(source, target, output_path.clone()),
        config,
    )?;
    let text = fs::read_to_string(&output_path)?;
    Ok((out_dir, report, text))
}

/// Body of the `=== title ===` section of a rendered report.
pub fn section<'a>(text: &'a str, title: &str) -> &'a str {
    let heading = format!("=== {title} ===\n");
    let start = text.find(&heading).map_or(text.len(), |i| i + heading.len());
    let rest = &text[start..];
    let end = rest.find("\n=== ").map_or(rest.len(), |i| i + 1);
    rest[..end].trim_end_matches('\n')
}
