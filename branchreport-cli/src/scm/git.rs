// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::errors::SubcommandErrors;
use crate::scm::Scm;
use anyhow::Result;
use log::trace;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::info_span;

const LATEST_COMMIT_FORMAT: &str = "--format=commit %h%nAuthor: %an <%ae>%nDate:   %ad%nSubject: %s";
const RANGE_LOG_FORMAT: &str = "--format=%h %s (%an, %ad)";

pub struct GitScm {
    project_dir: PathBuf,
}

impl GitScm {
    #[must_use]
    pub fn new(project_dir: PathBuf) -> Self {
        Self { project_dir }
    }

    fn spawn(&self, args: &[&str]) -> Result<Output> {
        // Paths with non-ASCII characters would otherwise come back octal-escaped and quoted.
        let mut full_args = vec!["-c", "core.quotePath=false"];
        full_args.extend_from_slice(args);

        let output = info_span!(
            "git",
            subcommand = true,
            subcommand_binary = "git",
            subcommand_args = ?args,
        )
        .in_scope(|| {
            Command::new("git")
                .args(&full_args)
                .current_dir(&self.project_dir)
                .output()
        })
        .map_err(|e| SubcommandErrors::UnableToStart {
            command: format!("git {}", args.join(" ")),
            error: e,
        })?;
        trace!(
            "git {} exited with {:?}, {} bytes of output",
            args.join(" "),
            output.status,
            output.stdout.len()
        );
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.spawn(args)?;

        if !output.status.success() {
            return Err(SubcommandErrors::SubcommandFailed {
                command: format!("git {}", args.join(" ")),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }

        // Diff bodies can carry arbitrary file content; keep what we can rather than failing on a latin-1 file.
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Scm for GitScm {
    fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn is_inside_work_tree(&self) -> Result<bool> {
        if !self.project_dir.is_dir() {
            return Ok(false);
        }
        let output = self.spawn(&["rev-parse", "--is-inside-work-tree"])?;
        if !output.status.success() {
            return Ok(false);
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    fn get_repository_root(&self) -> Result<PathBuf> {
        let stdout = self.run(&["rev-parse", "--show-toplevel"])?;
        Ok(PathBuf::from(stdout.trim()))
    }

    fn local_branch_exists(&self, name: &str) -> Result<bool> {
        let refname = format!("refs/heads/{name}");
        let output = self.spawn(&["show-ref", "--verify", "--quiet", &refname])?;
        Ok(output.status.success())
    }

    fn get_remote_tracking_branches(&self, name: &str) -> Result<Vec<String>> {
        let pattern = format!("refs/remotes/*/{name}");
        let stdout = self.run(&["for-each-ref", "--format=%(refname)", &pattern])?;

        // for-each-ref's `*` also crosses slashes, so `refs/remotes/origin/feature/dev` matches a search for `dev`;
        // only keep refs where the wildcard covered exactly one remote name.
        let suffix = format!("/{name}");
        let mut branches: Vec<String> = stdout
            .lines()
            .filter(|refname| {
                refname
                    .strip_prefix("refs/remotes/")
                    .and_then(|rest| rest.strip_suffix(suffix.as_str()))
                    .is_some_and(|remote| !remote.is_empty() && !remote.contains('/'))
            })
            .map(String::from)
            .collect();
        branches.sort();
        Ok(branches)
    }

    fn fetch_all_remotes(&self) -> Result<()> {
        self.run(&["fetch", "--all", "--quiet"])?;
        Ok(())
    }

    fn get_latest_commit(&self, revision: &str) -> Result<String> {
        self.run(&[
            "log",
            "-1",
            "--no-color",
            "--date=iso",
            LATEST_COMMIT_FORMAT,
            revision,
            "--",
        ])
    }

    fn count_commits(&self, from: &str, to: &str) -> Result<u64> {
        let range = format!("{from}..{to}");
        let stdout = self.run(&["rev-list", "--count", &range])?;
        stdout.trim().parse::<u64>().map_err(|e| {
            SubcommandErrors::SubcommandOutputParseFailed {
                command: format!("git rev-list --count {range}"),
                error: e.to_string(),
                output: stdout.clone(),
            }
            .into()
        })
    }

    fn get_commit_log(&self, from: &str, to: &str) -> Result<String> {
        let range = format!("{from}..{to}");
        self.run(&[
            "log",
            "--no-color",
            "--date=short",
            RANGE_LOG_FORMAT,
            &range,
            "--",
        ])
    }

    fn get_name_status(&self, from: &str, to: &str) -> Result<String> {
        let range = format!("{from}...{to}");
        self.run(&["diff", "--no-color", "--name-status", "-z", &range, "--"])
    }

    fn get_diff_stat(&self, from: &str, to: &str) -> Result<String> {
        let range = format!("{from}...{to}");
        self.run(&["diff", "--no-color", "--stat", &range, "--"])
    }

    fn get_numstat(&self, from: &str, to: &str) -> Result<String> {
        let range = format!("{from}...{to}");
        self.run(&["diff", "--no-color", "--numstat", &range, "--"])
    }

    fn get_diff(&self, from: &str, to: &str, excluded_paths: &[String]) -> Result<String> {
        let pathspecs: Vec<String> = excluded_paths
            .iter()
            .map(|pattern| format!(":(top,exclude){pattern}"))
            .collect();
        let range = format!("{from}...{to}");
        let mut args = vec!["diff", "--no-color", "--no-ext-diff", range.as_str(), "--", ":/"];
        args.extend(pathspecs.iter().map(String::as_str));
        self.run(&args)
    }

    fn get_merge_base(&self, a: &str, b: &str) -> Result<String> {
        let stdout = self.run(&["merge-base", a, b])?;
        Ok(String::from(stdout.trim()))
    }

    fn get_merge_tree(&self, base: &str, ours: &str, theirs: &str) -> Result<String> {
        self.run(&["merge-tree", base, ours, theirs])
    }
}
