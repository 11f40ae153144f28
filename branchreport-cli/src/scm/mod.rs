// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use std::path::{Path, PathBuf};

pub mod git;

/// The version-control queries a branch report is composed from.
///
/// Every method maps onto a single invocation of the underlying tool and returns its textual output (or a value
/// trivially derived from it); none of them compare anything themselves.  Range-style methods take `from` and `to` and
/// describe what `to` has that `from` does not: commits as in `git log from..to`, and file changes as in
/// `git diff from...to` (since the merge base), so an already-merged `to` has no changes.
pub trait Scm {
    fn project_dir(&self) -> &Path;
    /// Whether the project directory is inside a working tree.  `Ok(false)` rather than an error when it isn't.
    fn is_inside_work_tree(&self) -> Result<bool>;
    fn get_repository_root(&self) -> Result<PathBuf>;
    fn local_branch_exists(&self, name: &str) -> Result<bool>;
    /// Remote-tracking branches named `name` on any remote, as `<remote>/<name>`, sorted.
    /// Sorted `refs/remotes/<remote>/<name>` refnames, one per remote that has a branch called `name`.
    fn get_remote_tracking_branches(&self, name: &str) -> Result<Vec<String>>;
    fn fetch_all_remotes(&self) -> Result<()>;
    /// Hash, author, date and subject of the commit `revision` points at.
    fn get_latest_commit(&self, revision: &str) -> Result<String>;
    fn count_commits(&self, from: &str, to: &str) -> Result<u64>;
    fn get_commit_log(&self, from: &str, to: &str) -> Result<String>;
    /// NUL-separated `--name-status -z` listing, so paths come back unquoted.
    fn get_name_status(&self, from: &str, to: &str) -> Result<String>;
    fn get_diff_stat(&self, from: &str, to: &str) -> Result<String>;
    fn get_numstat(&self, from: &str, to: &str) -> Result<String>;
    /// Unified diff, leaving out any path matching one of `excluded_paths`.
    fn get_diff(&self, from: &str, to: &str, excluded_paths: &[String]) -> Result<String>;
    fn get_merge_base(&self, a: &str, b: &str) -> Result<String>;
    /// Three-way merge simulation of `ours` and `theirs` against `base`, with conflict markers inline.
    fn get_merge_tree(&self, base: &str, ours: &str, theirs: &str) -> Result<String>;
}
