// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::{Context as _, Result};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::info_span;

use crate::cmd::cli::FetchMode;
use crate::cmd::ui::UiStage;
use crate::errors::ReportErrors;
use crate::scm::Scm;

pub mod parse;
pub mod render;

pub const DEFAULT_SOURCE_BRANCH: &str = "dev";
pub const DEFAULT_TARGET_BRANCH: &str = "main";

/// Paths left out of the detailed diff: lock files, logs, dependency directories and environment files.  Patterns are
/// git pathspec globs, where `*` also matches `/`.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "*.lock",
    "*-lock.json",
    "*-lock.yaml",
    "*.log",
    "*node_modules/*",
    "*.env",
    "*.env.*",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub source_ref: String,
    pub target_ref: String,
    pub output_path: PathBuf,
    pub requested_at: OffsetDateTime,
}

impl ComparisonRequest {
    /// Builds a request, filling in the default branches and a timestamped output file name for anything omitted.
    pub fn new(
        source_ref: Option<String>,
        target_ref: Option<String>,
        output_path: Option<PathBuf>,
        requested_at: OffsetDateTime,
    ) -> Result<Self> {
        let output_path = match output_path {
            Some(path) => path,
            None => default_output_path(requested_at)?,
        };
        Ok(Self {
            source_ref: source_ref.unwrap_or_else(|| String::from(DEFAULT_SOURCE_BRANCH)),
            target_ref: target_ref.unwrap_or_else(|| String::from(DEFAULT_TARGET_BRANCH)),
            output_path,
            requested_at,
        })
    }
}

/// `branch-changes-YYYYMMDD-HHMMSS.txt` for the given instant.
pub fn default_output_path(at: OffsetDateTime) -> Result<PathBuf> {
    let stamp = at.format(format_description!(
        "[year][month][day]-[hour][minute][second]"
    ))?;
    Ok(PathBuf::from(format!("branch-changes-{stamp}.txt")))
}

/// Current local time, or UTC when the local offset can't be determined (eg. on some multi-threaded unix processes).
#[must_use]
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub excluded_paths: Vec<String>,
    pub fetch_mode: FetchMode,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            excluded_paths: DEFAULT_EXCLUDED_PATHS
                .iter()
                .map(|p| String::from(*p))
                .collect(),
            fetch_mode: FetchMode::default(),
        }
    }
}

/// A branch name as requested, and the fully qualified ref it resolved to (`refs/heads/...` or `refs/remotes/...`).
/// The qualified ref is what gets passed to git, so a tag with the same name can't shadow the branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRef {
    pub name: String,
    pub revision: String,
}

impl ResolvedRef {
    #[must_use]
    pub fn local(name: &str) -> Self {
        Self {
            name: String::from(name),
            revision: format!("refs/heads/{name}"),
        }
    }

    /// The revision without its `refs/heads/` or `refs/remotes/` prefix, eg. `origin/dev`.
    #[must_use]
    pub fn short_revision(&self) -> &str {
        self.revision
            .strip_prefix("refs/heads/")
            .or_else(|| self.revision.strip_prefix("refs/remotes/"))
            .unwrap_or(&self.revision)
    }
}

impl fmt::Display for ResolvedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.short_revision();
        if self.name == short {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({short})", self.name)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportSection {
    pub title: String,
    pub body: String,
}

impl ReportSection {
    fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SummaryStats {
    pub commits_ahead: u64,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_removed: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictAnalysis {
    pub merge_base: String,
    pub has_conflicts: bool,
    pub conflicting_paths: BTreeSet<String>,
}

#[derive(Clone, Debug)]
pub struct Report {
    pub repository: String,
    pub generated_on: OffsetDateTime,
    pub source: ResolvedRef,
    pub target: ResolvedRef,
    pub sections: Vec<ReportSection>,
    pub summary: SummaryStats,
    pub conflicts: ConflictAnalysis,
    pub output_path: PathBuf,
}

/// Validates the request, queries the repository and writes the complete report to `request.output_path`.
///
/// Nothing is written unless every query succeeded; the first failing query aborts the whole run.
pub fn generate_report<S: Scm>(
    scm: &S,
    request: &ComparisonRequest,
    config: &ReportConfig,
) -> Result<Report> {
    let report = build_report(scm, request, config)?;
    info_span!(
        "write_report",
        ui_stage = Into::<u64>::into(UiStage::WriteReport),
    )
    .in_scope(|| write_report(&report))?;
    info!("report written to {:?}", report.output_path);
    Ok(report)
}

/// Runs every query for the report and assembles the sections in their fixed order, without touching the output file.
pub fn build_report<S: Scm>(
    scm: &S,
    request: &ComparisonRequest,
    config: &ReportConfig,
) -> Result<Report> {
    let (source, target) = info_span!(
        "validate",
        ui_stage = Into::<u64>::into(UiStage::Validate),
    )
    .in_scope(|| validate(scm, request))?;
    info!("comparing {source} against {target}");

    info_span!(
        "fetch_remotes",
        ui_stage = Into::<u64>::into(UiStage::FetchRemotes),
    )
    .in_scope(|| fetch_remotes(scm, config.fetch_mode))?;

    prepare_output_directory(&request.output_path)?;

    let repository = repository_name(&scm.get_repository_root()?);

    let status = info_span!(
        "branch_status",
        ui_stage = Into::<u64>::into(UiStage::CollectBranchStatus),
    )
    .in_scope(|| -> Result<_> {
        Ok(render::branch_status(
            &source,
            &scm.get_latest_commit(&source.revision)?,
            &target,
            &scm.get_latest_commit(&target.revision)?,
        ))
    })?;

    let (commits_ahead, commits) = info_span!(
        "commits",
        ui_stage = Into::<u64>::into(UiStage::CollectCommits),
    )
    .in_scope(|| -> Result<_> {
        let count = scm.count_commits(&target.revision, &source.revision)?;
        let log = if count == 0 {
            String::new()
        } else {
            scm.get_commit_log(&target.revision, &source.revision)?
        };
        Ok((count, render::commits(count, &log)))
    })?;
    debug!("{commits_ahead} commits to merge");

    let (file_changes, stat, diff, line_counts) = info_span!(
        "changes",
        ui_stage = Into::<u64>::into(UiStage::CollectChanges),
    )
    .in_scope(|| -> Result<_> {
        let file_changes =
            parse::parse_name_status(&scm.get_name_status(&target.revision, &source.revision)?);
        let stat = scm.get_diff_stat(&target.revision, &source.revision)?;
        let diff = scm.get_diff(
            &target.revision,
            &source.revision,
            &config.excluded_paths,
        )?;
        let line_counts =
            parse::parse_numstat(&scm.get_numstat(&target.revision, &source.revision)?);
        Ok((file_changes, stat, diff, line_counts))
    })?;

    let conflicts = info_span!(
        "conflicts",
        ui_stage = Into::<u64>::into(UiStage::AnalyzeConflicts),
    )
    .in_scope(|| analyze_conflicts(scm, &source, &target))?;

    let summary = SummaryStats {
        commits_ahead,
        files_changed: parse::count_distinct_paths(&file_changes),
        lines_added: line_counts.added,
        lines_removed: line_counts.removed,
    };
    debug!("summary: {summary:?}");

    let sections = vec![
        ReportSection::new("BRANCH STATUS", status),
        ReportSection::new(
            format!("COMMITS TO BE MERGED ({} -> {})", source.name, target.name),
            commits,
        ),
        ReportSection::new("FILES CHANGED", render::file_changes(&file_changes)),
        ReportSection::new("CHANGE STATISTICS", stat),
        ReportSection::new("DETAILED CHANGES", diff),
        ReportSection::new("MERGE CONFLICT ANALYSIS", render::conflicts(&conflicts)),
        ReportSection::new("SUMMARY", render::summary(&summary)),
    ];

    Ok(Report {
        repository,
        generated_on: request.requested_at,
        source,
        target,
        sections,
        summary,
        conflicts,
        output_path: request.output_path.clone(),
    })
}

pub fn write_report(report: &Report) -> Result<()> {
    let text = render::report(report)?;
    fs::write(&report.output_path, text)
        .with_context(|| format!("writing report to {:?}", report.output_path))?;
    Ok(())
}

/// Fails with [`ReportErrors::NotARepository`] unless the scm's project directory is inside a work tree.
pub fn ensure_repository<S: Scm>(scm: &S) -> Result<()> {
    if scm.is_inside_work_tree()? {
        Ok(())
    } else {
        Err(ReportErrors::NotARepository {
            path: scm.project_dir().to_path_buf(),
        }
        .into())
    }
}

fn validate<S: Scm>(scm: &S, request: &ComparisonRequest) -> Result<(ResolvedRef, ResolvedRef)> {
    ensure_repository(scm)?;
    let source = resolve_branch(scm, &request.source_ref)?;
    let target = resolve_branch(scm, &request.target_ref)?;
    Ok((source, target))
}

/// A local branch is used as-is; otherwise the first remote-tracking branch of the same name stands in for it.
pub fn resolve_branch<S: Scm>(scm: &S, name: &str) -> Result<ResolvedRef> {
    if scm.local_branch_exists(name)? {
        return Ok(ResolvedRef::local(name));
    }

    let remote_branches = scm.get_remote_tracking_branches(name)?;
    match remote_branches.into_iter().next() {
        Some(revision) => {
            info!("branch {name:?} is not local; using remote-tracking branch {revision:?}");
            Ok(ResolvedRef {
                name: String::from(name),
                revision,
            })
        }
        None => Err(ReportErrors::BranchNotFound {
            branch: String::from(name),
        }
        .into()),
    }
}

fn fetch_remotes<S: Scm>(scm: &S, mode: FetchMode) -> Result<()> {
    match mode {
        FetchMode::Skip => {
            debug!("remote fetch skipped");
            Ok(())
        }
        FetchMode::Required => scm
            .fetch_all_remotes()
            .context("fetching remotes failed; use --fetch best-effort to compare local refs anyway"),
        FetchMode::BestEffort => {
            if let Err(e) = scm.fetch_all_remotes() {
                warn!("fetching remotes failed, comparing against the refs already present: {e:#}");
            }
            Ok(())
        }
    }
}

fn prepare_output_directory(output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("creating output directory {parent:?}");
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {parent:?}"))?;
        }
    }
    Ok(())
}

fn analyze_conflicts<S: Scm>(
    scm: &S,
    source: &ResolvedRef,
    target: &ResolvedRef,
) -> Result<ConflictAnalysis> {
    let merge_base = scm.get_merge_base(&target.revision, &source.revision)?;
    debug!("merge base of {target} and {source} is {merge_base}");
    let merge_tree = scm.get_merge_tree(&merge_base, &target.revision, &source.revision)?;
    let found = parse::parse_merge_tree(&merge_tree);
    if found.has_conflict_markers {
        warn!(
            "potential merge conflicts between {source} and {target}: {:?}",
            found.paths
        );
    }
    Ok(ConflictAnalysis {
        merge_base,
        has_conflicts: found.has_conflict_markers,
        conflicting_paths: found.paths,
    })
}

fn repository_name(root: &Path) -> String {
    root.file_name().map_or_else(
        || root.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
