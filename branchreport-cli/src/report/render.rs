// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use std::fmt::Write as _;
use time::macros::format_description;

use super::parse::FileChange;
use super::{ConflictAnalysis, Report, ReportSection, ResolvedRef, SummaryStats};

pub const NO_NEW_COMMITS: &str = "No new commits to merge.";

const TITLE: &str = "Branch Comparison Report";

pub fn report(report: &Report) -> Result<String> {
    let mut out = header(report)?;
    for (i, s) in report.sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&section(s));
    }
    Ok(out)
}

pub fn header(report: &Report) -> Result<String> {
    let generated_on = report.generated_on.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))?;
    let mut out = String::new();
    writeln!(out, "{TITLE}")?;
    writeln!(out, "{}", "=".repeat(TITLE.len()))?;
    writeln!(out, "Generated on: {generated_on}")?;
    writeln!(out, "Repository: {}", report.repository)?;
    writeln!(out, "Source Branch: {}", report.source)?;
    writeln!(out, "Target Branch: {}", report.target)?;
    out.push('\n');
    Ok(out)
}

/// `=== TITLE ===` followed by the body; an empty body leaves just the title line.
#[must_use]
pub fn section(section: &ReportSection) -> String {
    let mut out = format!("=== {} ===\n", section.title);
    let body = section.body.trim_end_matches('\n');
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }
    out
}

#[must_use]
pub fn branch_status(
    source: &ResolvedRef,
    source_commit: &str,
    target: &ResolvedRef,
    target_commit: &str,
) -> String {
    format!(
        "Source branch: {source}\n{}\n\nTarget branch: {target}\n{}\n",
        source_commit.trim_end(),
        target_commit.trim_end(),
    )
}

#[must_use]
pub fn commits(count: u64, log: &str) -> String {
    if count == 0 {
        String::from(NO_NEW_COMMITS)
    } else {
        format!("Total commits: {count}\n\n{}\n", log.trim_end())
    }
}

#[must_use]
pub fn file_changes(changes: &[FileChange]) -> String {
    let width = changes
        .iter()
        .map(|c| c.kind.label().len())
        .max()
        .unwrap_or(0);
    changes
        .iter()
        .map(|c| match &c.previous_path {
            Some(previous) => format!(
                "{:<width$}  {previous} -> {}\n",
                c.kind.label(),
                c.path
            ),
            None => format!("{:<width$}  {}\n", c.kind.label(), c.path),
        })
        .collect()
}

#[must_use]
pub fn conflicts(analysis: &ConflictAnalysis) -> String {
    let mut out = format!("Merge base: {}\n", analysis.merge_base);
    if !analysis.has_conflicts {
        out.push_str("No merge conflicts detected.\n");
        return out;
    }

    out.push_str("WARNING: Potential merge conflicts detected!\n");
    if analysis.conflicting_paths.is_empty() {
        out.push_str("Conflict markers were found but could not be attributed to a file.\n");
    } else {
        out.push_str("Conflicting files:\n");
        for path in &analysis.conflicting_paths {
            out.push_str("  - ");
            out.push_str(path);
            out.push('\n');
        }
    }
    out
}

#[must_use]
pub fn summary(stats: &SummaryStats) -> String {
    format!(
        "• Commits to merge: {}\n• Files changed: {}\n• Lines added: {}\n• Lines removed: {}\n",
        stats.commits_ahead, stats.files_changed, stats.lines_added, stats.lines_removed,
    )
}
