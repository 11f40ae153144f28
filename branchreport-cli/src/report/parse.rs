// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeSet;

const CONFLICT_MARKER: &str = "<<<<<<<";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
    Unmerged,
    Unknown,
}

impl ChangeKind {
    /// Maps a name-status column (eg. `M`, `R087`, `C100`) to the kind of change it describes.
    #[must_use]
    pub fn from_status(status: &str) -> Self {
        match status.chars().next() {
            Some('A') => ChangeKind::Added,
            Some('M') => ChangeKind::Modified,
            Some('D') => ChangeKind::Deleted,
            Some('R') => ChangeKind::Renamed,
            Some('C') => ChangeKind::Copied,
            Some('T') => ChangeKind::TypeChanged,
            Some('U') => ChangeKind::Unmerged,
            _ => ChangeKind::Unknown,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ChangeKind::Added => "Added",
            ChangeKind::Modified => "Modified",
            ChangeKind::Deleted => "Deleted",
            ChangeKind::Renamed => "Renamed",
            ChangeKind::Copied => "Copied",
            ChangeKind::TypeChanged => "Type changed",
            ChangeKind::Unmerged => "Unmerged",
            ChangeKind::Unknown => "Unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileChange {
    pub kind: ChangeKind,
    pub path: String,
    /// Source path of a rename or copy.
    pub previous_path: Option<String>,
}

/// Parses `git diff --name-status -z` output: NUL-terminated fields, with a status field followed by one path, or two
/// for renames and copies.  `path` is always the destination.
#[must_use]
pub fn parse_name_status(output: &str) -> Vec<FileChange> {
    let mut fields = output.split('\0').filter(|field| !field.is_empty());
    let mut changes = Vec::new();
    while let Some(status) = fields.next() {
        let kind = ChangeKind::from_status(status.trim());
        let Some(first) = fields.next() else {
            break;
        };
        let change = if matches!(kind, ChangeKind::Renamed | ChangeKind::Copied) {
            let Some(second) = fields.next() else {
                break;
            };
            FileChange {
                kind,
                path: String::from(second),
                previous_path: Some(String::from(first)),
            }
        } else {
            FileChange {
                kind,
                path: String::from(first),
                previous_path: None,
            }
        };
        changes.push(change);
    }
    changes
}

/// Number of distinct paths touched, counting each rename or copy once by its destination.
#[must_use]
pub fn count_distinct_paths(changes: &[FileChange]) -> u64 {
    let paths: BTreeSet<&str> = changes.iter().map(|c| c.path.as_str()).collect();
    paths.len() as u64
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub added: u64,
    pub removed: u64,
}

/// Sums the added and removed columns of `git diff --numstat` output.  Binary files report `-` in both columns and
/// contribute nothing.
#[must_use]
pub fn parse_numstat(output: &str) -> LineCounts {
    output
        .lines()
        .fold(LineCounts::default(), |mut counts, line| {
            let mut columns = line.split('\t');
            let added = columns.next().and_then(|c| c.trim().parse::<u64>().ok());
            let removed = columns.next().and_then(|c| c.trim().parse::<u64>().ok());
            counts.added += added.unwrap_or(0);
            counts.removed += removed.unwrap_or(0);
            counts
        })
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeTreeConflicts {
    pub has_conflict_markers: bool,
    pub paths: BTreeSet<String>,
}

/// Scans three-way `git merge-tree <base> <ours> <theirs>` output for conflict markers.
///
/// The output is a series of entries; each starts with an unindented header such as `changed in both`, followed by
/// indented `base`/`our`/`their`/`result` stage lines naming the path, followed by a diff of the merged content.  A
/// marker anywhere in an entry's diff attributes that entry's paths as conflicting.  File content that happens to
/// contain a marker is reported too; the scan is a text heuristic, not a merge.
#[must_use]
pub fn parse_merge_tree(output: &str) -> MergeTreeConflicts {
    let mut conflicts = MergeTreeConflicts::default();
    let mut entry_paths: Vec<String> = Vec::new();

    for line in output.lines() {
        if line.contains(CONFLICT_MARKER) {
            conflicts.has_conflict_markers = true;
            conflicts.paths.extend(entry_paths.iter().cloned());
            continue;
        }

        if let Some(path) = stage_line_path(line) {
            entry_paths.push(path);
        } else if is_entry_header(line) {
            entry_paths.clear();
        }
    }

    conflicts
}

fn is_entry_header(line: &str) -> bool {
    match line.chars().next() {
        None => false,
        Some(c) => !(c.is_whitespace() || matches!(c, '+' | '-' | '@' | '\\')),
    }
}

// "  our    100644 e69de29bb2d1d6434b8b29ae775ad8c2e48c5391 src/lib.rs"
fn stage_line_path(line: &str) -> Option<String> {
    let rest = line.strip_prefix("  ")?;
    let rest = ["base", "our", "their", "result"]
        .iter()
        .find_map(|stage| rest.strip_prefix(stage))?;
    let rest = rest.strip_prefix(' ')?.trim_start();
    let (_mode, rest) = rest.split_once(' ')?;
    let (_object, path) = rest.trim_start().split_once(' ')?;
    if path.is_empty() {
        None
    } else {
        Some(String::from(path))
    }
}
