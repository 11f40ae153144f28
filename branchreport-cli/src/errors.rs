// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubcommandErrors {
    #[error("unable to start sub-command '{command}': {error}")]
    UnableToStart {
        command: String,
        error: std::io::Error,
    },

    #[error("sub-command '{command}' failed with exit code {status:?} and stderr {stderr:?}")]
    SubcommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("sub-command '{command}' had unparseable output; error: {error:?} output: {output:?}")]
    SubcommandOutputParseFailed {
        command: String,
        error: String,
        output: String,
    },
}

/// Validation failures detected before any report output is produced.
#[derive(Error, Debug)]
pub enum ReportErrors {
    #[error("{path:?} is not inside a git working tree")]
    NotARepository { path: PathBuf },

    #[error("branch '{branch}' does not exist locally or as a remote-tracking branch")]
    BranchNotFound { branch: String },
}
