// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use clap::{Args, Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::set_max_level;
use serde::Deserialize;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::{path::PathBuf, process::ExitCode};

use crate::report::{DEFAULT_SOURCE_BRANCH, DEFAULT_TARGET_BRANCH};

use super::generate;

/// Compare two branches and write a plain-text report of what merging SOURCE into TARGET would bring in
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonOptions,

    #[command(flatten)]
    generate: GenerateOptions,
}

#[derive(Args, Debug)]
pub struct CommonOptions {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Disable progress spinners, even if the terminal supports them.
    #[arg(short, long, global = true)]
    pub no_progress: bool,
}

#[derive(Args, Debug)]
pub struct GenerateOptions {
    /// Branch whose changes would be merged
    #[arg(default_value = DEFAULT_SOURCE_BRANCH)]
    pub source: String,

    /// Branch that would receive the merge
    #[arg(default_value = DEFAULT_TARGET_BRANCH)]
    pub target: String,

    /// Report file to write; defaults to branch-changes-<YYYYMMDD-HHMMSS>.txt
    pub output: Option<PathBuf>,

    /// Run against the repository in this directory instead of the current directory
    #[arg(short = 'C', long)]
    pub repo: Option<PathBuf>,

    /// How to treat `git fetch --all` before comparing; overrides the repository config
    #[arg(value_enum, long)]
    pub fetch: Option<FetchMode>,

    /// Override the in-repo .config/branchreport.toml with a static config file
    #[arg(long)]
    pub override_config: Option<String>,
}

#[derive(Copy, Clone, Default, PartialEq, Eq, ValueEnum, Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    /// Fetch all remotes; a failed fetch aborts the report.
    #[default]
    Required,

    /// Fetch all remotes; a failed fetch is logged and the comparison uses the refs already present.
    BestEffort,

    /// Don't contact any remote.
    Skip,
}

#[must_use]
pub fn run_cli() -> ExitCode {
    let cli = Cli::parse();
    let logger = TermLogger::new(
        cli.common.verbose.log_level_filter(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
    set_max_level(cli.common.verbose.log_level_filter());

    generate::cli(logger, &cli.common, &cli.generate)
}
