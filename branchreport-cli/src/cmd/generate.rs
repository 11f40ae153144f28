// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use log::{Log, debug};
use std::env;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt as _;

use crate::errors::ReportErrors;
use crate::repo_config::get_repo_config;
use crate::report::{
    ComparisonRequest, Report, ReportConfig, ensure_repository, generate_report, local_now,
};
use crate::scm::Scm as _;
use crate::scm::git::GitScm;

use super::cli::{CommonOptions, GenerateOptions};
use super::generate_ui::GenerateReportConsole;
use super::palette::Palette;

// The `cli` function performs the interactive output, while delegating the actual work to library functions that
// return data structures.
#[allow(clippy::print_stderr)]
pub fn cli<Logger: Log + 'static>(
    logger: Logger,
    common_opts: &CommonOptions,
    options: &GenerateOptions,
) -> ExitCode {
    let terminal_output = match GenerateReportConsole::new(common_opts.no_progress, logger) {
        Ok(terminal_output) => terminal_output,
        Err(err) => {
            eprintln!("unable to install logger: {err}");
            return ExitCode::FAILURE;
        }
    };
    let subscriber = tracing_subscriber::registry::Registry::default().with(terminal_output);

    let result = tracing::subscriber::with_default(subscriber, || run(options));

    // Printing happens after `subscriber` is dropped so that it doesn't fight the progress bars for the console.
    report_outcome(result)
}

/// Prints the summary or the error for a finished run and maps it to the process exit code.
#[allow(clippy::print_stderr)]
fn report_outcome(result: Result<Report>) -> ExitCode {
    match result {
        Ok(report) => {
            print_summary(&report, Palette::for_stdout());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let palette = Palette::for_stderr();
            match err.downcast_ref::<ReportErrors>() {
                Some(validation) => eprintln!("{}", palette.error(&format!("error: {validation}"))),
                None => eprintln!("{}", palette.error(&format!("error: {err:#}"))),
            }
            ExitCode::FAILURE
        }
    }
}

pub fn run(options: &GenerateOptions) -> Result<Report> {
    let project_dir = match &options.repo {
        Some(dir) => dir.clone(),
        None => env::current_dir()?,
    };
    let scm = GitScm::new(project_dir);
    ensure_repository(&scm)?;
    // The config lives at the repository root, wherever inside the work tree we were started.
    let repo_config = get_repo_config(
        &scm.get_repository_root()?,
        options.override_config.as_ref(),
    )?;
    let config = ReportConfig {
        fetch_mode: options
            .fetch
            .or(repo_config.fetch())
            .unwrap_or_default(),
        ..ReportConfig::default()
    };
    debug!("report config: {config:?}");

    let request = ComparisonRequest::new(
        Some(options.source.clone()),
        Some(options.target.clone()),
        options.output.clone(),
        local_now(),
    )?;

    generate_report(&scm, &request, &config)
}

#[allow(clippy::print_stdout)]
fn print_summary(report: &Report, palette: Palette) {
    let stats = &report.summary;
    println!(
        "{}",
        palette.heading(&format!(
            "Branch comparison: {} -> {}",
            report.source, report.target
        ))
    );
    println!(
        "  Commits to merge: {}",
        palette.value(&stats.commits_ahead.to_string())
    );
    println!(
        "  Files changed:    {}",
        palette.value(&stats.files_changed.to_string())
    );
    println!(
        "  Lines added:      {}",
        palette.success(&format!("+{}", stats.lines_added))
    );
    println!(
        "  Lines removed:    {}",
        palette.error(&format!("-{}", stats.lines_removed))
    );
    if report.conflicts.has_conflicts {
        println!(
            "  {}",
            palette.warning(&format!(
                "Potential merge conflicts in {} file(s)",
                report.conflicts.conflicting_paths.len()
            ))
        );
    } else {
        println!("  {}", palette.success("No merge conflicts detected"));
    }
    println!("Report written to: {}", report.output_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn exit_code_name(code: ExitCode) -> String {
        format!("{code:?}")
    }

    #[test]
    fn validation_error_fails() {
        let result = Err(ReportErrors::BranchNotFound {
            branch: String::from("dev"),
        }
        .into());
        assert_eq!(
            exit_code_name(report_outcome(result)),
            exit_code_name(ExitCode::FAILURE)
        );
    }

    #[test]
    fn outside_repository_reported_before_config() {
        let dir = tempfile::tempdir().unwrap();
        let options = GenerateOptions {
            source: String::from("dev"),
            target: String::from("main"),
            output: Some(dir.path().join("report.txt")),
            repo: Some(dir.path().to_path_buf()),
            fetch: None,
            override_config: Some(String::from("/nonexistent/branchreport.toml")),
        };
        let err = run(&options).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportErrors>(),
            Some(ReportErrors::NotARepository { path }) if *path == PathBuf::from(dir.path())
        ));
        assert_eq!(
            exit_code_name(report_outcome(Err(err))),
            exit_code_name(ExitCode::FAILURE)
        );
    }
}
