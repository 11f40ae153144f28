// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use console::{Emoji, style};
use dashmap::DashMap;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{Log, SetLoggerError};
use std::time::Duration;
use tracing::Subscriber;
use tracing::span::{Attributes, Id};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

use super::ui::{RawUiInformation, UiStage};

static CHECK: Emoji<'_, '_> = Emoji("🔎  ", "");
static FETCH: Emoji<'_, '_> = Emoji("📡  ", "");
static BRANCH: Emoji<'_, '_> = Emoji("🌿  ", "");
static COMMITS: Emoji<'_, '_> = Emoji("📜  ", "");
static FILES: Emoji<'_, '_> = Emoji("📂  ", "");
static MERGE: Emoji<'_, '_> = Emoji("🔀  ", "");
static WRITE: Emoji<'_, '_> = Emoji("📝  ", "");

const SUBCOMMAND_ARGS_WIDTH: usize = 50;

#[derive(Default)]
struct SpanData {
    message_bar: Option<ProgressBar>,
    subcommand_bar: Option<ProgressBar>,
}

/// Renders report-generation stages and the git commands run within them as spinners on stderr.
pub struct GenerateReportConsole {
    root: MultiProgress,
    ongoing_spans: DashMap<Id, SpanData>,
}

impl GenerateReportConsole {
    /// Installs `logger` as the global logger, routed through the progress bars so log lines don't tear them.
    pub fn new<T: Log + 'static>(no_progress: bool, logger: T) -> Result<Self, SetLoggerError> {
        let root = MultiProgress::new();
        if no_progress {
            root.set_draw_target(ProgressDrawTarget::hidden());
        }
        LogWrapper::new(root.clone(), logger).try_init()?;
        Ok(Self {
            root,
            ongoing_spans: DashMap::new(),
        })
    }

    fn spinner(&self, template: &str) -> ProgressBar {
        // Must be added to the `MultiProgress` before anything that can trigger a draw.
        let progress_bar = self.root.add(ProgressBar::new_spinner());
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        progress_bar.set_style(
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        progress_bar
    }
}

fn stage_message(stage: UiStage) -> String {
    let (emoji, text) = match stage {
        UiStage::Validate => (&CHECK, "Checking repository and branches ..."),
        UiStage::FetchRemotes => (&FETCH, "Fetching remotes ..."),
        UiStage::CollectBranchStatus => (&BRANCH, "Reading branch status ..."),
        UiStage::CollectCommits => (&COMMITS, "Listing commits to merge ..."),
        UiStage::CollectChanges => (&FILES, "Collecting file changes ..."),
        UiStage::AnalyzeConflicts => (&MERGE, "Simulating merge ..."),
        UiStage::WriteReport => (&WRITE, "Writing report ..."),
    };
    format!(
        "{} {emoji}{text}",
        style(format!("[{}/{}]", stage.position(), UiStage::COUNT))
            .bold()
            .dim(),
    )
}

fn subcommand_message(info: &RawUiInformation) -> String {
    let mut msg: String = String::with_capacity(64);
    if let Some(bin) = &info.subcommand_binary {
        msg += bin;
    }
    if let Some(args) = &info.subcommand_args {
        msg += " ";
        msg.extend(args.chars().take(SUBCOMMAND_ARGS_WIDTH));
    }
    msg
}

impl<S> Layer<S> for GenerateReportConsole
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    #[allow(clippy::literal_string_with_formatting_args)] // with_template looks like format args, but isn't
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, _ctx: Context<'_, S>) {
        let mut raw_ui_information = RawUiInformation::default();
        attrs.record(&mut raw_ui_information);

        let mut span_data = SpanData::default();

        if let Some(stage) = raw_ui_information.ui_stage {
            let progress_bar = self.spinner("{spinner:.blue} [{elapsed_precise}] {msg}");
            progress_bar.set_message(stage_message(stage));
            span_data.message_bar = Some(progress_bar);
        }

        if raw_ui_information.is_subcommand {
            let progress_bar = self.spinner("{spinner:.blue} [{elapsed_precise}]     {msg}");
            progress_bar.set_message(subcommand_message(&raw_ui_information));
            span_data.subcommand_bar = Some(progress_bar);
        }

        self.ongoing_spans.insert(id.clone(), span_data);
    }

    fn on_close(&self, id: Id, _ctx: Context<'_, S>) {
        let Some((_, span_data)) = self.ongoing_spans.remove(&id) else {
            return;
        };

        if let Some(subcommand_bar) = span_data.subcommand_bar {
            self.root.remove(&subcommand_bar);
        }

        if let Some(message_bar) = span_data.message_bar {
            // Spinners are suppressed when stderr isn't a terminal; still report each stage's timing.
            #[allow(clippy::print_stderr)]
            if !console::Term::stderr().is_term() {
                let elapsed = message_bar.elapsed();
                let msg = message_bar.message();
                eprintln!("{msg} [elapsed: {:.3}s]", elapsed.as_secs_f64());
            }
            // Left in place so the finished stage list stays visible.
            message_bar.finish();
        }
    }
}
