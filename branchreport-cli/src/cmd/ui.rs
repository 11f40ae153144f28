// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::field::Visit;

/// Span fields the progress console reacts to, collected field-by-field as tracing visits them.
#[derive(Default, Debug)]
pub struct RawUiInformation {
    pub ui_stage: Option<UiStage>,
    pub is_subcommand: bool,
    pub subcommand_binary: Option<String>,
    pub subcommand_args: Option<String>,
}

impl Visit for RawUiInformation {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "subcommand_args" {
            self.subcommand_args = Some(format!("{value:?}"));
        }
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        if field.name() == "ui_stage" {
            self.ui_stage = UiStage::try_from(value).ok();
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "subcommand_binary" {
            self.subcommand_binary = Some(String::from(value));
        }
        if field.name() == "subcommand_args" {
            self.subcommand_args = Some(String::from(value));
        }
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        if field.name() == "subcommand" {
            self.is_subcommand = value;
        }
    }
}

/// Stages of report generation, in the order they run.  Carried as a `u64` span field since tracing can't record
/// arbitrary values.
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
#[repr(u64)]
pub enum UiStage {
    Validate,
    FetchRemotes,
    CollectBranchStatus,
    CollectCommits,
    CollectChanges,
    AnalyzeConflicts,
    WriteReport,
}

impl UiStage {
    pub const COUNT: u64 = 7;

    /// 1-based position for `[n/7]` style progress output.
    #[must_use]
    pub fn position(self) -> u64 {
        u64::from(self) + 1
    }
}
