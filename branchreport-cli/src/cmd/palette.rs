// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use console::Style;

/// Colours for user-facing console output, decided once from the capabilities of the stream being written to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: bool,
}

impl Palette {
    #[must_use]
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    /// Honours `NO_COLOR`/`CLICOLOR_FORCE` and whether stdout is a terminal.
    #[must_use]
    pub fn for_stdout() -> Self {
        Self::new(console::colors_enabled())
    }

    #[must_use]
    pub fn for_stderr() -> Self {
        Self::new(console::colors_enabled_stderr())
    }

    fn apply(&self, style: Style, text: &str) -> String {
        style.force_styling(self.colors).apply_to(text).to_string()
    }

    #[must_use]
    pub fn error(&self, text: &str) -> String {
        self.apply(Style::new().red().bold(), text)
    }

    #[must_use]
    pub fn warning(&self, text: &str) -> String {
        self.apply(Style::new().yellow().bold(), text)
    }

    #[must_use]
    pub fn success(&self, text: &str) -> String {
        self.apply(Style::new().green(), text)
    }

    #[must_use]
    pub fn heading(&self, text: &str) -> String {
        self.apply(Style::new().cyan().bold(), text)
    }

    #[must_use]
    pub fn value(&self, text: &str) -> String {
        self.apply(Style::new().bold(), text)
    }
}
