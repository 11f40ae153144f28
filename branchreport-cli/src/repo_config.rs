// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow};
use serde::Deserialize;

use crate::cmd::cli::FetchMode;

pub const REPO_CONFIG_PATH: &str = ".config/branchreport.toml";

#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RepoConfig {
    #[serde(default)]
    fetch: Option<FetchMode>,
}

impl RepoConfig {
    #[must_use]
    pub fn fetch(&self) -> Option<FetchMode> {
        self.fetch
    }
}

/// Reads `.config/branchreport.toml` under `project_dir`, or `override_config` when given.  A missing in-repo file is
/// an empty config; a missing override is an error.
pub fn get_repo_config(project_dir: &Path, override_config: Option<&String>) -> Result<RepoConfig> {
    let path = match override_config {
        Some(path) => PathBuf::from(path),
        None => project_dir.join(REPO_CONFIG_PATH),
    };
    if fs::exists(&path)? {
        let text = fs::read_to_string(&path)?;
        toml::from_str(&text).with_context(|| format!("parsing config file {path:?}"))
    } else {
        if let Some(override_config) = override_config {
            return Err(anyhow!(
                "override config path {override_config} could not be opened"
            ));
        }
        Ok(RepoConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_in_repo_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            get_repo_config(dir.path(), None).unwrap(),
            RepoConfig::default()
        );
    }

    #[test]
    fn reads_fetch_mode() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".config")).unwrap();
        fs::write(
            dir.path().join(REPO_CONFIG_PATH),
            "fetch = \"best-effort\"\n",
        )
        .unwrap();
        let config = get_repo_config(dir.path(), None).unwrap();
        assert_eq!(config.fetch(), Some(FetchMode::BestEffort));
    }

    #[test]
    fn unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "exclude = [\"*.md\"]\n").unwrap();
        let override_path = path.to_string_lossy().into_owned();
        assert!(get_repo_config(dir.path(), Some(&override_path)).is_err());
    }

    #[test]
    fn missing_override_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml").to_string_lossy().into_owned();
        let err = get_repo_config(dir.path(), Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("could not be opened"));
    }
}
