// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for configuration files that Oxitheme uses to simplify
//! the process of serialization and deserialization. File I/O is left to the
//! caller to figure out.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// User settings layout.
///
/// Settings control where themes come from, and where they end up locally.
/// Every field carries a sensible default, so a missing or empty settings
/// file is perfectly valid.
///
/// # General Layout
///
/// ```toml
/// registry_url = "https://github.com/oxitheme/registry.git"
/// raw_host = "raw.githubusercontent.com"
/// primary_branch = "main"
/// fallback_branch = "master"
/// manifest_path = "theme.toml"
/// fetch_limit = 6
/// theme_dir = "$XDG_DATA_HOME/oxitheme-store"
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// URL of the central registry repository to mirror.
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Host that serves raw manifest documents.
    #[serde(default = "default_raw_host")]
    pub raw_host: String,

    /// Branch to try first when fetching a manifest.
    #[serde(default = "default_primary_branch")]
    pub primary_branch: String,

    /// Branch to retry once when the primary branch is not found.
    #[serde(default = "default_fallback_branch")]
    pub fallback_branch: String,

    /// Repository-relative path of a theme's manifest document.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,

    /// Upper bound on concurrent manifest fetches.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Override for the theme store directory.
    pub theme_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            raw_host: default_raw_host(),
            primary_branch: default_primary_branch(),
            fallback_branch: default_fallback_branch(),
            manifest_path: default_manifest_path(),
            fetch_limit: default_fetch_limit(),
            theme_dir: None,
        }
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on theme store override.
        if let Some(theme_dir) = settings.theme_dir {
            settings.theme_dir = Some(PathBuf::from(
                shellexpand::full(theme_dir.to_string_lossy().as_ref())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned(),
            ));
        }

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn default_registry_url() -> String {
    "https://github.com/oxitheme/registry.git".into()
}

fn default_raw_host() -> String {
    "raw.githubusercontent.com".into()
}

fn default_primary_branch() -> String {
    "main".into()
}

fn default_fallback_branch() -> String {
    "master".into()
}

fn default_manifest_path() -> String {
    "theme.toml".into()
}

fn default_fetch_limit() -> usize {
    6
}

/// Installation state layout.
///
/// One state file is written per installed theme. It is created on the first
/// successful install, rewritten on every pull, and removed on uninstall.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct InstallationState {
    /// Where the theme's working copy lives on disk.
    pub local_path: PathBuf,

    /// Remote the working copy was cloned from.
    pub source_ref: String,

    /// Commit the working copy was last synchronized to.
    pub last_synced_revision: String,
}

impl FromStr for InstallationState {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for InstallationState {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}
