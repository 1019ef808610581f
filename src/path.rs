// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way.

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to theme store directory.
///
/// Uses XDG Base Directory path `$XDG_DATA_HOME/oxitheme-store` as the
/// default absolute path for the theme store. Does not check if the path
/// returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_theme_store_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join("oxitheme-store"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to installation state directory.
///
/// One state file is kept per installed theme at
/// `$XDG_DATA_HOME/oxitheme/state`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_state_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join("oxitheme").join("state"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the registry mirror.
///
/// The local mirror of the central theme registry lives at
/// `$XDG_CACHE_HOME/oxitheme/registry`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_registry_mirror_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|path| path.join("oxitheme").join("registry"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the settings file.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_settings_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("oxitheme").join("config.toml"))
        .ok_or(NoWayHome)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
