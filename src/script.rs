// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Component lifecycle hook execution.
//!
//! Components ship their lifecycle hooks as plain executables inside the
//! theme repository. Oxitheme runs them as external processes rooted at
//! the installed working copy, and reports their exit codes. It never
//! reads or interprets what the scripts actually do.

use crate::theme::{Component, Hook};

use std::{path::PathBuf, process::Command};
use tracing::debug;

/// Run one lifecycle hook of target component.
///
/// The hook script is resolved relative to the installed theme's working
/// copy, which also becomes the process working directory. Returns the
/// process exit code, or [`None`] if the component does not ship that
/// hook.
///
/// # Errors
///
/// - Return [`ScriptError::Spawn`] if the script cannot be started at
///   all.
pub fn run_hook(
    theme_root: impl Into<PathBuf>,
    component: &Component,
    hook: Hook,
) -> Result<Option<i32>> {
    let theme_root = theme_root.into();
    let Some(relative) = component.hook_path(hook) else {
        return Ok(None);
    };

    let script = theme_root.join(relative);
    debug!("running {hook} hook {:?}", script.display());

    let status = Command::new(&script)
        .current_dir(&theme_root)
        .status()
        .map_err(|err| ScriptError::Spawn {
            hook,
            script: script.clone(),
            source: err,
        })?;

    // INVARIANT: A signal death still reports as a failure code.
    Ok(Some(status.code().unwrap_or(-1)))
}

/// Lifecycle hook execution error types.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Hook script cannot be started.
    #[error("failed to run {hook} hook at {:?}", script.display())]
    Spawn {
        hook: Hook,
        script: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Friendly result alias :3
type Result<T, E = ScriptError> = std::result::Result<T, E>;
