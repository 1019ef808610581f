// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Theme registry enumeration.
//!
//! All known themes hang off one central __registry__ repository, which
//! links every theme repository as a git submodule. Oxitheme keeps a local
//! mirror of the registry, freshens it on every enumeration (clone if the
//! mirror is missing, pull if it is there), and walks the submodule links
//! to discover which repositories to resolve.
//!
//! Enumeration favors partial results over total failure: one theme whose
//! manifest is missing or broken is logged and skipped, never allowed to
//! sink the whole listing. The only hard failure is a registry mirror that
//! cannot be obtained at all.

use crate::{
    config::Settings,
    install::{ProgressSink, SyncError, Synchronizer},
    theme::{fetch::Transport, resolve::ThemeResolver, ThemeRecord, ThemeRef},
};

use futures::future::join_all;
use git2::Repository;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// One linked sub-repository of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
}

/// Enumerate themes out of the central registry.
#[derive(Debug)]
pub struct Registry<T, S>
where
    T: Transport,
    S: Synchronizer,
{
    url: String,
    mirror_dir: PathBuf,
    raw_host: String,
    primary_branch: String,
    manifest_path: String,
    resolver: ThemeResolver<T>,
    sync: S,
}

impl<T, S> Registry<T, S>
where
    T: Transport,
    S: Synchronizer,
{
    /// Construct new registry over target mirror directory.
    pub fn new(
        settings: &Settings,
        mirror_dir: impl Into<PathBuf>,
        resolver: ThemeResolver<T>,
        sync: S,
    ) -> Self {
        Self {
            url: settings.registry_url.clone(),
            mirror_dir: mirror_dir.into(),
            raw_host: settings.raw_host.clone(),
            primary_branch: settings.primary_branch.clone(),
            manifest_path: settings.manifest_path.clone(),
            resolver,
            sync,
        }
    }

    /// Enumerate and resolve every theme the registry links.
    ///
    /// Entries that fail to resolve are logged and skipped, so the
    /// returned listing is always the successfully resolved subset.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::Sync`] if the registry mirror cannot be
    ///   cloned or pulled.
    /// - Return [`RegistryError::Git2`] if the mirror cannot be opened or
    ///   its submodule links cannot be read.
    #[instrument(skip(self, sink), level = "debug")]
    pub async fn list_themes(&self, sink: &dyn ProgressSink) -> Result<Vec<ThemeRecord>> {
        self.update_mirror(sink)?;
        let entries = self.enumerate_entries()?;
        Ok(self.resolve_entries(entries).await)
    }

    /// Freshen the local registry mirror.
    fn update_mirror(&self, sink: &dyn ProgressSink) -> Result<()> {
        if self.mirror_dir.is_dir() {
            info!("updating registry mirror at {:?}", self.mirror_dir.display());
            self.sync.pull_repo(&self.mirror_dir, sink)?;
        } else {
            info!("mirroring registry from {}", self.url);
            if let Some(parent) = self.mirror_dir.parent() {
                mkdirp::mkdirp(parent)?;
            }
            self.sync.clone_repo(&self.url, &self.mirror_dir, sink)?;
        }

        Ok(())
    }

    /// Walk the mirror's submodule links into registry entries.
    fn enumerate_entries(&self) -> Result<Vec<RegistryEntry>> {
        let repository = Repository::open(&self.mirror_dir)?;
        let mut entries = Vec::new();

        for submodule in repository.submodules()? {
            let Some(url) = submodule.url() else {
                warn!("registry link {:?} has no usable url", submodule.name());
                continue;
            };
            let Some((owner, repo)) = parse_remote_slug(url) else {
                warn!("registry link {url} does not point at an owner/repo remote");
                continue;
            };
            entries.push(RegistryEntry {
                owner,
                repo,
                branch: submodule.branch().map(str::to_owned),
            });
        }

        Ok(entries)
    }

    /// Resolve every entry, skipping the ones that fail.
    pub async fn resolve_entries(&self, entries: Vec<RegistryEntry>) -> Vec<ThemeRecord> {
        let total = entries.len();
        let pending: Vec<_> = entries
            .iter()
            .map(|entry| self.resolver.resolve(self.entry_ref(entry)))
            .collect();
        let outcomes = join_all(pending).await;

        let mut themes = Vec::new();
        for (entry, outcome) in entries.iter().zip(outcomes) {
            match outcome {
                Ok(theme) => themes.push(theme),
                Err(error) => {
                    warn!("skipping registry entry {}/{}: {error}", entry.owner, entry.repo);
                }
            }
        }

        info!("resolved {}/{} registry entries", themes.len(), total);
        themes
    }

    fn entry_ref(&self, entry: &RegistryEntry) -> ThemeRef {
        ThemeRef::new(
            self.raw_host.as_str(),
            entry.owner.as_str(),
            entry.repo.as_str(),
            entry.branch.as_deref().unwrap_or(&self.primary_branch),
            self.manifest_path.as_str(),
        )
    }
}

/// Extract the `owner/repo` slug out of a remote URL.
///
/// Understands https remotes, scp-like ssh remotes, and the relative
/// submodule URLs registries tend to use.
fn parse_remote_slug(url: &str) -> Option<(String, String)> {
    let trimmed = url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let rest = match trimmed.split_once("://") {
        // INVARIANT: Drop the host segment of a full URL.
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path)?,
        None => match trimmed.rsplit_once(':') {
            Some((_, path)) => path,
            None => trimmed,
        },
    };

    let mut segments = rest.rsplit('/');
    let repo = segments.next()?;
    let owner = segments.next()?;
    if owner.is_empty() || repo.is_empty() || owner == "." || owner == ".." {
        return None;
    }

    Some((owner.into(), repo.into()))
}

/// Registry enumeration error types.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Registry mirror cannot be cloned or pulled.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Registry mirror cannot be opened or walked.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    /// Registry mirror parent directory cannot be created.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Friendly result alias :3
type Result<T, E = RegistryError> = std::result::Result<T, E>;
