// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Theme installation and synchronization.
//!
//! Installed themes live as plain git working copies inside the theme
//! store, one directory per theme. Installing a theme for the first time
//! clones its repository; installing it again pulls whatever the remote
//! has. Every successful synchronization records an
//! [`InstallationState`] file so the store can be listed without touching
//! the network.
//!
//! # Interrupted Clones
//!
//! A clone writes into a ".partial" staging directory next to its real
//! destination, and only renames into place once the checkout finished.
//! An interrupted or failed clone therefore never leaves a half-written
//! theme behind; at worst a stale staging directory lingers, and the next
//! install sweeps it away.
//!
//! # Progress Reporting
//!
//! Clone and pull progress flows through the [`ProgressSink`] trait as
//! `{phase, current, total, message}` events, so the long haul phases of a
//! transfer (counting, compressing, receiving, resolving, checking out)
//! render as one progress bar without this module knowing anything about
//! terminals.

use crate::{
    config::{ConfigError, InstallationState},
    script,
    theme::{Hook, ThemeRecord, ThemeSelector},
};

use auth_git2::{GitAuthenticator, Prompter};
use git2::{build::CheckoutBuilder, build::RepoBuilder, Config, FetchOptions, RemoteCallbacks, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{info, instrument, warn};

/// Phases a clone or pull moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Counting,
    Compressing,
    Receiving,
    Resolving,
    CheckingOut,
    Done,
}

impl Display for SyncPhase {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Counting => write!(fmt, "counting"),
            Self::Compressing => write!(fmt, "compressing"),
            Self::Receiving => write!(fmt, "receiving"),
            Self::Resolving => write!(fmt, "resolving"),
            Self::CheckingOut => write!(fmt, "checking out"),
            Self::Done => write!(fmt, "done"),
        }
    }
}

/// One progress report from a transfer in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent<'a> {
    pub phase: SyncPhase,
    pub current: u64,
    pub total: u64,
    pub message: &'a str,
}

/// Layer of indirection for progress rendering.
pub trait ProgressSink: Send + Sync {
    /// Receive one progress event.
    fn update(&self, event: ProgressEvent<'_>);
}

/// Progress sink that renders an indicatif progress bar.
#[derive(Debug)]
pub struct IndicatifSink {
    bar: ProgressBar,
    throttle: Mutex<Instant>,
    phase: Mutex<SyncPhase>,
}

impl IndicatifSink {
    /// Construct new progress bar sink around target bar.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Template`] if the style template cannot be
    ///   parsed.
    pub fn new(bar: ProgressBar) -> Result<Self> {
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Ok(Self {
            bar,
            throttle: Mutex::new(Instant::now()),
            phase: Mutex::new(SyncPhase::Counting),
        })
    }
}

impl ProgressSink for IndicatifSink {
    fn update(&self, event: ProgressEvent<'_>) {
        if event.phase == SyncPhase::Done {
            self.bar.finish_and_clear();
            return;
        }

        let mut phase = self.phase.lock().unwrap();
        let phase_changed = *phase != event.phase;
        *phase = event.phase;

        // INVARIANT: Throttle position updates, never phase changes.
        let mut throttle = self.throttle.lock().unwrap();
        if !phase_changed && throttle.elapsed() < Duration::from_millis(10) {
            return;
        }
        *throttle = Instant::now();

        if phase_changed || !event.message.is_empty() {
            let message = if event.message.is_empty() {
                event.phase.to_string()
            } else {
                format!("{}: {}", event.phase, event.message)
            };
            self.bar.set_message(message);
        }

        if event.total > 0 {
            self.bar.set_length(event.total);
            self.bar.set_position(event.current);
        }
    }
}

/// Progress sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn update(&self, _event: ProgressEvent<'_>) {}
}

/// Layer of indirection for working copy synchronization.
pub trait Synchronizer: Send + Sync + 'static {
    /// Clone a remote repository to target destination.
    ///
    /// Returns the revision the working copy ends up at.
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<String>;

    /// Update an existing working copy from its remote.
    ///
    /// Returns the revision the working copy ends up at. A failed pull
    /// must leave the working copy as it was.
    fn pull_repo(&self, dest: &Path, sink: &dyn ProgressSink) -> Result<String>;

    /// Revision an existing working copy currently sits at.
    fn revision(&self, dest: &Path) -> Result<String>;
}

/// Working copy synchronization through libgit2.
#[derive(Debug, Default)]
pub struct Git2Synchronizer;

impl Git2Synchronizer {
    /// Construct new libgit2 synchronizer.
    pub fn new() -> Self {
        Self
    }

    fn remote_callbacks<'a>(
        phase: &'a Mutex<SyncPhase>,
        sink: &'a dyn ProgressSink,
    ) -> RemoteCallbacks<'a> {
        let mut callbacks = RemoteCallbacks::new();

        callbacks.sideband_progress(move |data| {
            let line = String::from_utf8_lossy(data);
            let line = line.trim();
            let mut current = phase.lock().unwrap();
            if line.contains("Counting") {
                *current = SyncPhase::Counting;
            } else if line.contains("Compressing") {
                *current = SyncPhase::Compressing;
            }
            sink.update(ProgressEvent {
                phase: *current,
                current: 0,
                total: 0,
                message: line,
            });
            true
        });

        callbacks.transfer_progress(move |stats| {
            let mut current = phase.lock().unwrap();
            if stats.received_objects() < stats.total_objects() {
                *current = SyncPhase::Receiving;
                sink.update(ProgressEvent {
                    phase: *current,
                    current: stats.received_objects() as u64,
                    total: stats.total_objects() as u64,
                    message: "",
                });
            } else {
                *current = SyncPhase::Resolving;
                sink.update(ProgressEvent {
                    phase: *current,
                    current: stats.indexed_deltas() as u64,
                    total: stats.total_deltas() as u64,
                    message: "",
                });
            }
            true
        });

        callbacks
    }

    fn checkout_builder<'a>(
        phase: &'a Mutex<SyncPhase>,
        sink: &'a dyn ProgressSink,
    ) -> CheckoutBuilder<'a> {
        let mut checkout = CheckoutBuilder::new();
        checkout.progress(move |_path, completed, total| {
            *phase.lock().unwrap() = SyncPhase::CheckingOut;
            sink.update(ProgressEvent {
                phase: SyncPhase::CheckingOut,
                current: completed as u64,
                total: total as u64,
                message: "",
            });
        });
        checkout
    }

    fn head_revision(repository: &Repository) -> std::result::Result<String, git2::Error> {
        Ok(repository.head()?.peel_to_commit()?.id().to_string())
    }
}

impl Synchronizer for Git2Synchronizer {
    /// Clone a remote repository to target destination.
    ///
    /// The clone lands in a sibling ".partial" staging directory first,
    /// and is renamed over once the checkout finished. Credentials are
    /// prompted for if the remote demands them.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Git`] if libgit2 rejects the clone, tagged
    ///   with the phase the transfer was in.
    /// - Return [`SyncError::Stage`] if the staging directory cannot be
    ///   swept or renamed into place.
    #[instrument(skip(self, sink), level = "debug")]
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<String> {
        let staging = staging_path(dest);
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|err| SyncError::Stage {
                path: staging.clone(),
                source: err,
            })?;
        }

        let phase = Mutex::new(SyncPhase::Counting);
        let authenticator = GitAuthenticator::default().set_prompter(InquirePrompter);
        let config = Config::open_default()?;

        let mut callbacks = Self::remote_callbacks(&phase, sink);
        callbacks.credentials(authenticator.credentials(&config));

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let outcome = RepoBuilder::new()
            .fetch_options(fetch_options)
            .with_checkout(Self::checkout_builder(&phase, sink))
            .clone(url, &staging);

        match outcome {
            Ok(repository) => {
                let revision = Self::head_revision(&repository)?;
                drop(repository);
                fs::rename(&staging, dest).map_err(|err| SyncError::Stage {
                    path: staging.clone(),
                    source: err,
                })?;
                sink.update(ProgressEvent {
                    phase: SyncPhase::Done,
                    current: 0,
                    total: 0,
                    message: "",
                });
                Ok(revision)
            }
            Err(source) => {
                // Sweep the staging directory so nothing half-written lingers.
                let _ = fs::remove_dir_all(&staging);
                Err(SyncError::Git {
                    phase: *phase.lock().unwrap(),
                    source,
                })
            }
        }
    }

    /// Update an existing working copy from its remote.
    ///
    /// Fetches from "origin" and fast-forwards the checked out branch. A
    /// working copy that diverged from its remote is left untouched.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Git`] if libgit2 rejects the fetch or
    ///   checkout.
    /// - Return [`SyncError::Diverged`] if the working copy cannot be
    ///   fast-forwarded.
    #[instrument(skip(self, sink), level = "debug")]
    fn pull_repo(&self, dest: &Path, sink: &dyn ProgressSink) -> Result<String> {
        let repository = Repository::open(dest)?;
        let branch = repository
            .head()?
            .shorthand()
            .unwrap_or("HEAD")
            .to_owned();

        let phase = Mutex::new(SyncPhase::Counting);
        let authenticator = GitAuthenticator::default().set_prompter(InquirePrompter);
        let config = Config::open_default()?;

        let mut callbacks = Self::remote_callbacks(&phase, sink);
        callbacks.credentials(authenticator.credentials(&config));

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let mut remote = repository.find_remote("origin")?;
        remote
            .fetch(&[branch.as_str()], Some(&mut fetch_options), None)
            .map_err(|source| SyncError::Git {
                phase: *phase.lock().unwrap(),
                source,
            })?;
        drop(remote);

        let fetch_head = repository.find_reference("FETCH_HEAD")?;
        let fetched = repository.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repository.merge_analysis(&[&fetched])?;

        if analysis.is_up_to_date() {
            info!("{:?} already up to date", dest.display());
        } else if analysis.is_fast_forward() {
            let refname = format!("refs/heads/{branch}");
            let mut reference = repository.find_reference(&refname)?;
            reference.set_target(fetched.id(), "fast-forward")?;
            repository.set_head(&refname)?;
            repository.checkout_head(Some(
                Self::checkout_builder(&phase, sink).force(),
            ))?;
        } else {
            return Err(SyncError::Diverged {
                path: dest.to_path_buf(),
            });
        }

        sink.update(ProgressEvent {
            phase: SyncPhase::Done,
            current: 0,
            total: 0,
            message: "",
        });

        Ok(Self::head_revision(&repository)?)
    }

    fn revision(&self, dest: &Path) -> Result<String> {
        let repository = Repository::open(dest)?;
        Ok(Self::head_revision(&repository)?)
    }
}

/// Staging directory a clone writes into before the rename.
fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    dest.with_file_name(name)
}

/// Git2 authentication prompter backed by inquire.
#[derive(Debug, Clone)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        let username = Text::new("username").prompt().ok()?;
        let password = Password::new("password")
            .without_confirmation()
            .prompt()
            .ok()?;
        Some((username, password))
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        Password::new("password")
            .without_confirmation()
            .prompt()
            .ok()
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        Password::new("passphrase")
            .without_confirmation()
            .prompt()
            .ok()
    }
}

/// Coordinate theme installation against the local theme store.
#[derive(Debug)]
pub struct Installer<S = Git2Synchronizer>
where
    S: Synchronizer,
{
    store_dir: PathBuf,
    state_dir: PathBuf,
    sync: S,
}

impl<S> Installer<S>
where
    S: Synchronizer,
{
    /// Construct new installer over target store and state directories.
    pub fn new(store_dir: impl Into<PathBuf>, state_dir: impl Into<PathBuf>, sync: S) -> Self {
        Self {
            store_dir: store_dir.into(),
            state_dir: state_dir.into(),
            sync,
        }
    }

    /// Install or update the selected theme.
    ///
    /// A destination that already exists as a directory is updated with a
    /// pull; anything else gets a fresh clone. Either way the installation
    /// state file is rewritten on success.
    ///
    /// # Errors
    ///
    /// - Return [`InstallError::UnknownTheme`] if a name selector matches
    ///   none of the candidates.
    /// - Return [`InstallError::BadUrl`] if no theme name can be derived
    ///   from a git URL selector.
    /// - Return [`InstallError::Sync`] if the clone or pull fails. A
    ///   failed pull leaves the previous working copy usable at its last
    ///   synced revision.
    #[instrument(skip(self, selector, candidates, sink), level = "debug")]
    pub fn install(
        &self,
        selector: &ThemeSelector,
        candidates: &[ThemeRecord],
        sink: &dyn ProgressSink,
    ) -> Result<InstallationState, InstallError> {
        let (name, url) = match selector {
            ThemeSelector::ByName(name) => {
                let theme = candidates
                    .iter()
                    .find(|candidate| candidate.name == *name)
                    .ok_or_else(|| InstallError::UnknownTheme { name: name.clone() })?;
                (theme.name.clone(), theme.clone_url())
            }
            ThemeSelector::ByRecord(record) => (record.name.clone(), record.clone_url()),
            ThemeSelector::ByGitUrl(url) => {
                let name = url
                    .trim_end_matches(".git")
                    .rsplit('/')
                    .next()
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| InstallError::BadUrl { url: url.clone() })?
                    .to_owned();
                (name, url.clone())
            }
        };

        mkdirp::mkdirp(&self.store_dir)?;
        let dest = self.store_dir.join(&name);

        let revision = if dest.is_dir() {
            info!("theme \"{name}\" already present, updating");
            self.sync.pull_repo(&dest, sink)?
        } else {
            info!("cloning \"{name}\" from {url}");
            self.sync.clone_repo(&url, &dest, sink)?
        };

        let state = InstallationState {
            local_path: dest,
            source_ref: url,
            last_synced_revision: revision,
        };
        self.write_state(&name, &state)?;

        Ok(state)
    }

    /// Register an existing local working copy as an installed theme.
    ///
    /// No clone happens; the directory is recorded as-is under its own
    /// name.
    ///
    /// # Errors
    ///
    /// - Return [`InstallError::NotInstalled`] if the path is not a
    ///   directory.
    /// - Return [`InstallError::Sync`] if the directory is not a git
    ///   working copy.
    pub fn register_local(&self, path: &Path) -> Result<InstallationState, InstallError> {
        if !path.is_dir() {
            return Err(InstallError::NotInstalled {
                name: path.display().to_string(),
            });
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| InstallError::BadUrl {
                url: path.display().to_string(),
            })?;
        let revision = self.sync.revision(path)?;

        let state = InstallationState {
            local_path: path.to_path_buf(),
            source_ref: path.display().to_string(),
            last_synced_revision: revision,
        };
        self.write_state(&name, &state)?;

        Ok(state)
    }

    /// Uninstall target theme.
    ///
    /// Unload hooks of any components the installed manifest declares are
    /// run best-effort before the working copy and state file are removed.
    ///
    /// # Errors
    ///
    /// - Return [`InstallError::NotInstalled`] if neither a working copy
    ///   nor a state file exists for the name.
    #[instrument(skip(self), level = "debug")]
    pub fn uninstall(&self, name: &str) -> Result<(), InstallError> {
        let dest = self.store_dir.join(name);
        let state_file = self.state_file(name);

        if !dest.is_dir() && !state_file.is_file() {
            return Err(InstallError::NotInstalled { name: name.into() });
        }

        if dest.is_dir() {
            self.run_unload_hooks(&dest);
            fs::remove_dir_all(&dest)?;
        }

        if state_file.is_file() {
            fs::remove_file(&state_file)?;
        }

        Ok(())
    }

    /// Path of target theme's working copy, if it is installed.
    pub fn installed_path(&self, name: &str) -> Result<PathBuf, InstallError> {
        let dest = self.store_dir.join(name);
        if !dest.is_dir() {
            return Err(InstallError::NotInstalled { name: name.into() });
        }
        Ok(dest)
    }

    /// Enumerate every persisted installation state.
    ///
    /// Unreadable state files are logged and skipped.
    pub fn installed_themes(&self) -> Result<Vec<InstallationState>, InstallError> {
        let mut states = Vec::new();
        let entries = match fs::read_dir(&self.state_dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(states),
        };

        for entry in entries {
            let entry = entry?;
            if entry.path().extension().map_or(true, |ext| ext != "toml") {
                continue;
            }
            match fs::read_to_string(entry.path())?.parse::<InstallationState>() {
                Ok(state) => states.push(state),
                Err(error) => warn!(
                    "skipping unreadable state file {:?}: {error}",
                    entry.path().display()
                ),
            }
        }

        states.sort_by(|a, b| a.local_path.cmp(&b.local_path));
        Ok(states)
    }

    fn run_unload_hooks(&self, dest: &Path) {
        let manifest = dest.join(crate::theme::manifest::MANIFEST_FILE);
        let Ok(document) = fs::read_to_string(&manifest) else {
            return;
        };
        let Ok(manifest) = crate::theme::manifest::Manifest::parse(&document, None) else {
            return;
        };

        for component in manifest.components.values() {
            match script::run_hook(dest, component, Hook::Unload) {
                Ok(Some(code)) if code != 0 => {
                    warn!("unload hook of component \"{}\" exited {code}", component.name);
                }
                Ok(_) => {}
                Err(error) => warn!("{error}"),
            }
        }
    }

    fn state_file(&self, name: &str) -> PathBuf {
        self.state_dir.join(format!("{name}.toml"))
    }

    fn write_state(&self, name: &str, state: &InstallationState) -> Result<(), InstallError> {
        mkdirp::mkdirp(&self.state_dir)?;
        fs::write(self.state_file(name), state.to_string())?;
        Ok(())
    }
}

/// Interactively pick one theme out of the enumerated candidates.
///
/// Accepts a 1-based index into the candidate listing, or an exact theme
/// name. Anything else warns and prompts again.
///
/// # Errors
///
/// - Return [`InstallError::Prompt`] if the terminal interaction itself
///   fails.
pub fn select_theme<'a>(candidates: &'a [ThemeRecord]) -> Result<&'a ThemeRecord, InstallError> {
    loop {
        let input = Text::new("select a theme to install (number or name):").prompt()?;
        match match_selection(input.trim(), candidates) {
            Some(theme) => return Ok(theme),
            None => warn!("\"{}\" is not a listed theme", input.trim()),
        }
    }
}

fn match_selection<'a>(input: &str, candidates: &'a [ThemeRecord]) -> Option<&'a ThemeRecord> {
    if let Ok(index) = input.parse::<usize>() {
        if (1..=candidates.len()).contains(&index) {
            return Some(&candidates[index - 1]);
        }
        return None;
    }

    candidates.iter().find(|candidate| candidate.name == input)
}

/// Working copy synchronization error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Git transfer failed, tagged with the phase it died in.
    #[error("git {phase} failed")]
    Git {
        phase: SyncPhase,
        #[source]
        source: git2::Error,
    },

    /// Working copy cannot be fast-forwarded onto its remote.
    #[error("local copy at {:?} has diverged from its remote", path.display())]
    Diverged { path: PathBuf },

    /// Clone staging directory cannot be swept or renamed.
    #[error("failed to stage clone at {:?}", path.display())]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Progress style template cannot be parsed.
    #[error(transparent)]
    Template(#[from] indicatif::style::TemplateError),
}

impl From<git2::Error> for SyncError {
    fn from(source: git2::Error) -> Self {
        Self::Git {
            phase: SyncPhase::Done,
            source,
        }
    }
}

/// Theme installation error types.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// Name selector matched none of the candidates.
    #[error("no theme named \"{name}\" is available")]
    UnknownTheme { name: String },

    /// No theme name can be derived from the URL.
    #[error("cannot derive a theme name from {url}")]
    BadUrl { url: String },

    /// Theme has no working copy and no state file.
    #[error("theme \"{name}\" is not installed")]
    NotInstalled { name: String },

    /// Clone or pull failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// State file serialization failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Terminal interaction failed.
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),

    /// File system manipulation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Friendly result alias :3
type Result<T, E = SyncError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeRef;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    /// Synchronizer that records which operation ran instead of touching
    /// any remote.
    #[derive(Default)]
    struct RecordingSync {
        operations: Mutex<Vec<&'static str>>,
    }

    impl RecordingSync {
        fn operations(&self) -> Vec<&'static str> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl Synchronizer for RecordingSync {
        fn clone_repo(
            &self,
            _url: &str,
            dest: &Path,
            _sink: &dyn ProgressSink,
        ) -> Result<String> {
            self.operations.lock().unwrap().push("clone");
            fs::create_dir_all(dest).unwrap();
            Ok("1111111111111111111111111111111111111111".into())
        }

        fn pull_repo(&self, _dest: &Path, _sink: &dyn ProgressSink) -> Result<String> {
            self.operations.lock().unwrap().push("pull");
            Ok("2222222222222222222222222222222222222222".into())
        }

        fn revision(&self, _dest: &Path) -> Result<String> {
            Ok("3333333333333333333333333333333333333333".into())
        }
    }

    fn record(name: &str) -> ThemeRecord {
        ThemeRecord {
            name: name.into(),
            description: None,
            author: None,
            version: None,
            coordinate: ThemeRef::new(
                "raw.example.org",
                "blah",
                name,
                "main",
                "theme.toml",
            ),
            repo: None,
            default_subtheme: None,
            depends: Vec::new(),
            subthemes: Vec::new(),
            components: Default::default(),
            warnings: Vec::new(),
        }
    }

    fn installer(sync: RecordingSync) -> Installer<RecordingSync> {
        Installer::new("store", "state", sync)
    }

    #[sealed_test]
    fn install_clones_fresh_destination() -> anyhow::Result<()> {
        let installer = installer(RecordingSync::default());
        let selector = ThemeSelector::ByRecord(Box::new(record("catppuccin")));

        let state = installer.install(&selector, &[], &SilentSink)?;

        assert_eq!(installer.sync.operations(), vec!["clone"]);
        assert_eq!(state.local_path, PathBuf::from("store/catppuccin"));
        assert_eq!(
            state.last_synced_revision,
            "1111111111111111111111111111111111111111"
        );
        assert!(Path::new("state/catppuccin.toml").is_file());

        Ok(())
    }

    #[sealed_test]
    fn install_pulls_existing_destination() -> anyhow::Result<()> {
        let installer = installer(RecordingSync::default());
        let selector = ThemeSelector::ByRecord(Box::new(record("catppuccin")));

        installer.install(&selector, &[], &SilentSink)?;
        let state = installer.install(&selector, &[], &SilentSink)?;

        assert_eq!(installer.sync.operations(), vec!["clone", "pull"]);
        assert_eq!(
            state.last_synced_revision,
            "2222222222222222222222222222222222222222"
        );

        Ok(())
    }

    #[sealed_test]
    fn install_by_name_requires_listed_candidate() {
        let installer = installer(RecordingSync::default());
        let selector = ThemeSelector::ByName("gone".into());

        let result = installer.install(&selector, &[record("catppuccin")], &SilentSink);
        assert!(matches!(
            result,
            Err(InstallError::UnknownTheme { name }) if name == "gone"
        ));
    }

    #[sealed_test]
    fn install_by_git_url_derives_name() -> anyhow::Result<()> {
        let installer = installer(RecordingSync::default());
        let selector = ThemeSelector::ByGitUrl("https://blah.org/rosepine.git".into());

        let state = installer.install(&selector, &[], &SilentSink)?;

        assert_eq!(state.local_path, PathBuf::from("store/rosepine"));
        assert_eq!(state.source_ref, "https://blah.org/rosepine.git");

        Ok(())
    }

    #[sealed_test]
    fn uninstall_removes_copy_and_state() -> anyhow::Result<()> {
        let installer = installer(RecordingSync::default());
        let selector = ThemeSelector::ByRecord(Box::new(record("catppuccin")));
        installer.install(&selector, &[], &SilentSink)?;

        installer.uninstall("catppuccin")?;

        assert!(!Path::new("store/catppuccin").exists());
        assert!(!Path::new("state/catppuccin.toml").exists());
        assert!(matches!(
            installer.uninstall("catppuccin"),
            Err(InstallError::NotInstalled { .. })
        ));

        Ok(())
    }

    #[sealed_test]
    fn installed_themes_round_trips_state() -> anyhow::Result<()> {
        let installer = installer(RecordingSync::default());
        let selector = ThemeSelector::ByRecord(Box::new(record("catppuccin")));
        let state = installer.install(&selector, &[], &SilentSink)?;

        let listed = installer.installed_themes()?;
        assert_eq!(listed, vec![state]);

        Ok(())
    }

    #[test_case("1", Some("catppuccin"); "first index")]
    #[test_case("2", Some("rosepine"); "second index")]
    #[test_case("rosepine", Some("rosepine"); "exact name")]
    #[test_case("0", None; "index below range")]
    #[test_case("3", None; "index above range")]
    #[test_case("Rosepine", None; "wrong case name")]
    #[test]
    fn match_selection_accepts_index_or_name(input: &str, expect: Option<&str>) {
        let candidates = vec![record("catppuccin"), record("rosepine")];
        let result = match_selection(input, &candidates).map(|theme| theme.name.as_str());
        assert_eq!(result, expect);
    }
}
