// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Theme domain representation.
//!
//! A __theme__ is a git repository that carries a manifest document at its
//! top-level, canonically named "theme.toml". The manifest describes the
//! theme's metadata, the installable __components__ it ships, and any
//! __sub-themes__ it links to. A sub-theme is just another manifest inside
//! the same repository, referenced by path, so one repository can host a
//! whole family of variants (light, dark, high-contrast, and so on).
//!
//! # Resolution
//!
//! A manifest on its own is only a partial picture of a theme. Resolution
//! fetches the manifest for a [`ThemeRef`] coordinate, parses it, then
//! recursively expands every sub-theme reference into a [`ThemeRecord`]
//! tree. Metadata a sub-theme leaves unset is inherited from its parent at
//! resolution time, and the resolver refuses to follow a reference that is
//! already being resolved further up the tree.
//!
//! # Components
//!
//! A component is an installable unit with up to three lifecycle hooks:
//! load, unload, and update. Each hook is an external executable shipped
//! inside the theme repository. Oxitheme only runs them and reports their
//! exit codes; it never inspects their contents.

pub mod fetch;
pub mod manifest;
pub mod resolve;

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

/// Location of one manifest document.
///
/// Identifies a manifest by the `{host}/{owner}/{repo}/{branch}/{path}`
/// coordinate it is served from. Two refs are the same theme if and only if
/// every part of the coordinate matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThemeRef {
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
}

impl ThemeRef {
    /// Construct new theme ref.
    pub fn new(
        host: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            path: path.into(),
        }
    }

    /// URL the raw manifest document is served from.
    pub fn raw_url(&self) -> String {
        format!(
            "https://{}/{}/{}/{}/{}",
            self.host, self.owner, self.repo, self.branch, self.path
        )
    }

    /// Same coordinate on a different branch.
    pub fn with_branch(&self, branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            ..self.clone()
        }
    }

    /// Coordinate of a sub-theme reference declared by this manifest.
    ///
    /// Sub-theme paths are repository relative: a leading "/" or "./" is
    /// stripped, and the remainder is anchored at this ref's
    /// host/owner/repo/branch. Anything else in the path string is passed
    /// through verbatim.
    pub fn subtheme(&self, reference: &str) -> Self {
        let path = reference.strip_prefix('/').unwrap_or(reference);
        let path = path.strip_prefix("./").unwrap_or(path);

        Self {
            path: path.into(),
            ..self.clone()
        }
    }

    /// Short name of the repository this ref points into.
    pub fn short_name(&self) -> &str {
        &self.repo
    }
}

impl Display for ThemeRef {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "{}/{}@{}:{}",
            self.owner, self.repo, self.branch, self.path
        )
    }
}

/// Fully resolved theme.
///
/// A record is a value tree: each parent exclusively owns its `subthemes`
/// slice, and no child keeps a reference back to its parent. Anything a
/// child needed from its parent was copied in at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeRecord {
    /// Display name. Falls back to the repository short name when the
    /// manifest does not provide one.
    pub name: String,

    /// One sentence summary of the theme.
    pub description: Option<String>,

    /// Who made the theme.
    pub author: Option<String>,

    /// Version string, opaque to oxitheme.
    pub version: Option<String>,

    /// Coordinate the manifest was actually fetched from.
    pub coordinate: ThemeRef,

    /// Repository to clone on installation, in `owner/repo` form or as a
    /// full remote URL.
    pub repo: Option<String>,

    /// Name of the sub-theme to load by default.
    pub default_subtheme: Option<String>,

    /// Ordered listing of opaque dependency names.
    pub depends: Vec<String>,

    /// Resolved sub-themes in manifest declaration order.
    pub subthemes: Vec<ThemeRecord>,

    /// Installable components keyed by name.
    pub components: BTreeMap<String, Component>,

    /// Non-fatal validation problems found during resolution.
    pub warnings: Vec<ValidationWarning>,
}

impl ThemeRecord {
    /// Remote URL to clone this theme from.
    ///
    /// An `owner/repo` form expands to a GitHub remote. A value carrying
    /// its own scheme, or an absolute path, is used verbatim. Without a
    /// `repo` field the fetch coordinate decides.
    pub fn clone_url(&self) -> String {
        match &self.repo {
            Some(repo) if repo.contains("://") || Path::new(repo).is_absolute() => repo.clone(),
            Some(repo) => format!("https://github.com/{repo}.git"),
            None => format!(
                "https://github.com/{}/{}.git",
                self.coordinate.owner, self.coordinate.repo
            ),
        }
    }

    /// Check that resolution raised no validation warnings.
    pub fn is_valid(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Metadata a sub-theme inherits from its parent.
///
/// Inheritance is a one-time copy at resolution time, never a live
/// reference back into the parent record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub description: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
}

/// Installable unit of a theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Component name, unique within its theme.
    pub name: String,

    /// One sentence summary of what the component provides.
    pub description: Option<String>,

    /// Script run when the component is applied.
    pub load: Option<PathBuf>,

    /// Script run before the component is removed.
    pub unload: Option<PathBuf>,

    /// Script run when the component is refreshed.
    pub update: Option<PathBuf>,
}

impl Component {
    /// Repository-relative script path of target lifecycle hook, if the
    /// component ships one.
    pub fn hook_path(&self, hook: Hook) -> Option<&Path> {
        match hook {
            Hook::Load => self.load.as_deref(),
            Hook::Unload => self.unload.as_deref(),
            Hook::Update => self.update.as_deref(),
        }
    }
}

/// Lifecycle hooks a component can ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Load,
    Unload,
    Update,
}

impl Display for Hook {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Load => write!(fmt, "load"),
            Self::Unload => write!(fmt, "unload"),
            Self::Update => write!(fmt, "update"),
        }
    }
}

/// Non-fatal validation problem found during resolution.
///
/// A warning never stops a theme from resolving. It marks the record as
/// invalid so enumeration can flag it to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Manifest field the problem was found in.
    pub field: &'static str,

    /// What exactly is wrong with it.
    pub reason: String,
}

impl Display for ValidationWarning {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}: {}", self.field, self.reason)
    }
}

/// Ways the user can tell oxitheme which theme they mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeSelector {
    /// Exact name of a registry-listed theme.
    ByName(String),

    /// An already resolved record.
    ByRecord(Box<ThemeRecord>),

    /// A git remote given directly with the `git+` prefix.
    ByGitUrl(String),
}

impl ThemeSelector {
    /// Classify raw user input from the command line.
    pub fn parse(input: &str) -> Self {
        match input.strip_prefix("git+") {
            Some(url) => Self::ByGitUrl(url.trim_end_matches('/').into()),
            None => Self::ByName(input.into()),
        }
    }
}
