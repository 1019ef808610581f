// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Manifest document parsing.
//!
//! A theme manifest is a TOML document with a required top-level `[theme]`
//! table, and an optional `[component.<name>]` table per installable
//! component. Parsing is pure: it maps the document onto typed fields and
//! performs no I/O, so every sub-theme reference comes out as a bare path
//! string for the resolver to chase.
//!
//! # General Layout
//!
//! ```toml
//! [theme]
//! name = "catppuccin"
//! description = "soothing pastel theme"
//! repo = "catppuccin/desktop"
//! author = "catppuccin org"
//! version = "1.2.0"
//! default_subtheme = "mocha"
//! depends = ["waybar", "mako"]
//! subthemes = ["./mocha/theme.toml", "./latte/theme.toml"]
//!
//! [component.wallpaper]
//! desc = "wallpaper pack"
//! load = "scripts/wallpaper-load.sh"
//! unload = "scripts/wallpaper-unload.sh"
//! update = "scripts/wallpaper-update.sh"
//! ```

use crate::theme::Component;

use serde::Deserialize;
use std::{collections::BTreeMap, path::PathBuf};

/// Canonical repository-relative location of a theme manifest.
pub const MANIFEST_FILE: &str = "theme.toml";

/// Parsed, unresolved manifest.
///
/// The direct image of one manifest document. Sub-themes are still path
/// strings, and no metadata inheritance has happened yet.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub repo: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub default_subtheme: Option<String>,
    pub depends: Vec<String>,
    pub subthemes: Vec<String>,
    pub components: BTreeMap<String, Component>,
}

impl Manifest {
    /// Parse a raw manifest document.
    ///
    /// An `overriding_name` wins over whatever the manifest calls itself.
    /// It is used when the caller already assigned the theme a name, e.g.,
    /// when installing straight from a git URL.
    ///
    /// # Errors
    ///
    /// - Return [`ManifestError::MissingThemeTable`] if the document has no
    ///   top-level `[theme]` table.
    /// - Return [`ManifestError::Deserialize`] if the document is not valid
    ///   TOML, or a field carries the wrong type.
    pub fn parse(document: &str, overriding_name: Option<&str>) -> Result<Self> {
        let layout: ManifestLayout =
            toml::de::from_str(document).map_err(ManifestError::Deserialize)?;
        let theme = layout.theme.ok_or(ManifestError::MissingThemeTable)?;

        let components = layout
            .component
            .unwrap_or_default()
            .into_iter()
            .map(|(name, entry)| {
                let component = Component {
                    name: name.clone(),
                    description: entry.desc,
                    load: entry.load,
                    unload: entry.unload,
                    update: entry.update,
                };
                (name, component)
            })
            .collect();

        Ok(Self {
            name: overriding_name
                .map(str::to_owned)
                .or(theme.name)
                .filter(|name| !name.trim().is_empty()),
            description: first_non_empty(theme.description, theme.desc),
            repo: theme.repo,
            author: theme.author,
            version: theme.version,
            default_subtheme: theme.default_subtheme,
            depends: theme.depends.unwrap_or_default(),
            subthemes: theme.subthemes.unwrap_or_default(),
            components,
        })
    }
}

/// First non-empty value wins, favoring the long spelling.
fn first_non_empty(long: Option<String>, short: Option<String>) -> Option<String> {
    long.filter(|value| !value.trim().is_empty())
        .or(short.filter(|value| !value.trim().is_empty()))
}

/// Serialized manifest document layout.
#[derive(Debug, Deserialize)]
struct ManifestLayout {
    theme: Option<ThemeLayout>,
    component: Option<BTreeMap<String, ComponentLayout>>,
}

/// Serialized `[theme]` table layout.
#[derive(Debug, Deserialize)]
struct ThemeLayout {
    name: Option<String>,
    description: Option<String>,
    desc: Option<String>,
    repo: Option<String>,
    author: Option<String>,
    version: Option<String>,
    default_subtheme: Option<String>,
    depends: Option<Vec<String>>,
    subthemes: Option<Vec<String>>,
}

/// Serialized `[component.<name>]` table layout.
#[derive(Debug, Deserialize)]
struct ComponentLayout {
    desc: Option<String>,
    load: Option<PathBuf>,
    unload: Option<PathBuf>,
    update: Option<PathBuf>,
}

/// Manifest parsing error types.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Document has no top-level `[theme]` table.
    #[error("manifest is missing its [theme] table")]
    MissingThemeTable,

    /// Document is not valid TOML.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),
}

/// Friendly result alias :3
type Result<T, E = ManifestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_full_manifest() -> anyhow::Result<()> {
        let document = indoc! {r#"
            [theme]
            name = "catppuccin"
            description = "soothing pastel theme"
            repo = "catppuccin/desktop"
            author = "catppuccin org"
            version = "1.2.0"
            default_subtheme = "mocha"
            depends = ["waybar", "mako"]
            subthemes = ["./mocha/theme.toml", "./latte/theme.toml"]

            [component.wallpaper]
            desc = "wallpaper pack"
            load = "scripts/wallpaper-load.sh"
            unload = "scripts/wallpaper-unload.sh"

            [component.cursor]
            load = "scripts/cursor-load.sh"
        "#};

        let result = Manifest::parse(document, None)?;

        assert_eq!(result.name.as_deref(), Some("catppuccin"));
        assert_eq!(result.description.as_deref(), Some("soothing pastel theme"));
        assert_eq!(result.repo.as_deref(), Some("catppuccin/desktop"));
        assert_eq!(result.author.as_deref(), Some("catppuccin org"));
        assert_eq!(result.version.as_deref(), Some("1.2.0"));
        assert_eq!(result.default_subtheme.as_deref(), Some("mocha"));
        assert_eq!(result.depends, vec!["waybar", "mako"]);
        assert_eq!(
            result.subthemes,
            vec!["./mocha/theme.toml", "./latte/theme.toml"]
        );

        let wallpaper = &result.components["wallpaper"];
        assert_eq!(wallpaper.description.as_deref(), Some("wallpaper pack"));
        assert_eq!(
            wallpaper.load,
            Some(PathBuf::from("scripts/wallpaper-load.sh"))
        );
        assert_eq!(
            wallpaper.unload,
            Some(PathBuf::from("scripts/wallpaper-unload.sh"))
        );
        assert_eq!(wallpaper.update, None);

        let cursor = &result.components["cursor"];
        assert_eq!(cursor.description, None);
        assert_eq!(cursor.load, Some(PathBuf::from("scripts/cursor-load.sh")));

        Ok(())
    }

    #[test]
    fn parse_prefers_long_description_spelling() -> anyhow::Result<()> {
        let document = indoc! {r#"
            [theme]
            name = "foo"
            description = "long form"
            desc = "short form"
        "#};
        let result = Manifest::parse(document, None)?;
        assert_eq!(result.description.as_deref(), Some("long form"));

        let document = indoc! {r#"
            [theme]
            name = "foo"
            description = ""
            desc = "short form"
        "#};
        let result = Manifest::parse(document, None)?;
        assert_eq!(result.description.as_deref(), Some("short form"));

        Ok(())
    }

    #[test]
    fn parse_overriding_name_wins() -> anyhow::Result<()> {
        let document = indoc! {r#"
            [theme]
            name = "whatever the manifest says"
        "#};

        let result = Manifest::parse(document, Some("assigned"))?;
        assert_eq!(result.name.as_deref(), Some("assigned"));

        Ok(())
    }

    #[test]
    fn parse_requires_theme_table() {
        let document = indoc! {r#"
            [component.wallpaper]
            load = "scripts/wallpaper-load.sh"
        "#};

        let result = Manifest::parse(document, None);
        assert!(matches!(result, Err(ManifestError::MissingThemeTable)));
    }

    #[test]
    fn parse_rejects_malformed_document() {
        let result = Manifest::parse("theme = [not even close", None);
        assert!(matches!(result, Err(ManifestError::Deserialize(_))));
    }
}
