// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Theme tree resolution.
//!
//! Resolution turns one [`ThemeRef`] coordinate into a fully populated
//! [`ThemeRecord`] tree. The manifest at the coordinate is fetched and
//! parsed, metadata the manifest leaves unset is copied in from the parent,
//! and every sub-theme reference is resolved the same way underneath it.
//!
//! # Cycle Detection
//!
//! Sub-theme references are arbitrary paths, so nothing stops a manifest
//! from referencing an ancestor, or itself. Every resolution in flight
//! registers its ref in a shared visiting set before descending, and drops
//! it again on the way out, error or not. A ref that is already registered
//! when its resolution starts is a cycle, and fails that subtree with the
//! offending path spelled out.
//!
//! # Concurrency
//!
//! Sibling sub-themes have no data dependency on one another, so their
//! manifests are fetched concurrently. A semaphore caps how many fetches
//! are in flight at once, and the permit is held only around the fetch
//! itself, never across the recursion into children. Results join back in
//! manifest declaration order, whatever order the fetches complete in.

use crate::theme::{
    fetch::{FetchError, ManifestFetcher, Transport},
    manifest::{Manifest, ManifestError},
    Metadata, ThemeRecord, ThemeRef, ValidationWarning,
};

use futures::future::{try_join_all, BoxFuture};
use std::{
    collections::HashSet,
    sync::Mutex,
};
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

/// Resolve theme refs into fully populated theme record trees.
#[derive(Debug)]
pub struct ThemeResolver<T>
where
    T: Transport,
{
    fetcher: ManifestFetcher<T>,
    limit: Semaphore,
}

impl<T> ThemeResolver<T>
where
    T: Transport,
{
    /// Construct new theme resolver.
    ///
    /// At most `fetch_limit` manifest fetches run concurrently across one
    /// resolver, however deep or wide the trees it resolves get.
    pub fn new(fetcher: ManifestFetcher<T>, fetch_limit: usize) -> Self {
        Self {
            fetcher,
            limit: Semaphore::new(fetch_limit.max(1)),
        }
    }

    /// Resolve the full theme tree at target ref.
    ///
    /// # Errors
    ///
    /// - Return [`ResolveError::Cycle`] if any resolution path revisits a
    ///   ref it is already resolving.
    /// - Return [`ResolveError::Fetch`] if a manifest cannot be retrieved.
    /// - Return [`ResolveError::Parse`] if a manifest cannot be parsed.
    #[instrument(skip(self), level = "debug")]
    pub async fn resolve(&self, target: ThemeRef) -> Result<ThemeRecord> {
        self.resolve_named(target, None).await
    }

    /// Resolve the full theme tree at target ref under an assigned name.
    ///
    /// The assigned name wins over whatever the root manifest calls
    /// itself. Sub-themes always keep their own names.
    pub async fn resolve_named(
        &self,
        target: ThemeRef,
        overriding_name: Option<&str>,
    ) -> Result<ThemeRecord> {
        let visiting = Mutex::new(HashSet::new());
        self.resolve_at(
            target,
            overriding_name.map(str::to_owned),
            Metadata::default(),
            &visiting,
            Vec::new(),
        )
        .await
    }

    /// One step of recursive resolution.
    ///
    /// `ancestry` is the ordered path of refs above this one, carried only
    /// so a cycle error can name the loop. Membership itself is checked
    /// against the shared `visiting` set, which sibling branches mutate
    /// concurrently.
    fn resolve_at<'a>(
        &'a self,
        target: ThemeRef,
        overriding_name: Option<String>,
        inherited: Metadata,
        visiting: &'a Mutex<HashSet<ThemeRef>>,
        ancestry: Vec<ThemeRef>,
    ) -> BoxFuture<'a, Result<ThemeRecord>> {
        Box::pin(async move {
            {
                let mut registered = visiting.lock().unwrap();
                if registered.contains(&target) {
                    let mut path = ancestry.clone();
                    path.push(target.clone());
                    return Err(ResolveError::Cycle { path });
                }
                registered.insert(target.clone());
            }

            // INVARIANT: Registration is dropped on every exit path.
            let _visit = VisitGuard {
                visiting,
                entry: target.clone(),
            };

            let (document, effective) = {
                let _permit = self.limit.acquire().await.unwrap();
                self.fetcher.fetch(target).await?
            };

            let manifest = Manifest::parse(&document, overriding_name.as_deref()).map_err(
                |source| ResolveError::Parse {
                    target: effective.clone(),
                    source,
                },
            )?;
            debug!("resolved manifest at {effective}");

            let name = manifest
                .name
                .unwrap_or_else(|| effective.short_name().to_owned());
            let description = manifest.description.or(inherited.description);
            let author = manifest.author.or(inherited.author);
            let version = manifest.version.or(inherited.version);
            let inheritable = Metadata {
                description: description.clone(),
                author: author.clone(),
                version: version.clone(),
            };

            let mut lineage = ancestry;
            lineage.push(effective.clone());

            let mut pending = Vec::with_capacity(manifest.subthemes.len());
            for reference in &manifest.subthemes {
                pending.push(self.resolve_at(
                    effective.subtheme(reference),
                    None,
                    inheritable.clone(),
                    visiting,
                    lineage.clone(),
                ));
            }
            let subthemes = try_join_all(pending).await?;

            let mut warnings = Vec::new();
            if let Some(default) = &manifest.default_subtheme {
                if !subthemes.iter().any(|subtheme| subtheme.name == *default) {
                    warnings.push(ValidationWarning {
                        field: "default_subtheme",
                        reason: format!(
                            "\"{default}\" does not name any sub-theme of \"{name}\""
                        ),
                    });
                }
            }

            Ok(ThemeRecord {
                name,
                description,
                author,
                version,
                coordinate: effective,
                repo: manifest.repo,
                default_subtheme: manifest.default_subtheme,
                depends: manifest.depends,
                subthemes,
                components: manifest.components,
                warnings,
            })
        })
    }
}

/// Scoped registration in the visiting set.
struct VisitGuard<'a> {
    visiting: &'a Mutex<HashSet<ThemeRef>>,
    entry: ThemeRef,
}

impl Drop for VisitGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut registered) = self.visiting.lock() {
            registered.remove(&self.entry);
        }
    }
}

/// Theme resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A resolution path revisited a ref it is already resolving.
    #[error("sub-theme resolution cycle: {}", render_cycle(.path))]
    Cycle { path: Vec<ThemeRef> },

    /// Manifest retrieval failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Manifest parsing failed.
    #[error("failed to parse manifest at {target}")]
    Parse {
        target: ThemeRef,
        #[source]
        source: ManifestError,
    },
}

fn render_cycle(path: &[ThemeRef]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Friendly result alias :3
type Result<T, E = ResolveError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::{collections::HashMap, future::Future};

    /// Transport serving manifests out of an in-memory repository.
    ///
    /// Keys are `branch:path` within one well-known owner/repo pair.
    struct RepoTransport {
        files: HashMap<String, String>,
    }

    impl RepoTransport {
        fn new(files: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
            Self {
                files: files
                    .into_iter()
                    .map(|(location, body)| (location.into(), body.into()))
                    .collect(),
            }
        }
    }

    impl Transport for RepoTransport {
        fn get_raw(
            &self,
            url: String,
        ) -> impl Future<Output = std::result::Result<(u16, String), FetchError>> + Send {
            let location = url
                .strip_prefix("https://raw.example.org/blah/foo/")
                .map(|rest| rest.replacen('/', ":", 1));
            let response = location.and_then(|key| self.files.get(&key).cloned());
            async move {
                match response {
                    Some(body) => Ok((200, body)),
                    None => Ok((404, String::new())),
                }
            }
        }
    }

    fn resolver(transport: RepoTransport) -> ThemeResolver<RepoTransport> {
        ThemeResolver::new(ManifestFetcher::new(transport, "master"), 4)
    }

    fn root() -> ThemeRef {
        ThemeRef::new("raw.example.org", "blah", "foo", "main", "theme.toml")
    }

    #[tokio::test]
    async fn resolve_expands_subthemes_in_declaration_order() -> anyhow::Result<()> {
        let transport = RepoTransport::new([
            (
                "main:theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Foo"
                    author = "blah"
                    version = "0.3.0"
                    subthemes = ["./dark/theme.toml", "./light/theme.toml"]
                "#},
            ),
            (
                "main:dark/theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Dark"
                "#},
            ),
            (
                "main:light/theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Light"
                "#},
            ),
        ]);

        let record = resolver(transport).resolve(root()).await?;

        assert_eq!(record.name, "Foo");
        let names: Vec<_> = record
            .subthemes
            .iter()
            .map(|subtheme| subtheme.name.as_str())
            .collect();
        assert_eq!(names, vec!["Dark", "Light"]);
        assert!(record.is_valid());

        Ok(())
    }

    #[tokio::test]
    async fn resolve_inherits_unset_metadata() -> anyhow::Result<()> {
        let transport = RepoTransport::new([
            (
                "main:theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Foo"
                    description = "parent description"
                    author = "blah"
                    version = "0.3.0"
                    subthemes = ["./dark/theme.toml"]
                "#},
            ),
            (
                "main:dark/theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Dark"
                    author = "someone else"
                    subthemes = ["./dark/oled/theme.toml"]
                "#},
            ),
            (
                "main:dark/oled/theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Oled"
                "#},
            ),
        ]);

        let record = resolver(transport).resolve(root()).await?;

        let dark = &record.subthemes[0];
        assert_eq!(dark.description.as_deref(), Some("parent description"));
        assert_eq!(dark.author.as_deref(), Some("someone else"));
        assert_eq!(dark.version.as_deref(), Some("0.3.0"));

        // Grandchild inherits the child's override, not the root's value.
        let oled = &dark.subthemes[0];
        assert_eq!(oled.author.as_deref(), Some("someone else"));
        assert_eq!(oled.version.as_deref(), Some("0.3.0"));

        Ok(())
    }

    #[tokio::test]
    async fn resolve_leaves_unset_metadata_unset() -> anyhow::Result<()> {
        let transport = RepoTransport::new([
            (
                "main:theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Foo"
                    subthemes = ["./dark/theme.toml"]
                "#},
            ),
            (
                "main:dark/theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Dark"
                "#},
            ),
        ]);

        let record = resolver(transport).resolve(root()).await?;

        assert_eq!(record.name, "Foo");
        let dark = &record.subthemes[0];
        assert_eq!(dark.name, "Dark");
        assert_eq!(dark.author, None);
        assert_eq!(dark.version, None);
        assert_eq!(dark.description, None);

        Ok(())
    }

    #[tokio::test]
    async fn resolve_names_fall_back_to_repository() -> anyhow::Result<()> {
        let transport = RepoTransport::new([(
            "main:theme.toml",
            indoc! {r#"
                [theme]
                version = "0.1.0"
            "#},
        )]);

        let record = resolver(transport).resolve(root()).await?;
        assert_eq!(record.name, "foo");

        Ok(())
    }

    #[tokio::test]
    async fn resolve_flags_dangling_default_subtheme() -> anyhow::Result<()> {
        let transport = RepoTransport::new([
            (
                "main:theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Foo"
                    default_subtheme = "Midnight"
                    subthemes = ["./dark/theme.toml"]
                "#},
            ),
            (
                "main:dark/theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Dark"
                "#},
            ),
        ]);

        let record = resolver(transport).resolve(root()).await?;

        assert!(!record.is_valid());
        assert_eq!(record.warnings.len(), 1);
        assert_eq!(record.warnings[0].field, "default_subtheme");

        Ok(())
    }

    #[tokio::test]
    async fn resolve_accepts_matching_default_subtheme() -> anyhow::Result<()> {
        let transport = RepoTransport::new([
            (
                "main:theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Foo"
                    default_subtheme = "Dark"
                    subthemes = ["./dark/theme.toml"]
                "#},
            ),
            (
                "main:dark/theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Dark"
                "#},
            ),
        ]);

        let record = resolver(transport).resolve(root()).await?;
        assert!(record.is_valid());

        Ok(())
    }

    #[tokio::test]
    async fn resolve_rejects_self_reference() {
        let transport = RepoTransport::new([(
            "main:theme.toml",
            indoc! {r#"
                [theme]
                name = "Foo"
                subthemes = ["./theme.toml"]
            "#},
        )]);

        let result = resolver(transport).resolve(root()).await;

        match result {
            Err(ResolveError::Cycle { path }) => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 2);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolve_rejects_deep_cycle() {
        let transport = RepoTransport::new([
            (
                "main:theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Foo"
                    subthemes = ["./dark/theme.toml"]
                "#},
            ),
            (
                "main:dark/theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Dark"
                    subthemes = ["/theme.toml"]
                "#},
            ),
        ]);

        let result = resolver(transport).resolve(root()).await;
        assert!(matches!(result, Err(ResolveError::Cycle { .. })));
    }

    #[tokio::test]
    async fn resolve_propagates_missing_subtheme() {
        let transport = RepoTransport::new([(
            "main:theme.toml",
            indoc! {r#"
                [theme]
                name = "Foo"
                subthemes = ["./gone/theme.toml"]
            "#},
        )]);

        let result = resolver(transport).resolve(root()).await;
        assert!(matches!(result, Err(ResolveError::Fetch(_))));
    }

    #[tokio::test]
    async fn resolve_preserves_duplicate_subtheme_names() -> anyhow::Result<()> {
        let transport = RepoTransport::new([
            (
                "main:theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Foo"
                    subthemes = ["./dark/theme.toml", "./extra/theme.toml"]
                "#},
            ),
            (
                "main:dark/theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Dark"
                "#},
            ),
            (
                "main:extra/theme.toml",
                indoc! {r#"
                    [theme]
                    name = "Dark"
                "#},
            ),
        ]);

        let record = resolver(transport).resolve(root()).await?;

        assert_eq!(record.subthemes.len(), 2);
        assert_eq!(record.subthemes[0].name, "Dark");
        assert_eq!(record.subthemes[1].name, "Dark");

        Ok(())
    }
}
