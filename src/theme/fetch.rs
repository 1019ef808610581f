// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Manifest document retrieval.
//!
//! Themes publish their manifest as a plain file in their repository, so
//! retrieval is one unauthenticated GET against the raw file host. The only
//! wrinkle is the branch: older repositories still serve from "master"
//! while newer ones use "main", so a not-found answer on the requested
//! branch is retried exactly once on the configured fallback branch before
//! it becomes an error.
//!
//! No caching happens at this layer. The registry keeps its own mirror, and
//! every other caller wants the freshest manifest it can get.

use crate::theme::ThemeRef;

use std::future::Future;
use tracing::debug;

/// Layer of indirection for raw document transport.
pub trait Transport: Send + Sync + 'static {
    /// Issue a plain GET, returning status code and body.
    ///
    /// Transport failures (no route, TLS trouble) are errors. A response
    /// with a non-success status is NOT an error at this layer; the caller
    /// decides what to do with the status code.
    fn get_raw(
        &self,
        url: String,
    ) -> impl Future<Output = Result<(u16, String), FetchError>> + Send;
}

/// Raw document transport over reqwest.
#[derive(Debug, Default, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Construct new HTTP transport with its own connection pool.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Transport for HttpTransport {
    fn get_raw(
        &self,
        url: String,
    ) -> impl Future<Output = Result<(u16, String), FetchError>> + Send {
        let client = self.client.clone();
        async move {
            let response = client.get(&url).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok((status, body))
        }
    }
}

/// Retrieve raw manifest documents for theme refs.
#[derive(Debug)]
pub struct ManifestFetcher<T>
where
    T: Transport,
{
    transport: T,
    fallback_branch: String,
}

impl<T> ManifestFetcher<T>
where
    T: Transport,
{
    /// Construct new manifest fetcher.
    pub fn new(transport: T, fallback_branch: impl Into<String>) -> Self {
        Self {
            transport,
            fallback_branch: fallback_branch.into(),
        }
    }

    /// Retrieve the raw manifest document at target ref.
    ///
    /// On a not-found answer the fetch is retried exactly once on the
    /// fallback branch, unless the ref already names it. The ref that
    /// actually answered is returned alongside the document, so the caller
    /// anchors sub-theme references at the branch that exists.
    ///
    /// # Errors
    ///
    /// - Return [`FetchError::NotFound`] if neither branch serves the
    ///   manifest.
    /// - Return [`FetchError::Status`] if the host answers with any other
    ///   non-success status.
    /// - Return [`FetchError::Transport`] if the request itself fails.
    pub async fn fetch(&self, target: ThemeRef) -> Result<(String, ThemeRef)> {
        debug_assert!(!target.host.is_empty());
        debug_assert!(!target.owner.is_empty());
        debug_assert!(!target.repo.is_empty());
        debug_assert!(!target.path.is_empty());

        let (status, body) = self.transport.get_raw(target.raw_url()).await?;
        if success(status) {
            return Ok((body, target));
        }

        if status == 404 && target.branch != self.fallback_branch {
            let retry = target.with_branch(self.fallback_branch.as_str());
            debug!("manifest not found at {target}, retrying {retry}");

            let (status, body) = self.transport.get_raw(retry.raw_url()).await?;
            if success(status) {
                return Ok((body, retry));
            }

            return Err(fetch_failure(retry, status));
        }

        Err(fetch_failure(target, status))
    }
}

fn success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn fetch_failure(target: ThemeRef, status: u16) -> FetchError {
    match status {
        404 => FetchError::NotFound { target, status },
        _ => FetchError::Status { target, status },
    }
}

/// Manifest retrieval error types.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Manifest missing on requested and fallback branch.
    #[error("no manifest found at {target} (status {status})")]
    NotFound { target: ThemeRef, status: u16 },

    /// Host answered with a non-success status.
    #[error("failed to fetch manifest at {target} (status {status})")]
    Status { target: ThemeRef, status: u16 },

    /// Request never produced a response.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Friendly result alias :3
type Result<T, E = FetchError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    /// Transport serving a fixed url to document mapping, counting hits.
    struct FixtureTransport {
        files: HashMap<String, String>,
        hits: Arc<AtomicUsize>,
    }

    impl FixtureTransport {
        fn new(
            files: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
        ) -> Self {
            Self {
                files: files
                    .into_iter()
                    .map(|(url, body)| (url.into(), body.into()))
                    .collect(),
                hits: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn hit_counter(&self) -> Arc<AtomicUsize> {
            self.hits.clone()
        }
    }

    impl Transport for FixtureTransport {
        fn get_raw(
            &self,
            url: String,
        ) -> impl Future<Output = std::result::Result<(u16, String), FetchError>> + Send {
            self.hits.fetch_add(1, Ordering::Relaxed);
            let response = self.files.get(&url).cloned();
            async move {
                match response {
                    Some(body) => Ok((200, body)),
                    None => Ok((404, String::new())),
                }
            }
        }
    }

    fn target() -> ThemeRef {
        ThemeRef::new("raw.example.org", "blah", "foo", "main", "theme.toml")
    }

    #[tokio::test]
    async fn fetch_primary_branch_hit() -> anyhow::Result<()> {
        let transport = FixtureTransport::new([(
            "https://raw.example.org/blah/foo/main/theme.toml",
            "[theme]\nname = \"foo\"",
        )]);
        let hits = transport.hit_counter();
        let fetcher = ManifestFetcher::new(transport, "master");

        let (document, effective) = fetcher.fetch(target()).await?;

        assert_eq!(document, "[theme]\nname = \"foo\"");
        assert_eq!(effective.branch, "main");
        assert_eq!(hits.load(Ordering::Relaxed), 1);

        Ok(())
    }

    #[tokio::test]
    async fn fetch_falls_back_once_on_not_found() -> anyhow::Result<()> {
        let transport = FixtureTransport::new([(
            "https://raw.example.org/blah/foo/master/theme.toml",
            "[theme]\nname = \"foo\"",
        )]);
        let hits = transport.hit_counter();
        let fetcher = ManifestFetcher::new(transport, "master");

        let (_, effective) = fetcher.fetch(target()).await?;

        assert_eq!(effective.branch, "master");
        assert_eq!(hits.load(Ordering::Relaxed), 2);

        Ok(())
    }

    #[tokio::test]
    async fn fetch_double_not_found_tries_exactly_twice() {
        let transport = FixtureTransport::new(Vec::<(String, String)>::new());
        let hits = transport.hit_counter();
        let fetcher = ManifestFetcher::new(transport, "master");

        let result = fetcher.fetch(target()).await;

        assert!(matches!(result, Err(FetchError::NotFound { status: 404, .. })));
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn fetch_skips_retry_when_already_on_fallback() {
        let transport = FixtureTransport::new(Vec::<(String, String)>::new());
        let hits = transport.hit_counter();
        let fetcher = ManifestFetcher::new(transport, "master");

        let result = fetcher.fetch(target().with_branch("master")).await;

        assert!(matches!(result, Err(FetchError::NotFound { .. })));
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }
}
