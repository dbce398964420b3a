//! Link title resolution
//!
//! Every matched link is resolved in its own task: normalize, fetch, scan
//! for a `<title>`. Each task is tagged with the index of its link and writes
//! into that slot of a pre-filled output, so the result order always equals
//! discovery order no matter which fetch finishes first.
//!
//! ```text
//! raw links ──▶ [fallback slots 0..N]
//!     │
//!     ├─ task 0 ─▶ normalize ─▶ permit ─▶ fetch ─▶ title ─┐
//!     ├─ task 1 ─▶ ...                                    ├─▶ slot[index] = title
//!     └─ task N ─▶ ...                                    ┘
//! ```

use crate::error::ConfigError;
use crate::extraction::fetch::{
    HttpFetcher, PageFetcher, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_PAGE_BYTES,
};
use crate::extraction::message::Link;
use crate::extraction::normalize::normalize;
use crate::extraction::title::find_title;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Default cap on in-flight page fetches per resolver
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

/// Default bound on a whole `resolve` call
pub const DEFAULT_RESOLVE_DEADLINE: Duration = Duration::from_secs(10);

/// Configuration for link resolution
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Per-request timeout (default: 5s)
    pub fetch_timeout: Duration,
    /// Maximum body bytes read per page (default: 1 MiB)
    pub max_page_bytes: usize,
    /// Maximum fetches in flight at once (default: 16)
    pub max_concurrent_fetches: usize,
    /// Overall bound on one resolve call (None = only per-request timeouts apply)
    pub resolve_deadline: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_page_bytes: DEFAULT_MAX_PAGE_BYTES,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            resolve_deadline: Some(DEFAULT_RESOLVE_DEADLINE),
        }
    }
}

impl ResolverConfig {
    /// Create a new config builder
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::default()
    }

    /// Reject values that would stall or disable resolution
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroValue("fetch_timeout"));
        }
        if self.max_page_bytes == 0 {
            return Err(ConfigError::ZeroValue("max_page_bytes"));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::ZeroValue("max_concurrent_fetches"));
        }
        if self.resolve_deadline.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroValue("resolve_deadline"));
        }
        Ok(())
    }
}

/// Builder for ResolverConfig
#[derive(Default)]
pub struct ResolverConfigBuilder {
    config: ResolverConfig,
}

impl ResolverConfigBuilder {
    /// Set the per-request timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    /// Set the page body cap
    pub fn max_page_bytes(mut self, bytes: usize) -> Self {
        self.config.max_page_bytes = bytes;
        self
    }

    /// Set the concurrent fetch cap
    pub fn max_concurrent_fetches(mut self, max: usize) -> Self {
        self.config.max_concurrent_fetches = max;
        self
    }

    /// Set or clear the overall deadline
    pub fn resolve_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.config.resolve_deadline = deadline;
        self
    }

    /// Build the config
    pub fn build(self) -> ResolverConfig {
        self.config
    }
}

/// Concurrent link title resolver.
///
/// Cheap to share: the fetcher and the fetch permits are reference counted,
/// so one resolver serves every request.
#[derive(Clone)]
pub struct LinkResolver {
    fetcher: Arc<dyn PageFetcher>,
    permits: Arc<Semaphore>,
    deadline: Option<Duration>,
}

impl std::fmt::Debug for LinkResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkResolver")
            .field("available_permits", &self.permits.available_permits())
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl LinkResolver {
    /// Resolver over an arbitrary fetcher with no overall deadline.
    pub fn new(fetcher: Arc<dyn PageFetcher>, max_concurrent_fetches: usize) -> Self {
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(max_concurrent_fetches.max(1))),
            deadline: None,
        }
    }

    /// Resolver over a real HTTP client configured from `config`.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fetcher = HttpFetcher::new(config.fetch_timeout, config.max_page_bytes)?;
        Ok(Self::new(Arc::new(fetcher), config.max_concurrent_fetches)
            .with_deadline(config.resolve_deadline))
    }

    /// Bound every `resolve` call by `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Resolve titles for `raw_links`. `output[i]` always describes `raw_links[i]`.
    ///
    /// Never fails: links that cannot be normalized or fetched, and links
    /// still in flight when `cancel` fires or the deadline passes, keep the
    /// fallback title.
    #[instrument(skip(self, raw_links, cancel), fields(count = raw_links.len()))]
    pub async fn resolve(&self, raw_links: &[String], cancel: &CancellationToken) -> Vec<Link> {
        let mut slots: Vec<Link> = raw_links.iter().map(|url| Link::fallback(url)).collect();
        if raw_links.is_empty() {
            return slots;
        }

        // Child token: cancelled when this call returns or is dropped, so no
        // task outlives the call even if the caller never cancels.
        let cancel = cancel.child_token();
        let _abort_on_exit = cancel.clone().drop_guard();

        if let Some(deadline) = self.deadline {
            let timer = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(deadline) => {
                        debug!(?deadline, "Resolve deadline reached");
                        timer.cancel();
                    }
                    _ = timer.cancelled() => {}
                }
            });
        }

        let handles: Vec<_> = raw_links
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let fetcher = Arc::clone(&self.fetcher);
                let permits = Arc::clone(&self.permits);
                let cancel = cancel.clone();
                let raw = raw.clone();

                tokio::spawn(async move {
                    let title = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            debug!(link = %raw, "Resolution cancelled");
                            None
                        }
                        title = resolve_title(fetcher.as_ref(), &permits, &raw) => title,
                    };
                    (index, title)
                })
            })
            .collect();

        let mut resolved = 0usize;
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok((index, Some(title))) => {
                    slots[index].title = title;
                    resolved += 1;
                }
                Ok((_, None)) => {}
                Err(e) => warn!(error = %e, "Link task failed"),
            }
        }

        debug!(
            resolved,
            fallback = slots.len() - resolved,
            "Resolved links"
        );
        slots
    }

    /// Resolve a single link on the caller's task.
    pub async fn resolve_one(&self, raw: &str) -> Link {
        let mut link = Link::fallback(raw);
        if let Some(title) = resolve_title(self.fetcher.as_ref(), &self.permits, raw).await {
            link.title = title;
        }
        link
    }
}

/// Title for one link, or `None` when the fallback should stand.
async fn resolve_title(
    fetcher: &dyn PageFetcher,
    permits: &Semaphore,
    raw: &str,
) -> Option<String> {
    let url = match normalize(raw) {
        Ok(url) => url,
        Err(e) => {
            debug!(link = %raw, error = %e, "Unable to normalize link");
            return None;
        }
    };

    // The semaphore is never closed, so acquire only fails if that changes.
    let _permit = permits.acquire().await.ok()?;

    let body = match fetcher.fetch(&url).await {
        Ok(body) => body,
        Err(e) => {
            debug!(link = %raw, error = %e, "Fetch failed");
            return None;
        }
    };

    let title = find_title(&body);
    if title.is_none() {
        debug!(link = %raw, "No title in response");
    }
    title
}
