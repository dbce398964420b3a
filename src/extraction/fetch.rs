//! Page fetching
//!
//! The resolver only needs "GET this URL and give me the body". That
//! capability sits behind [`PageFetcher`] so the resolver can be driven by a
//! real HTTP client in production and by in-memory fakes in tests.

use crate::error::{ConfigError, FetchError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default per-request timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cap on how much of a page body is read
pub const DEFAULT_MAX_PAGE_BYTES: usize = 1024 * 1024;

/// User agent sent with every page request
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Something that can GET a URL and return its body as text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the (possibly truncated) response body.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// [`PageFetcher`] backed by a shared `reqwest` connection pool
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_page_bytes: usize,
}

impl HttpFetcher {
    /// Build a fetcher with its own client using the given timeout and body cap.
    pub fn new(timeout: Duration, max_page_bytes: usize) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::with_client(client, max_page_bytes))
    }

    /// Wrap an existing client. The client's own timeout and proxy settings apply.
    pub fn with_client(client: reqwest::Client, max_page_bytes: usize) -> Self {
        Self {
            client,
            max_page_bytes,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        debug!(status = %response.status(), "Received response");

        // Status is deliberately ignored: error pages still carry titles.
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
        {
            let remaining = self.max_page_bytes.saturating_sub(body.len());
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                debug!(limit = self.max_page_bytes, "Body truncated at limit");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
