//! Server configuration
//!
//! Every option is a CLI flag with an environment-variable fallback, so the
//! server runs unchanged under a process manager that only sets env vars.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;
use tokio::net::lookup_host;

use crate::error::ConfigError;
use crate::extraction::ResolverConfig;

/// Default listen host
pub const DEFAULT_HOST: &str = "localhost";

/// Default listen port
pub const DEFAULT_PORT: u16 = 9080;

/// Message parser HTTP server
#[derive(Parser, Debug, Clone)]
#[command(name = "mparser")]
#[command(version)]
#[command(about = "Extracts mentions, emoticons and titled links from chat messages")]
pub struct Config {
    /// Host to bind to
    #[arg(short = 'H', long, env = "LISTEN_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "LISTEN_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Per-link fetch timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 5)]
    pub fetch_timeout_secs: u64,

    /// Maximum link fetches in flight at once
    #[arg(long, env = "MAX_CONCURRENT_FETCHES", default_value_t = 16)]
    pub max_concurrent_fetches: usize,

    /// Upper bound on resolving all links of one message, in seconds
    #[arg(long, env = "RESOLVE_DEADLINE_SECS", default_value_t = 10)]
    pub resolve_deadline_secs: u64,

    /// Maximum bytes of a linked page read while looking for its title
    #[arg(long, env = "MAX_PAGE_BYTES", default_value_t = 1024 * 1024)]
    pub max_page_bytes: usize,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_REQUEST_BYTES", default_value_t = 64 * 1024)]
    pub max_request_bytes: usize,

    /// Whole-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 15)]
    pub request_timeout_secs: u64,

    /// Allowed CORS origins (comma separated, `*` for any). Empty allows localhost only.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Serve HTTPS with the certificate and key below
    #[arg(long = "ssl", env = "SSL_ON", value_parser = BoolishValueParser::new())]
    pub ssl: bool,

    /// PEM certificate chain, required with `--ssl`
    #[arg(long, env = "SSL_CERT_PATH")]
    pub ssl_cert_path: Option<PathBuf>,

    /// PEM private key, required with `--ssl`
    #[arg(long, env = "SSL_KEY_PATH")]
    pub ssl_key_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            fetch_timeout_secs: 5,
            max_concurrent_fetches: 16,
            resolve_deadline_secs: 10,
            max_page_bytes: 1024 * 1024,
            max_request_bytes: 64 * 1024,
            request_timeout_secs: 15,
            cors_origins: Vec::new(),
            ssl: false,
            ssl_cert_path: None,
            ssl_key_path: None,
            verbose: false,
        }
    }
}

impl Config {
    /// Reject zero limits and timeouts, and TLS without a key pair.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssl {
            if self.ssl_cert_path.is_none() {
                return Err(ConfigError::MissingTlsPath("SSL_CERT_PATH"));
            }
            if self.ssl_key_path.is_none() {
                return Err(ConfigError::MissingTlsPath("SSL_KEY_PATH"));
            }
        }
        if self.max_request_bytes == 0 {
            return Err(ConfigError::ZeroValue("max_request_bytes"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroValue("request_timeout_secs"));
        }
        self.resolver_config().validate()
    }

    /// Resolver settings derived from this config.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::builder()
            .fetch_timeout(Duration::from_secs(self.fetch_timeout_secs))
            .max_concurrent_fetches(self.max_concurrent_fetches)
            .max_page_bytes(self.max_page_bytes)
            .resolve_deadline(Some(Duration::from_secs(self.resolve_deadline_secs)))
            .build()
    }

    /// Certificate and key paths when TLS is on.
    pub fn tls_paths(&self) -> Option<(&Path, &Path)> {
        if !self.ssl {
            return None;
        }
        Some((self.ssl_cert_path.as_deref()?, self.ssl_key_path.as_deref()?))
    }

    /// Whole-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve `host:port` to a bindable socket address.
    pub async fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let target = format!("{}:{}", self.host, self.port);
        let mut addrs = lookup_host(target.clone())
            .await
            .map_err(|e| ConfigError::InvalidAddress(format!("{target}: {e}")))?;
        addrs.next().ok_or(ConfigError::InvalidAddress(target))
    }

    /// Default log filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
