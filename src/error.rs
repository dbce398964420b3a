//! Error types for the message parser
//!
//! Per-link failures (`NormalizationError`, `FetchError`) never reach
//! [`Error`]: the link resolver absorbs them into fallback titles. [`Error`]
//! only covers startup and serving.

use thiserror::Error;

/// The main error type for message parser operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Link normalization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// The link is not a parseable URL
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending link
        url: String,
        /// Parser message
        reason: String,
    },

    /// The URL parsed but carries no host to encode
    #[error("URL has no host: {0}")]
    MissingHost(String),

    /// The host could not be converted to its ASCII-compatible form
    #[error("Host encoding failed for {0}")]
    HostEncoding(String),
}

/// Page fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request did not complete within the per-request timeout
    #[error("Request to {url} timed out")]
    Timeout {
        /// Requested URL
        url: String,
    },

    /// Could not connect to the remote host
    #[error("Connection to {url} failed: {message}")]
    Connect {
        /// Requested URL
        url: String,
        /// Underlying error message
        message: String,
    },

    /// Any other transport failure
    #[error("Request to {url} failed: {message}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying error message
        message: String,
    },

    /// The response body could not be read
    #[error("Unable to read response body for {url}: {message}")]
    Body {
        /// Requested URL
        url: String,
        /// Underlying error message
        message: String,
    },
}

impl FetchError {
    /// Classify a reqwest error raised while sending a request.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if err.is_connect() {
            FetchError::Connect {
                url,
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            FetchError::Body {
                url,
                message: err.to_string(),
            }
        } else {
            FetchError::Request {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value that must be positive was zero
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    /// The listen address could not be parsed
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// TLS is on but a key pair path is missing
    #[error("TLS is enabled but {0} is not set")]
    MissingTlsPath(&'static str),
}

/// HTTP server errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind the listener
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address we tried to bind
        addr: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The TLS certificate or key could not be loaded
    #[error("Unable to load key pair ({cert}, {key}): {source}")]
    Tls {
        /// Certificate path
        cert: String,
        /// Key path
        key: String,
        /// Underlying I/O or PEM error
        #[source]
        source: std::io::Error,
    },

    /// The request body could not be read
    #[error("Unable to read request body: {0}")]
    UnreadableBody(String),
}

/// Result type alias for message parser operations
pub type Result<T> = std::result::Result<T, Error>;
