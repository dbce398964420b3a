//! Message Parser - chat message signal extraction
//!
//! Extracts `@mentions`, `(emoticons)` and links from free-form chat text
//! and resolves a page title for every link by fetching it.
//!
//! # Features
//!
//! - **Pattern extraction**: mentions and emoticons deduplicated, links kept in order
//! - **Host normalization**: non-ASCII hosts are punycoded before fetching
//! - **Concurrent title resolution**: one task per link, bounded by a
//!   semaphore, cancellable, results assembled by index
//! - **HTTP server**: `POST /` returns the result as JSON (HTTPS with `--ssl`)
//!
//! # Architecture
//!
//! ```text
//! text ──▶ PatternExtractor ──▶ mentions, emoticons
//!                 │
//!                 ▼
//!            raw links ──▶ LinkResolver ──┬─▶ normalize ─▶ fetch ─▶ <title>
//!                                         │      (one task per link)
//!                                         ▼
//!                                  Vec<Link> in discovery order
//!                                         │
//!                                         ▼
//!                                    MessageInfo
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use message_parser::extraction::{LinkResolver, MessageParser, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = LinkResolver::from_config(&ResolverConfig::default())?;
//!     let parser = MessageParser::new(resolver);
//!
//!     let info = parser.parse("@bob look (wow) https://example.com/page").await;
//!     println!("{}", serde_json::to_string(&info)?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod cors;
pub mod error;
pub mod extraction;
pub mod handlers;
pub mod server;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use extraction::{Link, LinkResolver, MessageInfo, MessageParser, PatternExtractor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
