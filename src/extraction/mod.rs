//! Message extraction module
//!
//! This module scans chat text for mentions, emoticons and links, and
//! resolves a page title for every link it finds.

pub mod fetch;
pub mod links;
pub mod message;
pub mod normalize;
pub mod patterns;
pub mod title;

pub use fetch::{HttpFetcher, PageFetcher};
pub use links::{LinkResolver, ResolverConfig, ResolverConfigBuilder};
pub use message::{Link, MessageInfo, MessageParser, FALLBACK_TITLE};
pub use normalize::normalize;
pub use patterns::{Extracted, PatternExtractor};
pub use title::find_title;
