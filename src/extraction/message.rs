//! Parsed message records
//!
//! [`MessageParser`] ties the pieces together: scan the text, resolve link
//! titles, and aggregate everything into a [`MessageInfo`].

use crate::extraction::links::LinkResolver;
use crate::extraction::patterns::PatternExtractor;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Title reported for links whose page title could not be resolved
pub const FALLBACK_TITLE: &str = "Website";

/// A link found in a message together with its page title
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// The link exactly as it appeared in the message
    pub url: String,
    /// Page title, or [`FALLBACK_TITLE`]
    pub title: String,
}

impl Link {
    /// Create a link with a known title
    pub fn new<U: Into<String>, T: Into<String>>(url: U, title: T) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    /// Create a link carrying the fallback title
    pub fn fallback<U: Into<String>>(url: U) -> Self {
        Self::new(url, FALLBACK_TITLE)
    }

    /// Whether the title is still the fallback
    pub fn is_fallback(&self) -> bool {
        self.title == FALLBACK_TITLE
    }
}

/// Everything extracted from one message.
///
/// Empty categories serialize as `[]`, never `null`. The order of
/// `mentions` and `emoticons` carries no meaning; `links` follows the
/// order in which links appear in the message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Unique mention handles
    pub mentions: Vec<String>,
    /// Unique emoticon names
    pub emoticons: Vec<String>,
    /// Resolved links, one per occurrence
    pub links: Vec<Link>,
}

impl MessageInfo {
    /// Combine the three extraction outputs. Performs no validation.
    pub fn aggregate(mentions: Vec<String>, emoticons: Vec<String>, links: Vec<Link>) -> Self {
        Self {
            mentions,
            emoticons,
            links,
        }
    }
}

/// Message parsing functionality
#[derive(Debug, Clone)]
pub struct MessageParser {
    resolver: LinkResolver,
}

impl MessageParser {
    /// Create a parser resolving links through `resolver`
    pub fn new(resolver: LinkResolver) -> Self {
        Self { resolver }
    }

    /// Parse `text` with no caller-side cancellation.
    pub async fn parse(&self, text: &str) -> MessageInfo {
        self.parse_with_cancel(text, &CancellationToken::new()).await
    }

    /// Parse `text`; link fetches still running when `cancel` fires are
    /// abandoned and keep the fallback title.
    #[instrument(skip(self, text, cancel), fields(len = text.len()))]
    pub async fn parse_with_cancel(&self, text: &str, cancel: &CancellationToken) -> MessageInfo {
        let extracted = PatternExtractor::extract(text);
        let links = self.resolver.resolve(&extracted.links, cancel).await;

        let info = MessageInfo::aggregate(extracted.mentions, extracted.emoticons, links);
        info!(
            mentions = info.mentions.len(),
            emoticons = info.emoticons.len(),
            links = info.links.len(),
            "Parsed message"
        );
        info
    }
}
