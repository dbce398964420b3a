//! Lexical pattern extraction
//!
//! Scans raw message text for `@mentions`, `(emoticons)` and link-shaped
//! substrings. Patterns are compiled once per process and shared immutably.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, instrument};

/// `@` followed by a run of ASCII word characters.
const MENTION_PATTERN: &str = r"@([A-Za-z0-9_]+)";

/// A parenthesized run of 1 to 15 ASCII word characters.
const EMOTICON_PATTERN: &str = r"\(([A-Za-z0-9_]{1,15})\)";

/// Scheme, host (dotted labels or a bracketed literal), optional port and an
/// optional path with query and fragment. Every part stops at whitespace.
const LINK_PATTERN: &str = concat!(
    r"https?://",
    r"(?:[^/:.\s]+(?:\.[^/:.\s]+)*|\[[0-9A-Fa-f:.]+\])",
    r"(?::[0-9]+)?",
    r"(?:/[^?#\s]+(?:\?[^#\s]+)?(?:#\S+)?)?",
);

/// Longest emoticon body that is still captured.
pub const MAX_EMOTICON_LEN: usize = 15;

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MENTION_PATTERN).expect("mention pattern is valid"))
}

fn emoticon_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMOTICON_PATTERN).expect("emoticon pattern is valid"))
}

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LINK_PATTERN).expect("link pattern is valid"))
}

/// Raw output of a pattern scan, before any link is resolved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Unique mention handles (without the `@`)
    pub mentions: Vec<String>,
    /// Unique emoticon names (without the parentheses)
    pub emoticons: Vec<String>,
    /// Every link match, in order of appearance, duplicates included
    pub links: Vec<String>,
}

/// Pattern extraction functionality
pub struct PatternExtractor;

impl PatternExtractor {
    /// Run all three scans over `text`.
    #[instrument(skip(text), fields(len = text.len()))]
    pub fn extract(text: &str) -> Extracted {
        let extracted = Extracted {
            mentions: Self::mentions(text),
            emoticons: Self::emoticons(text),
            links: Self::links(text),
        };

        debug!(
            mentions = extracted.mentions.len(),
            emoticons = extracted.emoticons.len(),
            links = extracted.links.len(),
            "Scanned message"
        );

        extracted
    }

    /// Unique mention handles.
    ///
    /// The pattern re-anchors at every `@`, so `@one@two` yields both handles
    /// while `@@one` yields only `one`.
    pub fn mentions(text: &str) -> Vec<String> {
        unique_captures(mention_regex(), text)
    }

    /// Unique emoticon names. Runs longer than [`MAX_EMOTICON_LEN`] are
    /// rejected outright rather than truncated.
    pub fn emoticons(text: &str) -> Vec<String> {
        unique_captures(emoticon_regex(), text)
    }

    /// All link-shaped substrings in order of appearance.
    ///
    /// Links are not deduplicated: each occurrence is resolved on its own and
    /// keeps its position in the final result.
    pub fn links(text: &str) -> Vec<String> {
        link_regex()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Collect the first capture group of every match, dropping repeats.
/// First-seen order is kept so output is deterministic.
fn unique_captures(regex: &Regex, text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    regex
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|value| seen.insert(*value))
        .map(String::from)
        .collect()
}
