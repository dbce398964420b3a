//! Page title scanning
//!
//! Best-effort pattern match for the first `<title>` element. This is not an
//! HTML parser: entities are not decoded and whitespace is kept verbatim.

use regex::Regex;
use std::sync::OnceLock;

/// Tag names match case-insensitively, attributes are skipped and the
/// content may span lines.
const TITLE_PATTERN: &str = r"(?is)<title[^>]*>(.*?)</title>";

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TITLE_PATTERN).expect("title pattern is valid"))
}

/// Text content of the first title element in `body`, if any.
pub fn find_title(body: &str) -> Option<String> {
    title_regex()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
