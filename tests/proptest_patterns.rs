//! Property-based tests for the pattern extractor.
//!
//! Uses proptest to generate message text and check the dedup, ordering and
//! length-boundary guarantees of `PatternExtractor`.

use message_parser::extraction::PatternExtractor;
use proptest::prelude::*;
use std::collections::HashSet;

/// Strategy for ASCII word runs of the given length range
fn word(min: usize, max: usize) -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[A-Za-z0-9_]{{{min},{max}}}")).unwrap()
}

/// Strategy for filler text that cannot contain any token
fn filler() -> impl Strategy<Value = String> {
    "[a-z ,.!?]{0,20}".prop_map(|s| format!(" {s} "))
}

proptest! {
    #[test]
    fn mentions_are_unique(handles in prop::collection::vec(word(1, 12), 1..10), repeat in 1usize..4) {
        let mut text = String::new();
        for _ in 0..repeat {
            for handle in &handles {
                text.push_str(&format!("@{handle} "));
            }
        }

        let mentions = PatternExtractor::mentions(&text);
        let unique: HashSet<_> = mentions.iter().collect();
        let expected: HashSet<_> = handles.iter().collect();

        prop_assert_eq!(unique.len(), mentions.len());
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn emoticon_length_boundary(name in word(1, 30)) {
        let emoticons = PatternExtractor::emoticons(&format!("({name})"));

        if name.len() <= 15 {
            prop_assert_eq!(emoticons, vec![name]);
        } else {
            prop_assert!(emoticons.is_empty());
        }
    }

    #[test]
    fn links_keep_order_and_duplicates(
        hosts in prop::collection::vec("[a-z]{1,8}\\.(com|org|net)", 1..8),
        gaps in prop::collection::vec(filler(), 8),
    ) {
        let mut text = String::new();
        let mut expected = Vec::new();
        for (i, host) in hosts.iter().enumerate() {
            let link = format!("https://{host}/p{i}");
            text.push_str(&gaps[i]);
            text.push_str(&link);
            expected.push(link);
        }
        // Repeat the first link at the end
        text.push(' ');
        text.push_str(&expected[0]);
        expected.push(expected[0].clone());

        prop_assert_eq!(PatternExtractor::links(&text), expected);
    }

    #[test]
    fn extraction_never_panics(text in "\\PC{0,200}") {
        let extracted = PatternExtractor::extract(&text);
        for link in &extracted.links {
            prop_assert!(link.starts_with("http"));
            prop_assert!(!link.chars().any(char::is_whitespace));
        }
    }
}
