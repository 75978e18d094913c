//! Query text preparation
//!
//! Inputs are normalized and cut to a fixed grapheme budget before they are
//! hashed or sent to the provider, so identical logical queries always map to
//! the same cache key.

use unicode_segmentation::UnicodeSegmentation;

/// Collapse runs of whitespace and trim both ends
pub fn normalize_query(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_graphemes` extended grapheme clusters
///
/// Never splits a multi-codepoint character.
pub fn truncate_graphemes(text: &str, max_graphemes: usize) -> &str {
    match text.grapheme_indices(true).nth(max_graphemes) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}

/// Normalize then truncate
pub fn prepare_input(text: &str, max_graphemes: usize) -> String {
    let normalized = normalize_query(text);
    truncate_graphemes(&normalized, max_graphemes).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize_query("  epinephrine \n dose\tfor  anaphylaxis "),
            "epinephrine dose for anaphylaxis"
        );
    }

    #[test]
    fn test_truncate_shorter_than_limit() {
        assert_eq!(truncate_graphemes("short", 10), "short");
    }

    #[test]
    fn test_truncate_exact() {
        assert_eq!(truncate_graphemes("abcdef", 3), "abc");
    }

    #[test]
    fn test_truncate_keeps_graphemes_whole() {
        // "é" written as e + combining acute accent is one grapheme
        let text = "e\u{301}e\u{301}e\u{301}";
        let cut = truncate_graphemes(text, 2);

        assert_eq!(cut, "e\u{301}e\u{301}");
    }

    #[test]
    fn test_prepare_input_is_stable() {
        let a = prepare_input("Epinephrine   dose", 100);
        let b = prepare_input(" Epinephrine dose ", 100);

        assert_eq!(a, b);
    }

    #[test]
    fn test_prepare_input_trims_after_cut() {
        assert_eq!(prepare_input("abc def", 4), "abc");
    }
}
