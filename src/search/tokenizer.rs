//! Text normalization: tokenization, stopword removal, suffix stemming
//!
//! Both `tokenize` and `stem` are pure functions with no state beyond the
//! lazily compiled regex and the static stopword set. Normalization is
//! deliberately minimal: ASCII lowercasing only, no Unicode folding.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"\b[a-z0-9]+\b").expect("valid regex");
    static ref STOP_WORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with",
            "by", "from", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
            "do", "does", "did", "will", "would", "could", "should", "may", "might", "must",
            "shall", "can", "need", "this", "that", "these", "those", "i", "you", "he", "she",
            "it", "we", "they", "my", "your", "his", "her", "its", "our", "their", "me", "him",
            "us", "them", "what", "which", "who", "whom", "when", "where", "why", "how", "all",
            "each", "every", "both", "few", "more", "most", "other", "some", "such", "no", "not",
            "only", "same", "so", "than", "too", "very", "just", "also", "now", "here", "there",
            "then", "once", "if", "as",
        ];
        words.iter().copied().collect()
    };
}

/// Suffix rewrite rules, tried in order; the first rule whose suffix
/// matches and leaves a stem of at least 2 characters wins. Order is
/// significant because suffixes overlap ("ies" must precede "es" and
/// "s", "ational" must precede "ation").
static SUFFIX_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("isation", "ize"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("lessness", "less"),
    ("ness", ""),
    ("ment", ""),
    ("ings", ""),
    ("ing", ""),
    ("edly", "ed"),
    ("ied", "y"),
    ("ies", "y"),
    ("ed", ""),
    ("ly", ""),
    ("es", ""),
    ("s", ""),
];

/// Split text into lowercase alphanumeric terms
///
/// Lowercases the input and extracts maximal `[a-z0-9]+` runs bounded by
/// word boundaries; punctuation, symbols, and emoji act as separators and
/// produce no tokens. The boundary check is Unicode-aware, so a word
/// containing non-ASCII letters (e.g. "café") yields no token at all
/// rather than a clipped prefix. When `remove_stopwords` is set, common
/// function words are dropped after extraction.
pub fn tokenize(text: &str, remove_stopwords: bool) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !remove_stopwords || !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Reduce a word to an approximate root via the suffix rule table
///
/// Words of length 3 or less pass through unchanged. Otherwise the first
/// rule whose suffix matches and whose stripped stem keeps at least 2
/// characters is applied; if no rule qualifies the word is returned as is.
pub fn stem(word: &str) -> String {
    if word.len() <= 3 {
        return word.to_string();
    }
    for (suffix, replacement) in SUFFIX_RULES {
        if word.len() >= suffix.len() + 2 {
            if let Some(stripped) = word.strip_suffix(suffix) {
                return format!("{stripped}{replacement}");
            }
        }
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits_on_punctuation() {
        let tokens = tokenize("Hello, World! Rust-lang 2024", false);
        assert_eq!(tokens, vec!["hello", "world", "rust", "lang", "2024"]);
    }

    #[test]
    fn test_tokenize_symbols_only_yields_nothing() {
        assert!(tokenize("!!! ... ??? \u{1F600}", true).is_empty());
        assert!(tokenize("", true).is_empty());
    }

    #[test]
    fn test_tokenize_non_ascii_words_yield_no_tokens() {
        // "café" has no ASCII-bounded run: the accented letter extends the
        // Unicode word, so the boundary after "caf" never matches.
        assert!(tokenize("café", false).is_empty());
        assert_eq!(tokenize("café au lait", false), vec!["au", "lait"]);
    }

    #[test]
    fn test_tokenize_stopword_removal() {
        let kept = tokenize("book a flight to paris", true);
        assert_eq!(kept, vec!["book", "flight", "paris"]);

        let all = tokenize("book a flight to paris", false);
        assert_eq!(all, vec!["book", "a", "flight", "to", "paris"]);
    }

    #[test]
    fn test_tokenize_stopwords_only_yields_nothing() {
        assert!(tokenize("the and of to", true).is_empty());
    }

    #[test]
    fn test_stem_short_words_unchanged() {
        assert_eq!(stem("cat"), "cat");
        assert_eq!(stem("go"), "go");
        assert_eq!(stem("a"), "a");
    }

    #[test]
    fn test_stem_suffix_rules() {
        assert_eq!(stem("running"), "runn");
        assert_eq!(stem("reservation"), "reservate");
        assert_eq!(stem("cats"), "cat");
        assert_eq!(stem("walked"), "walk");
        assert_eq!(stem("flights"), "flight");
    }

    #[test]
    fn test_stem_rule_order_ies_before_s() {
        // "ies" -> "y" must win over the later bare "es"/"s" rules.
        assert_eq!(stem("cities"), "city");
        assert_eq!(stem("tried"), "try");
    }

    #[test]
    fn test_stem_minimum_stem_length_guard() {
        // "ness" matches the "ness" rule but stripping would leave nothing,
        // so scanning continues until the bare "s" rule qualifies.
        assert_eq!(stem("ness"), "nes");
        assert_eq!(stem("fullness"), "full");
    }

    #[test]
    fn test_stem_no_matching_rule_is_identity() {
        assert_eq!(stem("opera"), "opera");
        assert_eq!(stem("hotel"), "hotel");
        assert_eq!(stem("flight"), "flight");
    }

    #[test]
    fn test_stem_bare_s_rule() {
        assert_eq!(stem("paris"), "pari");
        assert_eq!(stem("tickets"), "ticket");
    }

    #[test]
    fn test_stem_is_deterministic() {
        for word in ["running", "cities", "reservation", "ness"] {
            assert_eq!(stem(word), stem(word));
        }
    }
}
