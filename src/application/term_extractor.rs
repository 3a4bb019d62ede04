use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Upper bound on the number of terms returned by [`extract_terms`].
pub const MAX_TERMS: usize = 25;

fn term_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[a-zA-Z]{4,}\b").expect("valid term pattern"))
}

fn demo_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b[A-Z][a-z]+\b|\b[a-z]{4,}\b").expect("valid demo term pattern")
    })
}

/// Candidate terms: whole words of four or more ASCII letters, deduplicated by exact
/// (case-sensitive) match, in order of first occurrence, at most [`MAX_TERMS`].
pub fn extract_terms(text: &str) -> Vec<String> {
    extract_terms_with_limit(text, MAX_TERMS)
}

pub fn extract_terms_with_limit(text: &str, limit: usize) -> Vec<String> {
    unique_in_order(term_pattern().find_iter(text).map(|m| m.as_str()), limit)
}

/// Terms for demo mode: capitalized words and lowercase words, longer than three letters.
pub fn extract_demo_terms(text: &str, limit: usize) -> Vec<String> {
    let words = demo_pattern()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|word| word.chars().count() > 3);
    unique_in_order(words, limit)
}

fn unique_in_order<'a>(words: impl Iterator<Item = &'a str>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for word in words {
        if terms.len() >= limit {
            break;
        }
        if seen.insert(word) {
            terms.push(word.to_string());
        }
    }
    terms
}
