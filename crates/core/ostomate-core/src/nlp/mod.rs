//! Text normalization and fuzzy matching helpers

pub mod similarity;

pub use similarity::{edit_distance, similarity};

/// Case-fold and trim a string
pub fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Lowercase alphanumeric tokens of a string (apostrophes kept inside words)
pub fn tokens(s: &str) -> Vec<String> {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Whether every token of `needle` appears among the tokens of `haystack`
pub fn contains_all_tokens(haystack: &str, needle: &str) -> bool {
    let hay = tokens(haystack);
    let needle = tokens(needle);
    !needle.is_empty() && needle.iter().all(|t| hay.contains(t))
}
