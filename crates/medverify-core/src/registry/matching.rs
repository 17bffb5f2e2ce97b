//! Name normalization and similarity for registry lookup.

use strsim::{jaro_winkler, normalized_levenshtein};

/// Lowercase, trim and collapse internal whitespace.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Match rule for name lookup, on normalized inputs.
///
/// The query matches when it equals the canonical or generic name, or when
/// the query and canonical name contain one another.
pub fn names_match(query: &str, name: &str, generic_name: &str) -> bool {
    query == name || query == generic_name || name.contains(query) || query.contains(name)
}

/// Similarity (0.0 - 1.0) between two normalized names.
pub fn similarity(a: &str, b: &str) -> f64 {
    // Jaro-Winkler favours shared prefixes, which OCR misreads tend to keep
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);
    jw * 0.6 + lev * 0.4
}
