//! Name normalization and similarity scoring

use std::collections::BTreeSet;

/// Legal-form suffixes removed from the end of a name
pub const LEGAL_SUFFIXES: [&str; 15] = [
    "inc",
    "incorporated",
    "llc",
    "ltd",
    "limited",
    "corp",
    "corporation",
    "co",
    "company",
    "gmbh",
    "plc",
    "sa",
    "ag",
    "lp",
    "llp",
];

/// Normalize a raw name into a matching key
///
/// Lowercases, drops periods and apostrophes, turns other punctuation into
/// spaces, removes trailing legal suffixes and collapses whitespace. A name
/// made only of a suffix keeps it.
///
/// # Examples
///
/// ```
/// use fundwatch_resolver::normalize_key;
///
/// assert_eq!(normalize_key("Acme Inc."), "acme");
/// assert_eq!(normalize_key("ACME, Inc"), "acme");
/// assert_eq!(normalize_key("  Beta   Capital LLC "), "beta capital");
/// ```
pub fn normalize_key(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            '.' | '\'' | '\u{2019}' => {}
            c if c.is_alphanumeric() => cleaned.extend(c.to_lowercase()),
            _ => cleaned.push(' '),
        }
    }

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    while tokens.len() > 1 && tokens.last().is_some_and(|t| LEGAL_SUFFIXES.contains(t)) {
        tokens.pop();
    }
    tokens.join(" ")
}

/// Jaccard overlap of the whitespace tokens of two keys
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    let a: BTreeSet<&str> = a.split_whitespace().collect();
    let b: BTreeSet<&str> = b.split_whitespace().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Similarity of two normalized keys in [0, 1]
///
/// The larger of normalized Levenshtein similarity and token Jaccard overlap.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b).max(token_jaccard(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes_stripped_repeatedly() {
        assert_eq!(normalize_key("Acme Holdings Co. Ltd"), "acme holdings");
        assert_eq!(normalize_key("Siemens AG"), "siemens");
    }

    #[test]
    fn test_suffix_only_name_kept() {
        assert_eq!(normalize_key("Company"), "company");
        assert_eq!(normalize_key("Inc."), "inc");
    }

    #[test]
    fn test_inner_suffix_words_kept() {
        assert_eq!(normalize_key("Co Ventures"), "co ventures");
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(normalize_key("O'Reilly & Sons"), "oreilly sons");
        assert_eq!(normalize_key("Cyber-Secure"), "cyber secure");
        assert_eq!(normalize_key("!!!"), "");
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("acme labs", "acme labs"), 1.0);
        assert!(similarity("acme lab", "acme labs") > 0.85);
        assert!(similarity("acme", "zenith") < 0.5);
        assert_eq!(token_jaccard("beta capital", "capital beta"), 1.0);
        assert_eq!(token_jaccard("", ""), 0.0);
    }
}
