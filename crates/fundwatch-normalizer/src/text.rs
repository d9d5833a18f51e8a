//! Enum tokens, free text and investor lists

use serde_json::Value;
use std::collections::BTreeSet;

/// Canonicalize an enum label to a lowercase snake token
///
/// # Examples
///
/// ```
/// use fundwatch_normalizer::canonical_token;
///
/// assert_eq!(canonical_token("Series A"), Some("series_a".to_string()));
/// assert_eq!(canonical_token("  Pre-Seed "), Some("pre_seed".to_string()));
/// assert_eq!(canonical_token("--"), None);
/// ```
pub fn canonical_token(input: &str) -> Option<String> {
    let mut token = String::with_capacity(input.len());
    let mut pending_sep = false;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !token.is_empty() {
                token.push('_');
            }
            pending_sep = false;
            token.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    (!token.is_empty()).then_some(token)
}

/// Collapse whitespace and truncate to `max_chars` characters
pub fn clean_text(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    collapsed.chars().take(max_chars).collect::<String>().trim_end().to_string()
}

/// Split an investor list on commas, semicolons, `&` and the word "and"
///
/// Names are trimmed and de-duplicated; order is not preserved.
///
/// # Examples
///
/// ```
/// use fundwatch_normalizer::split_investors;
///
/// let names = split_investors("Acme Ventures, Beta Capital & Gamma Partners and Andreessen Horowitz");
/// assert_eq!(names.len(), 4);
/// assert!(names.contains("Andreessen Horowitz"));
/// ```
pub fn split_investors(input: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for piece in input.split([',', ';', '&']) {
        let mut current: Vec<&str> = Vec::new();
        for word in piece.split_whitespace() {
            if word.eq_ignore_ascii_case("and") {
                push_name(&mut names, &current);
                current.clear();
            } else {
                current.push(word);
            }
        }
        push_name(&mut names, &current);
    }
    names
}

/// Investor names from a JSON string or array of strings
pub fn investors_from_json(value: &Value) -> Option<BTreeSet<String>> {
    match value {
        Value::String(s) => Some(split_investors(s)),
        Value::Array(items) => {
            let mut names = BTreeSet::new();
            for item in items {
                names.extend(split_investors(item.as_str()?));
            }
            Some(names)
        }
        _ => None,
    }
}

fn push_name(names: &mut BTreeSet<String>, words: &[&str]) {
    let name = words.join(" ");
    let name = name.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if !name.is_empty() {
        names.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_token() {
        assert_eq!(canonical_token("Series A").as_deref(), Some("series_a"));
        assert_eq!(canonical_token("series-a").as_deref(), Some("series_a"));
        assert_eq!(canonical_token("SERIES_A").as_deref(), Some("series_a"));
        assert_eq!(canonical_token("Identity & Access").as_deref(), Some("identity_access"));
        assert_eq!(canonical_token("   "), None);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Austin,\n  TX ", 100), "Austin, TX");
        assert_eq!(clean_text("abcdef", 3), "abc");
    }

    #[test]
    fn test_split_keeps_words_containing_and() {
        let names = split_investors("Sandhill Partners and Brand Capital");
        let expected: BTreeSet<String> =
            ["Sandhill Partners", "Brand Capital"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_split_deduplicates() {
        let names = split_investors("Acme Ventures, Acme Ventures, and Beta Capital.");
        assert_eq!(names.len(), 2);
        assert!(names.contains("Beta Capital"));
    }

    #[test]
    fn test_investors_from_array() {
        let names = investors_from_json(&json!(["Acme Ventures", "Beta & Gamma"])).unwrap();
        assert_eq!(names.len(), 3);
        assert!(investors_from_json(&json!(["Acme", 5])).is_none());
        assert!(investors_from_json(&json!(12)).is_none());
    }
}
