//! Money parsing into USD minor units
//!
//! All arithmetic is integer-exact. Fractional amounts below one cent are
//! rounded half up.

use serde_json::Value;

/// Parse a money amount into cents
///
/// Accepts `"$15M"`, `"15,000,000"`, `"USD 15 million"`, `"$15.0m"`,
/// `"2.5bn"`, `"750k"` and plain JSON numbers (whole dollars).
///
/// # Examples
///
/// ```
/// use fundwatch_normalizer::parse_money;
///
/// assert_eq!(parse_money("$15M"), Some(1_500_000_000));
/// assert_eq!(parse_money("USD 15 million"), Some(1_500_000_000));
/// assert_eq!(parse_money("about ten"), None);
/// ```
pub fn parse_money(input: &str) -> Option<i64> {
    let mut s = input.trim().to_lowercase();
    for prefix in ["us$", "usd", "$"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start().to_string();
            break;
        }
    }
    if let Some(rest) = s.strip_suffix("usd") {
        s = rest.trim_end().to_string();
    }
    let s: String = s.chars().filter(|c| *c != ',').collect();

    let numeric_len = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(numeric_len);
    let multiplier = suffix_multiplier(suffix.trim())?;

    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.contains('.') || fraction.len() > 18 {
        return None;
    }

    let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let scale = 10i128.pow(fraction.len() as u32);
    let fraction: i128 = if fraction.is_empty() { 0 } else { fraction.parse().ok()? };

    // cents = (whole + fraction / scale) * multiplier * 100
    let numerator = (whole.checked_mul(scale)? + fraction)
        .checked_mul(multiplier)?
        .checked_mul(100)?;
    let cents = (numerator + scale / 2) / scale;

    i64::try_from(cents).ok()
}

/// Parse a JSON money value (number of dollars or string)
pub fn money_from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(dollars) = n.as_i64() {
                if dollars < 0 {
                    return None;
                }
                return dollars.checked_mul(100);
            }
            // Decimal literals go through the string parser to stay exact
            parse_money(&n.to_string())
        }
        Value::String(s) => parse_money(s),
        _ => None,
    }
}

fn suffix_multiplier(suffix: &str) -> Option<i128> {
    match suffix {
        "" => Some(1),
        "k" | "thousand" => Some(1_000),
        "m" | "mm" | "mn" | "million" | "millions" => Some(1_000_000),
        "b" | "bn" | "billion" | "billions" => Some(1_000_000_000),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIFTEEN_MILLION: i64 = 1_500_000_000;

    #[test]
    fn test_equivalent_spellings() {
        for input in ["$15M", "15,000,000", "USD 15 million", "$15.0m", "15mm", "15 MN", "15000000 USD"] {
            assert_eq!(parse_money(input), Some(FIFTEEN_MILLION), "input: {}", input);
        }
        assert_eq!(money_from_json(&json!(15_000_000)), Some(FIFTEEN_MILLION));
    }

    #[test]
    fn test_fractional_amounts() {
        assert_eq!(parse_money("$2.5bn"), Some(250_000_000_000));
        assert_eq!(parse_money("750k"), Some(75_000_000));
        assert_eq!(parse_money("$1,234.56"), Some(123_456));
        assert_eq!(parse_money(".5m"), Some(50_000_000));
        assert_eq!(money_from_json(&json!(10.25)), Some(1_025));
    }

    #[test]
    fn test_sub_cent_rounds_half_up() {
        assert_eq!(parse_money("0.005"), Some(1));
        assert_eq!(parse_money("0.004"), Some(0));
    }

    #[test]
    fn test_rejects_garbage() {
        for input in ["", "$", "ten million", "$10-15M", "1.2.3", "15 gazillion", "-5"] {
            assert_eq!(parse_money(input), None, "input: {}", input);
        }
        assert_eq!(money_from_json(&json!(-5)), None);
        assert_eq!(money_from_json(&json!(true)), None);
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert_eq!(parse_money("999999999999999999999b"), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: comma grouping never changes the amount
        #[test]
        fn test_grouping_is_ignored(dollars in 0i64..1_000_000_000_000) {
            let plain = dollars.to_string();
            let mut grouped = String::new();
            for (i, ch) in plain.chars().enumerate() {
                if i > 0 && (plain.len() - i) % 3 == 0 {
                    grouped.push(',');
                }
                grouped.push(ch);
            }
            prop_assert_eq!(parse_money(&plain), Some(dollars * 100));
            prop_assert_eq!(parse_money(&format!("${}", grouped)), Some(dollars * 100));
        }

        /// Property: "Nm" equals N million dollars
        #[test]
        fn test_million_suffix(n in 0i64..100_000) {
            prop_assert_eq!(parse_money(&format!("{}m", n)), Some(n * 1_000_000 * 100));
            prop_assert_eq!(parse_money(&format!("{} million", n)), Some(n * 1_000_000 * 100));
        }
    }
}
