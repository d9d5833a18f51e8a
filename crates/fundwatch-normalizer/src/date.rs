//! Date parsing into partial dates
//!
//! Precision is taken from the input and never guessed: `"2021"` stays a
//! year-precision date.

use chrono::{DateTime, Datelike, Month, NaiveDate};
use fundwatch_domain::PartialDate;
use serde_json::Value;

/// Parse a date in one of the accepted shapes
///
/// `YYYY-MM-DD`, `YYYY-MM`, `YYYY`, RFC 3339 timestamps, `Month D, YYYY`
/// (full or abbreviated month) and `Mon YYYY`.
///
/// # Examples
///
/// ```
/// use fundwatch_domain::PartialDate;
/// use fundwatch_normalizer::parse_date;
///
/// assert_eq!(parse_date("2021"), Some(PartialDate::year(2021)));
/// assert_eq!(parse_date("March 5, 2024"), Some(PartialDate::day(2024, 3, 5)));
/// assert_eq!(parse_date("Q3 2021"), None);
/// ```
pub fn parse_date(input: &str) -> Option<PartialDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        let d = ts.date_naive();
        return Some(PartialDate::day(d.year(), d.month(), d.day()));
    }

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(PartialDate::day(d.year(), d.month(), d.day()));
    }

    if let Some((year, month)) = s.split_once('-') {
        if is_year(year) && month.len() == 2 && month.chars().all(|c| c.is_ascii_digit()) {
            let month: u32 = month.parse().ok()?;
            if !(1..=12).contains(&month) {
                return None;
            }
            return Some(PartialDate::month(year.parse().ok()?, month));
        }
        return None;
    }

    if is_year(s) {
        return Some(PartialDate::year(s.parse().ok()?));
    }

    // Written forms must end in a four-digit year; chrono would read "2024" in
    // "Mar 2024" as day 20 of year 24 otherwise
    let ends_with_year = s
        .rsplit(|c: char| c.is_whitespace() || c == ',')
        .next()
        .is_some_and(is_year);
    if !ends_with_year {
        return None;
    }

    for format in ["%B %d, %Y", "%d %B %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(PartialDate::day(d.year(), d.month(), d.day()));
        }
    }

    // "Mar 2024" / "March 2024"
    let mut parts = s.split_whitespace();
    if let (Some(month), Some(year), None) = (parts.next(), parts.next(), parts.next()) {
        let month: Month = month.trim_end_matches(['.', ',']).parse().ok()?;
        return Some(PartialDate::month(year.parse().ok()?, month.number_from_month()));
    }

    None
}

/// Parse a JSON date value (string, or a bare year number)
pub fn date_from_json(value: &Value) -> Option<PartialDate> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => {
            let year = n.as_i64()?;
            (1800..=9999)
                .contains(&year)
                .then(|| PartialDate::year(year as i32))
        }
        _ => None,
    }
}

/// Unix timestamp of the first instant the date can denote (UTC)
pub fn to_timestamp(date: &PartialDate) -> Option<u64> {
    let day = NaiveDate::from_ymd_opt(date.year, date.month.unwrap_or(1), date.day.unwrap_or(1))?;
    let ts = day.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
    u64::try_from(ts).ok()
}

fn is_year(s: &str) -> bool {
    s.len() == 4 && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_iso_shapes() {
        assert_eq!(parse_date("2024-03-05"), Some(PartialDate::day(2024, 3, 5)));
        assert_eq!(parse_date("2024-03"), Some(PartialDate::month(2024, 3)));
        assert_eq!(parse_date(" 2024 "), Some(PartialDate::year(2024)));
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            parse_date("2024-03-05T14:30:00Z"),
            Some(PartialDate::day(2024, 3, 5))
        );
        assert_eq!(
            parse_date("2024-03-05T23:30:00-02:00"),
            Some(PartialDate::day(2024, 3, 5))
        );
    }

    #[test]
    fn test_written_shapes() {
        assert_eq!(parse_date("March 5, 2024"), Some(PartialDate::day(2024, 3, 5)));
        assert_eq!(parse_date("Mar 5, 2024"), Some(PartialDate::day(2024, 3, 5)));
        assert_eq!(parse_date("Mar 2024"), Some(PartialDate::month(2024, 3)));
        assert_eq!(parse_date("September 2021"), Some(PartialDate::month(2021, 9)));
    }

    #[test]
    fn test_invalid_dates() {
        for input in ["", "2024-13", "2024-02-30", "Q3 2021", "yesterday", "24", "Smarch 2024"] {
            assert_eq!(parse_date(input), None, "input: {}", input);
        }
    }

    #[test]
    fn test_json_year_number() {
        assert_eq!(date_from_json(&json!(2019)), Some(PartialDate::year(2019)));
        assert_eq!(date_from_json(&json!(19)), None);
    }

    #[test]
    fn test_timestamp_of_partial_dates() {
        assert_eq!(to_timestamp(&PartialDate::day(1970, 1, 2)), Some(86_400));
        assert_eq!(to_timestamp(&PartialDate::year(1970)), Some(0));
        assert_eq!(to_timestamp(&PartialDate::year(1960)), None);
    }
}
