//! Typed fact values

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Granularity of a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
    /// Only the year is known
    Year,
    /// Year and month are known
    Month,
    /// Full calendar date
    Day,
}

/// A calendar date that may be known only to year or month precision
///
/// Partial dates are never widened to a guessed day: "2021" stays a
/// year-precision value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartialDate {
    /// Calendar year
    pub year: i32,
    /// Month 1-12, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    /// Day of month, if known (implies month is known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

impl PartialDate {
    /// A year-precision date
    pub fn year(year: i32) -> Self {
        Self { year, month: None, day: None }
    }

    /// A month-precision date
    pub fn month(year: i32, month: u32) -> Self {
        Self { year, month: Some(month), day: None }
    }

    /// A day-precision date
    pub fn day(year: i32, month: u32, day: u32) -> Self {
        Self { year, month: Some(month), day: Some(day) }
    }

    /// Precision of this date
    pub fn precision(&self) -> DatePrecision {
        match (self.month, self.day) {
            (Some(_), Some(_)) => DatePrecision::Day,
            (Some(_), None) => DatePrecision::Month,
            _ => DatePrecision::Year,
        }
    }

    /// Whether two dates can describe the same day
    ///
    /// Equal precision requires equality. Otherwise the coarser date must
    /// agree with the finer one on every component it carries.
    pub fn is_consistent_with(&self, other: &PartialDate) -> bool {
        if self.precision() == other.precision() {
            return self == other;
        }
        if self.year != other.year {
            return false;
        }
        match (self.month, other.month) {
            (Some(a), Some(b)) if a != b => return false,
            _ => {}
        }
        match (self.day, other.day) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month, self.day) {
            (Some(m), Some(d)) => write!(f, "{:04}-{:02}-{:02}", self.year, m, d),
            (Some(m), None) => write!(f, "{:04}-{:02}", self.year, m),
            _ => write!(f, "{:04}", self.year),
        }
    }
}

/// The value carried by a claim or a committed fact
///
/// Investor references start life as `Text`/`TextSet` from the normalizer and
/// become `Entity`/`EntitySet` once the pipeline resolves the names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FactValue {
    /// Monetary amount in USD minor units (cents)
    Money(i64),
    /// Calendar date with explicit precision
    Date(PartialDate),
    /// Canonical lowercase token (round type, sector)
    Enum(String),
    /// Free text
    Text(String),
    /// Set of strings (unresolved investor names)
    TextSet(BTreeSet<String>),
    /// Reference to a resolved entity
    Entity(EntityId),
    /// Set of resolved entities
    EntitySet(BTreeSet<EntityId>),
}

impl FactValue {
    /// Money value from whole US dollars
    ///
    /// # Examples
    ///
    /// ```
    /// use fundwatch_domain::FactValue;
    ///
    /// assert_eq!(FactValue::usd(15_000_000), FactValue::Money(1_500_000_000));
    /// ```
    pub fn usd(dollars: i64) -> Self {
        FactValue::Money(dollars.saturating_mul(100))
    }

    /// Short tag naming the variant
    pub fn type_name(&self) -> &'static str {
        match self {
            FactValue::Money(_) => "money",
            FactValue::Date(_) => "date",
            FactValue::Enum(_) => "enum",
            FactValue::Text(_) => "text",
            FactValue::TextSet(_) => "text_set",
            FactValue::Entity(_) => "entity",
            FactValue::EntitySet(_) => "entity_set",
        }
    }

    /// Amount in minor units, if this is a money value
    pub fn as_money(&self) -> Option<i64> {
        match self {
            FactValue::Money(v) => Some(*v),
            _ => None,
        }
    }

    /// Referenced entities, if this value carries any
    pub fn entity_ids(&self) -> Vec<EntityId> {
        match self {
            FactValue::Entity(id) => vec![*id],
            FactValue::EntitySet(ids) => ids.iter().copied().collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Money(cents) => {
                let sign = if *cents < 0 { "-" } else { "" };
                let abs = cents.unsigned_abs();
                write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
            }
            FactValue::Date(d) => write!(f, "{}", d),
            FactValue::Enum(s) | FactValue::Text(s) => write!(f, "{}", s),
            FactValue::TextSet(items) => {
                let joined: Vec<&str> = items.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", joined.join(", "))
            }
            FactValue::Entity(id) => write!(f, "entity:{}", id),
            FactValue::EntitySet(ids) => {
                let joined: Vec<String> = ids.iter().map(|id| format!("entity:{}", id)).collect();
                write!(f, "{{{}}}", joined.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_precision() {
        assert_eq!(PartialDate::year(2021).precision(), DatePrecision::Year);
        assert_eq!(PartialDate::month(2021, 4).precision(), DatePrecision::Month);
        assert_eq!(PartialDate::day(2021, 4, 9).precision(), DatePrecision::Day);
    }

    #[test]
    fn test_coarser_date_consistent_with_finer() {
        let year = PartialDate::year(2021);
        let month = PartialDate::month(2021, 4);
        let day = PartialDate::day(2021, 4, 9);

        assert!(year.is_consistent_with(&day));
        assert!(day.is_consistent_with(&year));
        assert!(month.is_consistent_with(&day));
        assert!(!PartialDate::month(2021, 5).is_consistent_with(&day));
        assert!(!PartialDate::year(2020).is_consistent_with(&month));
    }

    #[test]
    fn test_same_precision_requires_equality() {
        assert!(!PartialDate::day(2021, 4, 9).is_consistent_with(&PartialDate::day(2021, 4, 10)));
        assert!(PartialDate::day(2021, 4, 9).is_consistent_with(&PartialDate::day(2021, 4, 9)));
    }

    #[test]
    fn test_money_display() {
        assert_eq!(FactValue::usd(10_000_000).to_string(), "$10000000.00");
        assert_eq!(FactValue::Money(-150).to_string(), "-$1.50");
    }

    #[test]
    fn test_value_json_shape() {
        let json = serde_json::to_string(&FactValue::Money(100)).unwrap();
        assert_eq!(json, r#"{"type":"money","value":100}"#);

        let parsed: FactValue = serde_json::from_str(r#"{"type":"enum","value":"series_a"}"#).unwrap();
        assert_eq!(parsed, FactValue::Enum("series_a".to_string()));
    }

    #[test]
    fn test_date_display() {
        assert_eq!(PartialDate::year(2021).to_string(), "2021");
        assert_eq!(PartialDate::day(2021, 4, 9).to_string(), "2021-04-09");
    }
}
