//! Value agreement rules

use fundwatch_domain::{FactValue, ValueKind};

/// Whether two claimed values describe the same fact
///
/// - money agrees within `money_tolerance` of the larger magnitude
/// - dates agree exactly, or as prefixes when precisions differ
/// - text agrees ignoring case and runs of whitespace
/// - enums, sets and entity references agree only when equal
///
/// Values of different kinds never agree.
pub fn values_agree(a: &FactValue, b: &FactValue, money_tolerance: f64) -> bool {
    match (a, b) {
        (FactValue::Money(x), FactValue::Money(y)) => money_agrees(*x, *y, money_tolerance),
        (FactValue::Date(x), FactValue::Date(y)) => x.is_consistent_with(y),
        (FactValue::Text(x), FactValue::Text(y)) => fold_text(x) == fold_text(y),
        (FactValue::Enum(x), FactValue::Enum(y)) => x == y,
        (FactValue::TextSet(x), FactValue::TextSet(y)) => x == y,
        (FactValue::Entity(x), FactValue::Entity(y)) => x == y,
        (FactValue::EntitySet(x), FactValue::EntitySet(y)) => x == y,
        _ => false,
    }
}

/// Whether every pair in `values` agrees
pub fn all_agree<'a>(values: impl IntoIterator<Item = &'a FactValue>, money_tolerance: f64) -> bool {
    let values: Vec<&FactValue> = values.into_iter().collect();
    values.iter().enumerate().all(|(i, a)| {
        values[i + 1..]
            .iter()
            .all(|b| values_agree(a, b, money_tolerance))
    })
}

/// Whether a value has the shape a field expects
pub fn fits_kind(kind: ValueKind, value: &FactValue) -> bool {
    matches!(
        (kind, value),
        (ValueKind::Money, FactValue::Money(_))
            | (ValueKind::Date, FactValue::Date(_))
            | (ValueKind::Enum, FactValue::Enum(_))
            | (ValueKind::Text, FactValue::Text(_))
            | (ValueKind::InvestorRef, FactValue::Entity(_) | FactValue::Text(_))
            | (ValueKind::InvestorSet, FactValue::EntitySet(_) | FactValue::TextSet(_))
            | (ValueKind::Identity, FactValue::Entity(_))
    )
}

fn money_agrees(a: i64, b: i64, tolerance: f64) -> bool {
    if a == b {
        return true;
    }
    let larger = a.unsigned_abs().max(b.unsigned_abs()) as f64;
    let diff = (i128::from(a) - i128::from(b)).unsigned_abs() as f64;
    diff <= tolerance * larger
}

fn fold_text(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundwatch_domain::{EntityId, PartialDate};

    #[test]
    fn test_money_within_tolerance() {
        assert!(values_agree(&FactValue::usd(10_000_000), &FactValue::usd(10_200_000), 0.02));
        assert!(!values_agree(&FactValue::usd(10_000_000), &FactValue::usd(12_000_000), 0.02));
        // Relative to the larger magnitude
        assert!(values_agree(&FactValue::usd(98), &FactValue::usd(100), 0.02));
        assert!(!values_agree(&FactValue::usd(97), &FactValue::usd(100), 0.02));
    }

    #[test]
    fn test_zero_tolerance_is_exact() {
        assert!(values_agree(&FactValue::Money(5), &FactValue::Money(5), 0.0));
        assert!(!values_agree(&FactValue::Money(5), &FactValue::Money(6), 0.0));
    }

    #[test]
    fn test_dates_by_precision() {
        let year = FactValue::Date(PartialDate::year(2021));
        let month = FactValue::Date(PartialDate::month(2021, 3));
        let day = FactValue::Date(PartialDate::day(2021, 3, 14));
        let other_day = FactValue::Date(PartialDate::day(2021, 3, 15));

        assert!(values_agree(&year, &day, 0.0));
        assert!(values_agree(&month, &day, 0.0));
        assert!(!values_agree(&day, &other_day, 0.0));
        assert!(!values_agree(&FactValue::Date(PartialDate::month(2021, 4)), &day, 0.0));
    }

    #[test]
    fn test_text_case_and_whitespace() {
        let a = FactValue::Text("Austin,  TX".into());
        let b = FactValue::Text("austin, tx".into());
        assert!(values_agree(&a, &b, 0.0));
        assert!(!values_agree(&a, &FactValue::Text("Dallas, TX".into()), 0.0));
    }

    #[test]
    fn test_sets_by_equality() {
        let a = FactValue::TextSet(["Acme".to_string(), "Beta".to_string()].into());
        let b = FactValue::TextSet(["Acme".to_string()].into());
        assert!(!values_agree(&a, &b, 0.0));
        assert!(values_agree(&a, &a.clone(), 0.0));
    }

    #[test]
    fn test_mismatched_kinds_disagree() {
        assert!(!values_agree(&FactValue::Money(1), &FactValue::Text("1".into()), 0.5));
        let id = EntityId::new();
        assert!(!values_agree(&FactValue::Entity(id), &FactValue::Entity(EntityId::new()), 0.0));
    }

    #[test]
    fn test_all_agree_is_pairwise() {
        // 100 agrees with 98 and 102, but 98 and 102 are further apart
        let values = [FactValue::Money(98), FactValue::Money(100), FactValue::Money(102)];
        assert!(!all_agree(values.iter(), 0.02));
        assert!(all_agree(values.iter(), 0.05));
        assert!(all_agree(std::iter::empty(), 0.0));
    }

    #[test]
    fn test_fits_kind() {
        assert!(fits_kind(ValueKind::Money, &FactValue::Money(1)));
        assert!(!fits_kind(ValueKind::Money, &FactValue::Text("1".into())));
        assert!(fits_kind(ValueKind::InvestorRef, &FactValue::Entity(EntityId::new())));
        assert!(!fits_kind(ValueKind::Identity, &FactValue::Text("Acme".into())));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: money agreement is symmetric
        #[test]
        fn test_money_agreement_symmetric(a in -1_000_000_000i64..1_000_000_000, b in -1_000_000_000i64..1_000_000_000) {
            let x = FactValue::Money(a);
            let y = FactValue::Money(b);
            prop_assert_eq!(values_agree(&x, &y, 0.02), values_agree(&y, &x, 0.02));
        }

        /// Property: a value always agrees with itself
        #[test]
        fn test_money_agreement_reflexive(a in any::<i64>()) {
            prop_assert!(values_agree(&FactValue::Money(a), &FactValue::Money(a), 0.0));
        }
    }
}
