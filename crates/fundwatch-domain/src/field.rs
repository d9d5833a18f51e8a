//! Controlled field vocabulary

use crate::Priority;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of value a field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Monetary amount
    Money,
    /// Calendar date
    Date,
    /// Canonical token
    Enum,
    /// Free text
    Text,
    /// A single investor (name before resolution, entity after)
    InvestorRef,
    /// A set of investors
    InvestorSet,
    /// An entity identity (synthetic identity field only)
    Identity,
}

/// A field of the controlled vocabulary
///
/// Unknown source fields never map onto one of these; the normalizer drops
/// and counts them instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Cumulative funding raised
    TotalFunding,
    /// Latest known valuation
    Valuation,
    /// Current funding stage (seed, series_a, ...)
    RoundType,
    /// Amount raised in one round
    RoundAmount,
    /// Announcement date of one round
    RoundDate,
    /// Lead investor of one round
    LeadInvestor,
    /// Participating investors of one round
    Participants,
    /// Headquarters location
    Headquarters,
    /// Founding date
    FoundedDate,
    /// Market sector
    Sector,
    /// Company website
    Website,
    /// Marketing description
    Description,
    /// Synthetic field for identity-ambiguity review
    Identity,
}

impl Field {
    /// Every field a source record may carry (excludes the synthetic identity field)
    pub const VOCABULARY: [Field; 12] = [
        Field::TotalFunding,
        Field::Valuation,
        Field::RoundType,
        Field::RoundAmount,
        Field::RoundDate,
        Field::LeadInvestor,
        Field::Participants,
        Field::Headquarters,
        Field::FoundedDate,
        Field::Sector,
        Field::Website,
        Field::Description,
    ];

    /// Get the field name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::TotalFunding => "total_funding",
            Field::Valuation => "valuation",
            Field::RoundType => "round_type",
            Field::RoundAmount => "round_amount",
            Field::RoundDate => "round_date",
            Field::LeadInvestor => "lead_investor",
            Field::Participants => "participants",
            Field::Headquarters => "headquarters",
            Field::FoundedDate => "founded_date",
            Field::Sector => "sector",
            Field::Website => "website",
            Field::Description => "description",
            Field::Identity => "identity",
        }
    }

    /// Parse a source field name into the vocabulary
    ///
    /// Accepts snake_case, camelCase, kebab-case and a handful of common
    /// synonyms. Returns `None` for anything outside the vocabulary,
    /// including the synthetic `identity` field.
    ///
    /// # Examples
    ///
    /// ```
    /// use fundwatch_domain::Field;
    ///
    /// assert_eq!(Field::parse("totalFunding"), Some(Field::TotalFunding));
    /// assert_eq!(Field::parse("HQ"), Some(Field::Headquarters));
    /// assert_eq!(Field::parse("favorite_color"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let mut normalized = String::with_capacity(s.len() + 4);
        let mut prev_lower = false;
        for ch in s.trim().chars() {
            // camelCase boundary
            if ch.is_ascii_uppercase() && prev_lower {
                normalized.push('_');
            }
            match ch {
                '-' | ' ' | '.' => normalized.push('_'),
                c => normalized.push(c.to_ascii_lowercase()),
            }
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }

        match normalized.as_str() {
            "total_funding" | "funding_total" | "total_raised" | "funding" => Some(Field::TotalFunding),
            "valuation" | "post_money_valuation" => Some(Field::Valuation),
            "round_type" | "stage" | "funding_stage" => Some(Field::RoundType),
            "round_amount" | "amount" | "amount_raised" => Some(Field::RoundAmount),
            "round_date" | "announced_date" | "announced_on" => Some(Field::RoundDate),
            "lead_investor" | "lead" => Some(Field::LeadInvestor),
            "participants" | "investors" | "participating_investors" => Some(Field::Participants),
            "headquarters" | "hq" | "location" => Some(Field::Headquarters),
            "founded_date" | "founded" | "founded_on" | "founded_year" => Some(Field::FoundedDate),
            "sector" | "category" => Some(Field::Sector),
            "website" | "url" | "homepage" => Some(Field::Website),
            "description" | "summary" => Some(Field::Description),
            _ => None,
        }
    }

    /// The kind of value this field carries
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Field::TotalFunding | Field::Valuation | Field::RoundAmount => ValueKind::Money,
            Field::RoundDate | Field::FoundedDate => ValueKind::Date,
            Field::RoundType | Field::Sector => ValueKind::Enum,
            Field::Headquarters | Field::Website | Field::Description => ValueKind::Text,
            Field::LeadInvestor => ValueKind::InvestorRef,
            Field::Participants => ValueKind::InvestorSet,
            Field::Identity => ValueKind::Identity,
        }
    }

    /// Whether facts for this field are scoped to a funding round
    pub fn is_round_scoped(&self) -> bool {
        matches!(
            self,
            Field::RoundAmount | Field::RoundDate | Field::LeadInvestor | Field::Participants
        )
    }

    /// Review priority for disagreements on this field
    ///
    /// Financially material fields are high, cosmetic text is low.
    pub fn review_priority(&self) -> Priority {
        match self {
            Field::TotalFunding | Field::Valuation | Field::RoundType | Field::RoundAmount => {
                Priority::High
            }
            Field::Website | Field::Description => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "identity" {
            return Ok(Field::Identity);
        }
        Self::parse(s).ok_or_else(|| format!("Unknown field: {}", s))
    }
}

/// The unit of reconciliation: a field, optionally scoped to a funding round
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    /// The field
    pub field: Field,
    /// Round label (e.g. `series_a`) for round-scoped fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
}

impl FieldKey {
    /// Key for a company-level field
    pub fn new(field: Field) -> Self {
        Self { field, round: None }
    }

    /// Key for a round-scoped field
    pub fn in_round(field: Field, round: impl Into<String>) -> Self {
        Self { field, round: Some(round.into()) }
    }

    /// Round label as stored (empty for company-level fields)
    pub fn round_label(&self) -> &str {
        self.round.as_deref().unwrap_or("")
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.round {
            Some(round) => write!(f, "{}[{}]", self.field, round),
            None => write!(f, "{}", self.field),
        }
    }
}
