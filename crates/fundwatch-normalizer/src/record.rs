//! Raw source records as they arrive from the adapters

use fundwatch_domain::{EntityKind, SourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Where and when a raw record was fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Stable source identifier (e.g. "api:crunchbase", "news:techwire")
    pub source_id: String,

    /// Fetch time, used when the record carries no event date
    pub fetched_at: u64,
}

impl SourceMetadata {
    /// Create source metadata
    pub fn new(source_id: impl Into<String>, fetched_at: u64) -> Self {
        Self { source_id: source_id.into(), fetched_at }
    }
}

/// A record from one of the three source families
///
/// Every named member is metadata; everything else in the payload is a
/// candidate fact, keyed by the source's own field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "lowercase")]
pub enum RawRecord {
    /// Facts extracted from a news article
    News(NewsArticle),
    /// Structured API payload
    Api(ApiPayload),
    /// Analyst-entered form
    Manual(ManualEntry),
}

/// Facts extracted from one news article
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Company the article is about
    #[serde(default)]
    pub company: Option<String>,

    /// Article headline
    #[serde(default)]
    pub headline: Option<String>,

    /// Article URL
    #[serde(default)]
    pub url: Option<String>,

    /// Publication date
    #[serde(default)]
    pub published_at: Option<String>,

    /// Funding round the article reports
    #[serde(default)]
    pub round: Option<String>,

    /// Extracted facts
    #[serde(flatten)]
    pub facts: BTreeMap<String, Value>,
}

/// One object from a structured data provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiPayload {
    /// Organization name
    #[serde(default)]
    pub name: Option<String>,

    /// Company (default) or investor profile
    #[serde(default)]
    pub entity_kind: Option<EntityKind>,

    /// Provider's record identifier
    #[serde(default)]
    pub record_id: Option<String>,

    /// Date the provider's data is valid for
    #[serde(default)]
    pub as_of: Option<String>,

    /// Funding round the payload describes
    #[serde(default)]
    pub round: Option<String>,

    /// Provider fields
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// A form filled in by an analyst
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManualEntry {
    /// Entity the entry is about
    #[serde(default)]
    pub entity: Option<String>,

    /// Company (default) or investor
    #[serde(default)]
    pub entity_kind: Option<EntityKind>,

    /// Analyst who entered the data
    #[serde(default)]
    pub analyst: Option<String>,

    /// Entry date
    #[serde(default)]
    pub entered_at: Option<String>,

    /// Funding round the entry describes
    #[serde(default)]
    pub round: Option<String>,

    /// Entered fields
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Uniform read-only view over the three record shapes
pub(crate) struct RecordView<'a> {
    pub source_kind: SourceKind,
    pub entity_kind: EntityKind,
    pub entity_name: Option<&'a str>,
    pub event_date: Option<&'a str>,
    pub round: Option<&'a str>,
    pub evidence: Option<String>,
    pub fields: &'a BTreeMap<String, Value>,
}

impl RawRecord {
    /// Source family of this record
    pub fn source_kind(&self) -> SourceKind {
        match self {
            RawRecord::News(_) => SourceKind::News,
            RawRecord::Api(_) => SourceKind::Api,
            RawRecord::Manual(_) => SourceKind::Manual,
        }
    }

    pub(crate) fn view(&self) -> RecordView<'_> {
        match self {
            RawRecord::News(a) => RecordView {
                source_kind: SourceKind::News,
                entity_kind: EntityKind::Company,
                entity_name: a.company.as_deref(),
                event_date: a.published_at.as_deref(),
                round: a.round.as_deref(),
                evidence: a.url.clone().or_else(|| a.headline.clone()),
                fields: &a.facts,
            },
            RawRecord::Api(p) => RecordView {
                source_kind: SourceKind::Api,
                entity_kind: p.entity_kind.unwrap_or(EntityKind::Company),
                entity_name: p.name.as_deref(),
                event_date: p.as_of.as_deref(),
                round: p.round.as_deref(),
                evidence: p.record_id.clone(),
                fields: &p.fields,
            },
            RawRecord::Manual(m) => RecordView {
                source_kind: SourceKind::Manual,
                entity_kind: m.entity_kind.unwrap_or(EntityKind::Company),
                entity_name: m.entity.as_deref(),
                event_date: m.entered_at.as_deref(),
                round: m.round.as_deref(),
                evidence: m.analyst.as_ref().map(|a| format!("analyst:{}", a)),
                fields: &m.fields,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_news_record() {
        let json = r#"{
            "source_type": "news",
            "company": "CyberSecure Inc.",
            "url": "https://news.example/cybersecure",
            "published_at": "2024-03-05",
            "amount": "$10M",
            "favorite_color": "blue"
        }"#;

        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.source_kind(), SourceKind::News);

        let view = record.view();
        assert_eq!(view.entity_name, Some("CyberSecure Inc."));
        assert_eq!(view.evidence.as_deref(), Some("https://news.example/cybersecure"));
        assert_eq!(view.fields.len(), 2);
        assert!(view.fields.contains_key("amount"));
    }

    #[test]
    fn test_api_record_investor_kind() {
        let json = r#"{"source_type": "api", "name": "Acme Ventures", "entity_kind": "investor", "hq": "Austin"}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.view().entity_kind, EntityKind::Investor);
    }

    #[test]
    fn test_unknown_source_type_rejected() {
        let json = r#"{"source_type": "rumor", "company": "Acme"}"#;
        assert!(serde_json::from_str::<RawRecord>(json).is_err());
    }
}
