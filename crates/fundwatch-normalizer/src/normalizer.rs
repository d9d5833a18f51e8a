//! Core normalizer implementation

use crate::config::NormalizerConfig;
use crate::date::{date_from_json, parse_date, to_timestamp};
use crate::error::NormalizeError;
use crate::money::money_from_json;
use crate::record::{RawRecord, SourceMetadata};
use crate::text::{canonical_token, clean_text, investors_from_json};
use crate::types::{MalformedRecord, NormalizeReport, NormalizedRecord, SourcedRecord};
use fundwatch_domain::{FactClaim, FactValue, Field, FieldKey, ValueKind};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Outcome of parsing one raw value
enum Parsed {
    Value(FactValue),
    Missing,
    Invalid,
}

/// Converts raw source records into canonical claims
///
/// The normalizer is pure: it performs no I/O and holds no mutable state, so
/// one instance can serve many threads.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Create a normalizer, validating the configuration
    pub fn new(config: NormalizerConfig) -> Result<Self, NormalizeError> {
        config.validate().map_err(NormalizeError::Config)?;
        Ok(Self { config })
    }

    /// Normalizer with default configuration
    pub fn with_defaults() -> Self {
        Self { config: NormalizerConfig::default() }
    }

    /// Active configuration
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize one record
    ///
    /// `now` becomes the `ingested_at` of every emitted claim.
    ///
    /// # Errors
    ///
    /// `NormalizeError::Malformed` when the record has no entity name or no
    /// field from the vocabulary.
    pub fn normalize(
        &self,
        record: &RawRecord,
        source: &SourceMetadata,
        now: u64,
    ) -> Result<NormalizedRecord, NormalizeError> {
        let view = record.view();

        let name = view
            .entity_name
            .map(|n| clean_text(n, self.config.max_text_length))
            .filter(|n| !n.is_empty())
            .ok_or_else(|| NormalizeError::Malformed("record has no entity name".to_string()))?;

        let observed_at = view
            .event_date
            .and_then(parse_date)
            .and_then(|d| to_timestamp(&d))
            .unwrap_or(source.fetched_at);

        let round = view.round.and_then(canonical_token).or_else(|| {
            view.fields
                .iter()
                .find(|(k, _)| Field::parse(k) == Some(Field::RoundType))
                .and_then(|(_, v)| v.as_str())
                .and_then(canonical_token)
        });

        let mut result = NormalizedRecord::default();
        let mut recognized = 0usize;
        let mut seen: BTreeSet<FieldKey> = BTreeSet::new();

        for (raw_name, raw_value) in view.fields {
            let Some(field) = Field::parse(raw_name) else {
                debug!(field = %raw_name, "Dropping unknown field");
                result.unknown_fields.push(raw_name.clone());
                continue;
            };
            recognized += 1;

            let key = if field.is_round_scoped() {
                match &round {
                    Some(r) => FieldKey::in_round(field, r.clone()),
                    None => {
                        debug!(field = %raw_name, "Round-scoped field without a round label");
                        result.unparseable_fields.push(raw_name.clone());
                        continue;
                    }
                }
            } else {
                FieldKey::new(field)
            };

            if seen.contains(&key) {
                debug!(field = %raw_name, key = %key, "Ignoring repeated field");
                continue;
            }

            match self.parse_value(field, raw_value) {
                Parsed::Value(value) => {
                    seen.insert(key.clone());
                    let mut claim = FactClaim::new(
                        view.entity_kind,
                        name.clone(),
                        key,
                        value,
                        source.source_id.clone(),
                        view.source_kind,
                        observed_at,
                        now,
                    );
                    claim.evidence = view.evidence.clone();
                    result.claims.push(claim);
                }
                Parsed::Missing => {}
                Parsed::Invalid => {
                    debug!(field = %raw_name, value = %raw_value, "Unparseable value");
                    result.unparseable_fields.push(raw_name.clone());
                }
            }
        }

        if recognized == 0 {
            return Err(NormalizeError::Malformed(format!(
                "record for '{}' carries no factual field",
                name
            )));
        }

        debug!(
            entity = %name,
            source = %source.source_id,
            claims = result.claims.len(),
            "Record normalized"
        );
        Ok(result)
    }

    /// Normalize a batch, collecting claims and a report
    ///
    /// Malformed records are reported and skipped; they never abort the batch.
    pub fn normalize_batch(
        &self,
        batch: &[SourcedRecord],
        now: u64,
    ) -> (Vec<FactClaim>, NormalizeReport) {
        let mut claims = Vec::new();
        let mut report = NormalizeReport::default();

        for (index, item) in batch.iter().enumerate() {
            let outcome = self.normalize(&item.record, &item.source, now);
            claims.extend(report.record(index, &item.source, outcome));
        }

        info!(
            records = report.records_seen,
            claims = report.claims_emitted,
            malformed = report.malformed.len(),
            "Batch normalized"
        );
        (claims, report)
    }

    fn parse_value(&self, field: Field, raw: &Value) -> Parsed {
        if raw.is_null() {
            return Parsed::Missing;
        }
        if let Value::String(s) = raw {
            if s.trim().is_empty() {
                return if self.config.empty_as_missing || field.value_kind() != ValueKind::Text {
                    Parsed::Missing
                } else {
                    Parsed::Value(FactValue::Text(String::new()))
                };
            }
        }

        let value = match field.value_kind() {
            ValueKind::Money => money_from_json(raw).map(FactValue::Money),
            ValueKind::Date => date_from_json(raw).map(FactValue::Date),
            ValueKind::Enum => raw.as_str().and_then(canonical_token).map(FactValue::Enum),
            ValueKind::Text => raw
                .as_str()
                .map(|s| FactValue::Text(clean_text(s, self.config.max_text_length))),
            ValueKind::InvestorRef => investors_from_json(raw).and_then(|names| {
                // A lead is a single investor
                let mut names = names.into_iter();
                match (names.next(), names.next()) {
                    (Some(only), None) => Some(FactValue::Text(only)),
                    _ => None,
                }
            }),
            ValueKind::InvestorSet => match investors_from_json(raw) {
                Some(names) if names.is_empty() => return Parsed::Missing,
                Some(names) => Some(FactValue::TextSet(names)),
                None => None,
            },
            ValueKind::Identity => None,
        };

        match value {
            Some(v) => Parsed::Value(v),
            None => Parsed::Invalid,
        }
    }
}

impl NormalizeReport {
    /// Fold one record outcome into the report, returning its claims
    pub fn record(
        &mut self,
        index: usize,
        source: &SourceMetadata,
        outcome: Result<NormalizedRecord, NormalizeError>,
    ) -> Vec<FactClaim> {
        self.records_seen += 1;
        match outcome {
            Ok(normalized) => {
                for name in normalized.unknown_fields {
                    *self.unknown_fields.entry(name).or_default() += 1;
                }
                for name in normalized.unparseable_fields {
                    *self.unparseable_values.entry(name).or_default() += 1;
                }
                self.claims_emitted += normalized.claims.len();
                normalized.claims
            }
            Err(e) => {
                warn!(index, source = %source.source_id, error = %e, "Skipping malformed record");
                self.malformed.push(MalformedRecord {
                    index,
                    source_id: source.source_id.clone(),
                    reason: e.to_string(),
                });
                Vec::new()
            }
        }
    }
}
