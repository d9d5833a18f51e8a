//! Batch input and report types

use crate::record::{RawRecord, SourceMetadata};
use fundwatch_domain::FactClaim;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw record together with where it came from
///
/// This is the element type of an ingest file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedRecord {
    /// Fetch metadata
    pub source: SourceMetadata,
    /// The record itself
    pub record: RawRecord,
}

/// Claims from one record plus what was dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecord {
    /// Canonical claims, one per recognized field key
    pub claims: Vec<FactClaim>,
    /// Source field names outside the vocabulary
    pub unknown_fields: Vec<String>,
    /// Recognized fields whose value could not be parsed
    pub unparseable_fields: Vec<String>,
}

/// A record that could not be normalized at all
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedRecord {
    /// Position in the batch
    pub index: usize,
    /// Source the record came from
    pub source_id: String,
    /// Why it was rejected
    pub reason: String,
}

/// Summary of a normalized batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizeReport {
    /// Records examined
    pub records_seen: usize,
    /// Claims produced
    pub claims_emitted: usize,
    /// Dropped unknown fields, counted per source field name
    pub unknown_fields: BTreeMap<String, usize>,
    /// Unparseable values, counted per source field name
    pub unparseable_values: BTreeMap<String, usize>,
    /// Records rejected as malformed
    pub malformed: Vec<MalformedRecord>,
}
