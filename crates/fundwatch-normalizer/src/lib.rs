//! Fundwatch Normalizer
//!
//! Converts heterogeneous source records into canonical `FactClaim`s.
//!
//! # Overview
//!
//! Sources come in three families: news extraction, structured API payloads
//! and analyst-entered forms. Each family has its own record shape and its
//! own spelling of field names and values. The normalizer maps every record
//! onto the controlled field vocabulary and typed values, so that everything
//! downstream compares like with like.
//!
//! # Architecture
//!
//! ```text
//! RawRecord + SourceMetadata → Normalizer → FactClaim* + NormalizeReport
//! ```
//!
//! # Key Features
//!
//! - **Money**: `"$15M"`, `"USD 15 million"`, `15000000` all become 1,500,000,000 cents
//! - **Dates**: partial dates keep their precision; `"2021"` is never widened to a day
//! - **Enums**: `"Series A"` becomes `series_a`
//! - **Investor lists**: split on commas, `&` and "and"
//! - **Accounting**: unknown fields and unparseable values are dropped and counted
//!
//! # Example Usage
//!
//! ```
//! use fundwatch_normalizer::{Normalizer, RawRecord, SourceMetadata};
//!
//! let record: RawRecord = serde_json::from_str(r#"{
//!     "source_type": "api",
//!     "name": "CyberSecure Inc.",
//!     "total_funding": "$15M"
//! }"#).unwrap();
//!
//! let normalizer = Normalizer::with_defaults();
//! let result = normalizer
//!     .normalize(&record, &SourceMetadata::new("api:provider", 1_700_000_000), 1_700_000_100)
//!     .unwrap();
//!
//! assert_eq!(result.claims.len(), 1);
//! ```

#![warn(missing_docs)]

mod config;
mod date;
mod error;
mod money;
mod normalizer;
mod record;
mod text;
mod types;

#[cfg(test)]
mod tests;

pub use config::NormalizerConfig;
pub use date::{date_from_json, parse_date, to_timestamp};
pub use error::NormalizeError;
pub use money::{money_from_json, parse_money};
pub use normalizer::Normalizer;
pub use record::{ApiPayload, ManualEntry, NewsArticle, RawRecord, SourceMetadata};
pub use text::{canonical_token, clean_text, investors_from_json, split_investors};
pub use types::{MalformedRecord, NormalizeReport, NormalizedRecord, SourcedRecord};
