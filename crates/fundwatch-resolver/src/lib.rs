//! Fundwatch Entity Resolver
//!
//! Maps raw company and investor names onto stable entity identifiers.
//!
//! # Overview
//!
//! The same company shows up as "Acme Inc.", "ACME, Inc" and "Acme" across
//! sources. The resolver normalizes each name into a matching key and looks
//! it up in a fixed order:
//!
//! 1. exact match on the normalized key
//! 2. the alias table of raw spellings seen before
//! 3. fuzzy match on key similarity, accepted only with a clear winner
//!
//! When nothing scores above the similarity floor a new entity is created.
//! When two or more candidates score within the ambiguity margin of each
//! other, a provisional entity is created and the caller is told to open an
//! identity review.
//!
//! # Example Usage
//!
//! ```no_run
//! use fundwatch_domain::EntityKind;
//! use fundwatch_resolver::{EntityResolver, ResolverConfig};
//! # fn demo<S: fundwatch_domain::EntityStore>(store: &mut S) where S::Error: std::fmt::Display {
//! let resolver = EntityResolver::new(ResolverConfig::default()).unwrap();
//! let resolution = resolver
//!     .resolve(store, "Acme Inc.", EntityKind::Company, 1_700_000_000)
//!     .unwrap();
//! println!("Acme is {}", resolution.entity_id());
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod key;
mod resolver;

pub use config::ResolverConfig;
pub use error::ResolverError;
pub use key::{normalize_key, similarity, token_jaccard, LEGAL_SUFFIXES};
pub use resolver::{Candidate, EntityResolver, MatchKind, Resolution};
