//! Fundwatch Reconciler
//!
//! Decides, for one (entity, field key) at a time, whether the live claims
//! can be committed automatically or need a reviewer.
//!
//! # Overview
//!
//! Every source keeps at most one live claim per key: its most recent one.
//! The reconciler scores the live claims against each other and applies a
//! fixed policy:
//!
//! | Live claims | Outcome |
//! |-------------|---------|
//! | two or more, all agreeing | commit the highest-confidence value |
//! | one, confidence >= threshold | commit it |
//! | one, confidence < threshold | open a low-confidence task |
//! | disagreeing | open a conflict and a conflict task |
//!
//! A value committed by a reviewer anchors agreement: a later claim that
//! disagrees with it opens a conflict even when it is the only live claim.
//! An open conflict absorbs new claims until a reviewer closes it.
//!
//! # Architecture
//!
//! ```text
//! claims_for ─▶ live_claims ─▶ score_claims ─▶ Reconciler policy ─▶ commit | task
//! ```
//!
//! [`commit`] is the only path by which current facts change. The queue uses
//! it for reviewed values too.
//!
//! # Example Usage
//!
//! ```no_run
//! use fundwatch_domain::{EntityId, Field, FieldKey, FundingStore};
//! use fundwatch_reconciler::{Decision, Reconciler};
//! # fn demo<S: FundingStore>(store: &mut S, entity: EntityId) where S::Error: std::fmt::Display {
//! let reconciler = Reconciler::with_defaults();
//! let key = FieldKey::new(Field::TotalFunding);
//! match reconciler.reconcile(store, entity, &key, 1_700_000_000).unwrap() {
//!     Decision::Committed { record, .. } => println!("now {}", record.value),
//!     other => println!("{:?}", other),
//! }
//! # }
//! ```

#![warn(missing_docs)]

mod comparator;
mod committer;
mod config;
mod error;
mod reconciler;
mod scoring;

pub use comparator::{all_agree, fits_kind, values_agree};
pub use committer::commit;
pub use config::ReconcileConfig;
pub use error::ReconcileError;
pub use reconciler::{Decision, Reconciler};
pub use scoring::{live_claims, pick_winner, score_claims, ClaimScore};
