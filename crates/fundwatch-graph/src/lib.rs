//! Fundwatch Co-Investment Graph
//!
//! Builds a weighted graph of investor-company and investor-investor
//! relationships from committed funding rounds.
//!
//! # Overview
//!
//! For every round, each participating investor (lead and participants) gets
//! an investor-company edge to the company, and every unordered pair of
//! investors gets an investor-investor edge. Both count one co-occurrence
//! and add the round amount.
//!
//! `strength = count / max count of the same edge kind in this build`, so
//! strengths compare only within one snapshot.
//!
//! # Architecture
//!
//! ```text
//! entities ─▶ rounds_from_entities ─▶ build ─▶ Graph { nodes, edges, metrics }
//! ```
//!
//! Building never touches the store. A snapshot is immutable once built;
//! entity merges show up in the next build only.
//!
//! # Usage
//!
//! ```
//! use fundwatch_graph::{build, names_of, rounds_from_entities};
//! use std::sync::atomic::AtomicBool;
//!
//! # fn main() -> Result<(), fundwatch_graph::GraphError> {
//! let entities = Vec::new();
//! let rounds = rounds_from_entities(&entities);
//! let graph = build(&rounds, &names_of(&entities), 1_700_000_000, &AtomicBool::new(false))?;
//! assert!(graph.edges.is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod graph;
mod round;

pub use error::GraphError;
pub use graph::{build, EdgeKind, Graph, GraphMetrics, Node, RelationshipEdge};
pub use round::{names_of, rounds_from_entities, FundingRound};
