//! Fundwatch Pipeline
//!
//! Runs raw source records through normalization, entity resolution and
//! reconciliation against one shared store, and fronts the verification
//! queue and the graph builder.
//!
//! # Architecture
//!
//! ```text
//! SourcedRecord* ─▶ Normalizer (spawn_blocking fan-out)
//!                ─▶ EntityResolver (pipeline-wide section)
//!                ─▶ append claim + Reconciler (per-entity lock)
//!                ─▶ commit | conflict task | low-confidence task
//! ```
//!
//! Investor names inside `lead_investor` and `participants` values are
//! resolved to investor entities before the claim is stored, so the graph
//! builder sees entity references. A name that matches several entities
//! equally well gets a provisional entity and a low-confidence task on its
//! identity field.
//!
//! # Concurrency
//!
//! - Store access goes through `Arc<Mutex<S>>`; each store call is atomic
//! - Task transitions are compare-and-set in the store
//! - Detection and commit for one entity never interleave ([`EntityLocks`])
//! - Graph builds copy a snapshot and run without the store lock
//!
//! # Usage
//!
//! ```no_run
//! use fundwatch_pipeline::{Pipeline, PipelineConfig};
//! use fundwatch_store::SqliteStore;
//! use std::sync::{Arc, Mutex};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(Mutex::new(SqliteStore::new("fundwatch.db")?));
//! let pipeline = Pipeline::new(store, PipelineConfig::default())?;
//!
//! let batch = serde_json::from_str(&std::fs::read_to_string("batch.json")?)?;
//! let report = pipeline.ingest(batch, 1_700_000_000).await?;
//! println!("{} committed, {} tasks", report.committed, report.tasks_created.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod locks;
mod pipeline;
mod report;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use locks::EntityLocks;
pub use pipeline::Pipeline;
pub use report::IngestReport;
