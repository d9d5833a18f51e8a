//! Fundwatch Verification Queue
//!
//! Human review of conflicts, low-confidence claims and ambiguous identities.
//!
//! # Overview
//!
//! The reconciler opens tasks; reviewers claim and close them here. Every
//! task follows the same state machine:
//!
//! ```text
//! pending ──claim──▶ in_review ──resolve──▶ verified | rejected
//!    │◀────release──────┘
//!    └──────────resolve──────────────────▶ verified | rejected
//! ```
//!
//! Transitions are compare-and-set in the store. Terminal states are final;
//! a disagreement that comes back later gets a new task.
//!
//! ## Deadlines
//!
//! | Priority | Default SLA | Fields |
//! |----------|-------------|--------|
//! | high | 24 hours | total funding, valuation, round type, round amount |
//! | medium | 72 hours | dates, investors, headquarters, sector |
//! | low | 7 days | website, description |
//!
//! `due_at = created_at + sla(priority)`. Time alone never changes a task;
//! [`VerificationQueue::overdue`] and [`BacklogWorker`] only report.
//!
//! # Usage
//!
//! ```no_run
//! use fundwatch_queue::{ReviewRequest, VerificationQueue};
//! use fundwatch_domain::{FactValue, TaskId};
//! use fundwatch_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SqliteStore::new("fundwatch.db")?;
//! let queue = VerificationQueue::default_config();
//! # let task_id = TaskId::new();
//!
//! queue.claim(&mut store, task_id, "ana")?;
//! let outcome = queue.resolve(
//!     &mut store,
//!     task_id,
//!     ReviewRequest::verify(Some(FactValue::usd(10_000_000))).with_notes("confirmed via SEC filing"),
//!     1_700_000_000,
//! )?;
//! println!("{:?}", outcome.committed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod queue;
mod worker;

pub use config::QueueConfig;
pub use error::QueueError;
pub use metrics::QueueMetrics;
pub use queue::{ReviewOutcome, ReviewRequest, Verdict, VerificationQueue};
pub use worker::BacklogWorker;
