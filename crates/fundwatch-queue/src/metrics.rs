//! Backlog health metrics

use fundwatch_domain::{Priority, TaskStatus, VerificationTask};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of the open review backlog
///
/// Backlog size and age are the health signal of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueMetrics {
    /// Tasks waiting for a reviewer
    pub pending: usize,

    /// Tasks held by a reviewer
    pub in_review: usize,

    /// Open tasks past their deadline
    pub overdue: usize,

    /// Open tasks per priority
    pub by_priority: BTreeMap<Priority, usize>,

    /// Age of the oldest open task in seconds
    pub oldest_open_age_secs: Option<u64>,

    /// When the snapshot was taken
    pub measured_at: u64,
}

impl QueueMetrics {
    /// Compute metrics over a set of tasks; terminal tasks are ignored
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a VerificationTask>, now: u64) -> Self {
        let mut metrics = Self {
            measured_at: now,
            ..Default::default()
        };

        for task in tasks.into_iter().filter(|t| t.is_open()) {
            match task.status {
                TaskStatus::Pending => metrics.pending += 1,
                TaskStatus::InReview => metrics.in_review += 1,
                _ => {}
            }
            if task.is_overdue(now) {
                metrics.overdue += 1;
            }
            *metrics.by_priority.entry(task.priority).or_insert(0) += 1;

            let age = now.saturating_sub(task.created_at);
            metrics.oldest_open_age_secs = Some(metrics.oldest_open_age_secs.map_or(age, |a| a.max(age)));
        }

        metrics
    }

    /// Total open tasks
    pub fn open(&self) -> usize {
        self.pending + self.in_review
    }

    /// Open tasks of one priority
    pub fn count(&self, priority: Priority) -> usize {
        self.by_priority.get(&priority).copied().unwrap_or(0)
    }

    /// Get a summary string of the backlog
    pub fn summary(&self) -> String {
        format!(
            "Verification Backlog:\n\
             - Open: {} ({} pending, {} in review)\n\
             - Overdue: {}\n\
             - By priority: {} high, {} medium, {} low\n\
             - Oldest open: {}",
            self.open(),
            self.pending,
            self.in_review,
            self.overdue,
            self.count(Priority::High),
            self.count(Priority::Medium),
            self.count(Priority::Low),
            self.oldest_open_age_secs
                .map(|s| format!("{}h", s / 3600))
                .unwrap_or_else(|| "-".to_string()),
        )
    }
}
