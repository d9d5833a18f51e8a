//! Verification tasks and their lifecycle state machine
//!
//! ```text
//! pending ──claim──▶ in_review ──resolve──▶ verified | rejected
//!    │                  │
//!    │◀────release──────┘
//!    └──────resolve (fast path)──────────▶ verified | rejected
//! ```
//!
//! `verified` and `rejected` are terminal. A disagreement that reappears
//! after a task closed gets a new task.

use crate::clock::HOUR_SECS;
use crate::{ClaimId, ConflictId, EntityId, FactValue, FieldKey};
use serde::{Deserialize, Serialize};
use std::fmt;

uuid_id! {
    /// Identifier for a verification task
    TaskId
}

/// What a task asks the reviewer to decide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Pick the authoritative value among disagreeing claims
    Conflict,
    /// Confirm or reject a single weak claim, or an ambiguous name on the
    /// identity field
    LowConfidence,
}

impl TaskKind {
    /// Get the kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Conflict => "conflict",
            TaskKind::LowConfidence => "low_confidence",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "conflict" => Some(TaskKind::Conflict),
            "low_confidence" => Some(TaskKind::LowConfidence),
            _ => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Financially material (funding amounts, valuation, round type)
    High,
    /// Standard facts
    Medium,
    /// Cosmetic facts (description, website)
    Low,
}

impl Priority {
    /// Get the priority as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Parse a priority from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Numeric rank for ordering in storage (high first)
    pub fn rank(&self) -> i64 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review deadline per priority, in hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaPolicy {
    /// Window for high-priority tasks
    pub high_hours: u64,
    /// Window for medium-priority tasks
    pub medium_hours: u64,
    /// Window for low-priority tasks
    pub low_hours: u64,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            high_hours: 24,
            medium_hours: 72,
            low_hours: 7 * 24,
        }
    }
}

impl SlaPolicy {
    /// Review window for a priority in seconds
    pub fn window_secs(&self, priority: Priority) -> u64 {
        let hours = match priority {
            Priority::High => self.high_hours,
            Priority::Medium => self.medium_hours,
            Priority::Low => self.low_hours,
        };
        hours.saturating_mul(HOUR_SECS)
    }

    /// Deadline of a task created at `created_at`
    pub fn due_at(&self, priority: Priority, created_at: u64) -> u64 {
        created_at.saturating_add(self.window_secs(priority))
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.high_hours == 0 || self.medium_hours == 0 || self.low_hours == 0 {
            return Err("SLA windows must be greater than 0 hours".to_string());
        }
        if self.high_hours > self.medium_hours || self.medium_hours > self.low_hours {
            return Err("SLA windows must not shrink as priority drops".to_string());
        }
        Ok(())
    }
}

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for a reviewer
    Pending,
    /// Claimed by a reviewer
    InReview,
    /// Accepted with a value (terminal)
    Verified,
    /// Closed without accepting a value (terminal)
    Rejected,
}

impl TaskStatus {
    /// Get the status as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InReview => "in_review",
            TaskStatus::Verified => "verified",
            TaskStatus::Rejected => "rejected",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_review" => Some(TaskStatus::InReview),
            "verified" => Some(TaskStatus::Verified),
            "rejected" => Some(TaskStatus::Rejected),
            _ => None,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Verified | TaskStatus::Rejected)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, InReview)
                | (Pending, Verified)
                | (Pending, Rejected)
                | (InReview, Verified)
                | (InReview, Rejected)
                | (InReview, Pending)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The thing under review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskSubject {
    /// A conflict between live claims
    Conflict {
        /// The conflict
        conflict_id: ConflictId,
    },
    /// A single low-confidence claim
    Claim {
        /// The claim
        claim_id: ClaimId,
    },
    /// A name that fuzzy-matched several entities equally well
    Identity {
        /// Raw name as seen
        name: String,
        /// Entity created provisionally for the name
        provisional: EntityId,
        /// Existing entities it might be
        candidates: Vec<EntityId>,
    },
}

/// A unit of human review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationTask {
    /// Identifier
    pub id: TaskId,
    /// What the task asks
    pub kind: TaskKind,
    /// Subject reference
    pub subject: TaskSubject,
    /// Entity the task concerns
    pub entity_id: EntityId,
    /// Field the task concerns
    pub key: FieldKey,
    /// Urgency
    pub priority: Priority,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Creation time
    pub created_at: u64,
    /// SLA deadline
    pub due_at: u64,
    /// Reviewer holding the task
    pub assignee: Option<String>,
    /// Reviewer notes given on resolution
    pub resolution_notes: Option<String>,
    /// Value accepted on verification
    pub chosen_value: Option<FactValue>,
    /// When the task reached a terminal state
    pub resolved_at: Option<u64>,
}

impl VerificationTask {
    /// Create a pending task
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: TaskKind,
        subject: TaskSubject,
        entity_id: EntityId,
        key: FieldKey,
        priority: Priority,
        created_at: u64,
        due_at: u64,
    ) -> Self {
        Self {
            id: TaskId::new(),
            kind,
            subject,
            entity_id,
            key,
            priority,
            status: TaskStatus::Pending,
            created_at,
            due_at,
            assignee: None,
            resolution_notes: None,
            chosen_value: None,
            resolved_at: None,
        }
    }

    /// Whether the task still needs attention
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Whether an open task has passed its deadline
    pub fn is_overdue(&self, now: u64) -> bool {
        self.is_open() && now > self.due_at
    }
}

/// Change applied to the assignee by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeChange {
    /// Leave as is
    Keep,
    /// Set a reviewer
    Set(String),
    /// Remove the reviewer
    Clear,
}

/// A compare-and-set transition request
///
/// The store applies it only if the task's current status is one of
/// `expected`, in a single atomic step.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTransition {
    /// Statuses the task must currently be in
    pub expected: Vec<TaskStatus>,
    /// Target status
    pub to: TaskStatus,
    /// Assignee update
    pub assignee: AssigneeChange,
    /// Notes to record
    pub resolution_notes: Option<String>,
    /// Accepted value to record
    pub chosen_value: Option<FactValue>,
    /// Terminal timestamp to record
    pub resolved_at: Option<u64>,
}

/// Query criteria for listing tasks
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Filter by status
    pub status: Option<TaskStatus>,
    /// Only pending or in-review tasks
    pub open_only: bool,
    /// Filter by priority
    pub priority: Option<Priority>,
    /// Filter by kind
    pub kind: Option<TaskKind>,
    /// Filter by entity
    pub entity_id: Option<EntityId>,
    /// Only tasks due strictly before this time
    pub due_before: Option<u64>,
    /// Maximum results to return
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sla_due_at() {
        let sla = SlaPolicy::default();
        assert_eq!(sla.due_at(Priority::High, 1000), 1000 + 24 * 3600);
        assert_eq!(sla.due_at(Priority::Medium, 0), 72 * 3600);
        assert_eq!(sla.due_at(Priority::Low, 0), 7 * 86_400);
        assert!(sla.validate().is_ok());
        assert!(SlaPolicy { high_hours: 100, ..Default::default() }.validate().is_err());
    }

    #[test]
    fn test_allowed_transitions() {
        use TaskStatus::*;
        assert!(Pending.can_transition_to(InReview));
        assert!(Pending.can_transition_to(Verified));
        assert!(InReview.can_transition_to(Pending));
        assert!(InReview.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_states_are_final() {
        use TaskStatus::*;
        for terminal in [Verified, Rejected] {
            assert!(terminal.is_terminal());
            for next in [Pending, InReview, Verified, Rejected] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_overdue() {
        let mut task = VerificationTask::new(
            TaskKind::Conflict,
            TaskSubject::Conflict { conflict_id: ConflictId::new() },
            EntityId::new(),
            FieldKey::new(crate::Field::TotalFunding),
            Priority::High,
            100,
            200,
        );
        assert!(!task.is_overdue(200));
        assert!(task.is_overdue(201));

        task.status = TaskStatus::Verified;
        assert!(!task.is_overdue(1_000));
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [TaskStatus::Pending, TaskStatus::InReview, TaskStatus::Verified, TaskStatus::Rejected] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_kind_parse() {
        for kind in [TaskKind::Conflict, TaskKind::LowConfidence] {
            assert_eq!(TaskKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TaskKind::parse("identity"), None);
    }
}
