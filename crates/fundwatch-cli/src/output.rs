//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use fundwatch_domain::{Entity, Priority, ProvenanceKind, TaskStatus, VerificationTask};
use fundwatch_graph::Graph;
use fundwatch_pipeline::{IngestReport, PipelineError};
use fundwatch_queue::{QueueMetrics, ReviewOutcome};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a list of tasks.
    pub fn format_tasks(&self, tasks: &[VerificationTask], now: u64) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(tasks)?),
            OutputFormat::Table => Ok(self.format_tasks_table(tasks, now)),
            OutputFormat::Quiet => Ok(tasks
                .iter()
                .map(|t| t.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format a single task.
    pub fn format_task(&self, task: &VerificationTask, now: u64) -> Result<String> {
        self.format_tasks(std::slice::from_ref(task), now)
    }

    fn format_tasks_table(&self, tasks: &[VerificationTask], now: u64) -> String {
        if tasks.is_empty() {
            return self.colorize("No tasks found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Kind", "Priority", "Status", "Entity", "Field", "Due", "Assignee"]);

        for task in tasks {
            let id = task.id.to_string();
            let entity = task.entity_id.to_string();
            builder.push_record([
                id,
                task.kind.to_string(),
                self.priority(task.priority),
                task.status.to_string(),
                entity[..8].to_string(), // Truncate ID for readability
                task.key.to_string(),
                self.due(task, now),
                task.assignee.clone().unwrap_or_default(),
            ]);
        }

        self.render(builder)
    }

    /// Format the accounting of one ingestion run.
    pub fn format_ingest(&self, report: &IngestReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(report
                .tasks_created
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let n = &report.normalize;
                let rows: [(&str, usize); 14] = [
                    ("Records seen", n.records_seen),
                    ("Malformed records", n.malformed.len()),
                    ("Unknown fields dropped", n.unknown_fields.values().sum()),
                    ("Unparseable values dropped", n.unparseable_values.values().sum()),
                    ("Claims stored", report.claims_stored),
                    ("Claims skipped", report.claims_skipped),
                    ("Claims not reconciled", report.unreconciled),
                    ("Entities created", report.entities_created),
                    ("Entities matched", report.entities_matched),
                    ("Ambiguous names", report.ambiguous_names),
                    ("Values committed", report.committed),
                    ("Conflicts opened", report.conflicts_opened),
                    ("Conflicts updated", report.conflicts_updated),
                    ("Tasks created", report.tasks_created.len()),
                ];

                let mut builder = Builder::default();
                builder.push_record(["Step", "Count"]);
                for (label, count) in rows {
                    builder.push_record([label.to_string(), count.to_string()]);
                }
                let mut out = self.render(builder);

                for bad in &n.malformed {
                    out.push('\n');
                    out.push_str(&self.warning(&format!(
                        "record {} from {}: {}",
                        bad.index, bad.source_id, bad.reason
                    )));
                }
                if report.needs_review() {
                    out.push('\n');
                    out.push_str(&self.info("Some values need review: run `fundwatch tasks list`"));
                }
                Ok(out)
            }
        }
    }

    /// Format an entity with its current facts.
    pub fn format_entity(&self, entity: &Entity) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(entity)?),
            OutputFormat::Quiet => Ok(entity.id.to_string()),
            OutputFormat::Table => {
                let aliases: Vec<&str> = entity.aliases.iter().map(String::as_str).collect();
                let mut out = format!(
                    "{} ({}, {})\nAliases: {}\n",
                    self.colorize(&entity.display_name, "cyan"),
                    entity.kind,
                    entity.id,
                    aliases.join(", ")
                );

                if entity.current_facts.is_empty() {
                    out.push_str(&self.colorize("No committed facts.", "yellow"));
                    return Ok(out);
                }

                let mut builder = Builder::default();
                builder.push_record(["Field", "Value", "Revision", "Source", "Claims"]);
                for (key, fact) in &entity.current_facts {
                    let source = match fact.provenance.kind {
                        ProvenanceKind::AutoAccepted => "auto".to_string(),
                        ProvenanceKind::Reviewed => match &fact.provenance.reviewer {
                            Some(reviewer) => format!("reviewed by {}", reviewer),
                            None => "reviewed".to_string(),
                        },
                    };
                    builder.push_record([
                        key.to_string(),
                        fact.value.to_string(),
                        fact.revision.to_string(),
                        source,
                        fact.provenance.claim_ids.len().to_string(),
                    ]);
                }
                out.push_str(&self.render(builder));
                Ok(out)
            }
        }
    }

    /// Format the result of resolving a task.
    pub fn format_review(&self, outcome: &ReviewOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "task": outcome.task,
                    "committed": outcome.committed,
                    "closed_conflict": outcome.closed_conflict.map(|id| id.to_string()),
                    "merged": outcome.merged.map(|(from, into)| serde_json::json!({
                        "from": from.to_string(),
                        "into": into.to_string(),
                    })),
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(outcome.task.id.to_string()),
            OutputFormat::Table => {
                let mut lines = vec![self.success(&format!(
                    "Task {} {}",
                    outcome.task.id, outcome.task.status
                ))];
                if let Some(record) = &outcome.committed {
                    lines.push(format!(
                        "  {} = {} (revision {})",
                        record.key, record.value, record.revision
                    ));
                }
                if let Some((from, into)) = outcome.merged {
                    lines.push(format!("  merged {} into {}", from, into));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a graph build: the full JSON or a summary.
    pub fn format_graph(&self, graph: &Graph) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(graph.to_json().map_err(PipelineError::from)?),
            OutputFormat::Quiet => Ok(format!("{} {}", graph.nodes.len(), graph.edges.len())),
            OutputFormat::Table => {
                let m = &graph.metrics;
                let mut builder = Builder::default();
                builder.push_record(["Metric", "Value"]);
                builder.push_record(["Investors".to_string(), m.investors.to_string()]);
                builder.push_record(["Companies".to_string(), m.companies.to_string()]);
                builder.push_record([
                    "Investor-company edges".to_string(),
                    m.investor_company_edges.to_string(),
                ]);
                builder.push_record([
                    "Investor-investor edges".to_string(),
                    m.investor_investor_edges.to_string(),
                ]);
                builder.push_record(["Investor density".to_string(), format!("{:.4}", m.investor_density)]);
                builder.push_record([
                    "Investor-company density".to_string(),
                    format!("{:.4}", m.investor_company_density),
                ]);
                Ok(self.render(builder))
            }
        }
    }

    /// Format a backlog snapshot.
    pub fn format_backlog(&self, metrics: &QueueMetrics) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(metrics)?),
            OutputFormat::Quiet => Ok(metrics.open().to_string()),
            OutputFormat::Table => {
                let mut out = metrics.summary();
                if metrics.overdue > 0 {
                    out.push('\n');
                    out.push_str(&self.warning(&format!("{} task(s) past their deadline", metrics.overdue)));
                }
                Ok(out)
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn priority(&self, priority: Priority) -> String {
        match priority {
            Priority::High => self.colorize(priority.as_str(), "red"),
            Priority::Medium => self.colorize(priority.as_str(), "yellow"),
            Priority::Low => priority.as_str().to_string(),
        }
    }

    fn due(&self, task: &VerificationTask, now: u64) -> String {
        let open = matches!(task.status, TaskStatus::Pending | TaskStatus::InReview);
        if open && task.due_at < now {
            self.colorize(&format!("overdue {}h", (now - task.due_at) / 3600), "red")
        } else if open {
            format!("in {}h", (task.due_at - now) / 3600)
        } else {
            "-".to_string()
        }
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundwatch_domain::{ConflictId, EntityId, EntityKind, Field, FieldKey, TaskKind, TaskSubject};

    fn create_test_task() -> VerificationTask {
        VerificationTask::new(
            TaskKind::Conflict,
            TaskSubject::Conflict {
                conflict_id: ConflictId::new(),
            },
            EntityId::new(),
            FieldKey::new(Field::TotalFunding),
            Priority::High,
            1_000,
            1_000 + 24 * 3600,
        )
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_tasks(&[create_test_task()], 2_000).unwrap();
        assert!(output.contains("total_funding"));
        assert!(output.contains("pending"));
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let task = create_test_task();
        let output = formatter.format_task(&task, 2_000).unwrap();
        assert_eq!(output, task.id.to_string());
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_tasks(&[create_test_task()], 2_000).unwrap();
        assert!(output.contains("Priority"));
        assert!(output.contains("high"));
        assert!(output.contains("in 23h"));
    }

    #[test]
    fn test_overdue_marked() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let task = create_test_task();
        let output = formatter.format_task(&task, task.due_at + 7_200).unwrap();
        assert!(output.contains("overdue 2h"));
    }

    #[test]
    fn test_empty_tasks() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_tasks(&[], 0).unwrap();
        assert!(output.contains("No tasks found"));
    }

    #[test]
    fn test_entity_without_facts() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let entity = Entity::new(EntityKind::Company, "Acme Labs", "acme labs", 0);
        let output = formatter.format_entity(&entity).unwrap();
        assert!(output.contains("Acme Labs"));
        assert!(output.contains("No committed facts"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}
