//! CLI command definitions and argument parsing.

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

/// Fundwatch - reconcile startup funding data and review what disagrees.
#[derive(Debug, Parser)]
#[command(name = "fundwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FUNDWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file (overrides the configured one)
    #[arg(long, global = true, env = "FUNDWATCH_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a JSON batch of source records
    Ingest(IngestArgs),

    /// Work the verification queue
    Tasks(TasksArgs),

    /// Inspect entities
    Entity(EntityArgs),

    /// Co-investment graph
    Graph(GraphArgs),

    /// Report backlog health
    Backlog(BacklogArgs),
}

/// Arguments for the ingest command.
#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// JSON file holding an array of `{source, record}` objects
    pub file: Option<PathBuf>,

    /// Read the batch from stdin
    #[arg(long, conflicts_with = "file")]
    pub stdin: bool,
}

/// Arguments for task management.
#[derive(Debug, Parser)]
pub struct TasksArgs {
    #[command(subcommand)]
    pub action: TaskAction,
}

/// Task actions.
#[derive(Debug, Subcommand)]
pub enum TaskAction {
    /// List tasks, highest priority first
    List(ListArgs),

    /// Take a pending task for review
    Claim {
        /// Task ID
        id: String,
        /// Reviewer taking the task
        #[arg(short, long, env = "FUNDWATCH_REVIEWER")]
        assignee: String,
    },

    /// Close a task as verified or rejected
    Resolve(ResolveArgs),

    /// Hand a claimed task back
    Release {
        /// Task ID
        id: String,
    },
}

/// Arguments for listing tasks.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Filter by status (open tasks when omitted)
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Filter by priority
    #[arg(short, long, value_enum)]
    pub priority: Option<PriorityArg>,

    /// Filter by kind
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,

    /// Only open tasks past their deadline
    #[arg(long, conflicts_with = "status")]
    pub overdue: bool,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for resolving a task.
#[derive(Debug, Parser)]
#[command(group(ArgGroup::new("verdict").required(true).args(["verified", "rejected"])))]
pub struct ResolveArgs {
    /// Task ID
    pub id: String,

    /// Accept a value
    #[arg(long)]
    pub verified: bool,

    /// Close without accepting a value
    #[arg(long)]
    pub rejected: bool,

    /// Value to accept: "$12M", an entity ID, or a JSON fact value
    #[arg(long, requires = "verified")]
    pub value: Option<String>,

    /// Reviewer notes (required to reject)
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Reviewer name, when different from the assignee
    #[arg(long, env = "FUNDWATCH_REVIEWER")]
    pub reviewer: Option<String>,
}

/// Arguments for entity inspection.
#[derive(Debug, Parser)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub action: EntityAction,
}

/// Entity actions.
#[derive(Debug, Subcommand)]
pub enum EntityAction {
    /// Show an entity and its current facts
    Show {
        /// Name or alias
        name: String,
        /// Entity kind
        #[arg(short, long, value_enum, default_value = "company")]
        kind: EntityKindArg,
    },
}

/// Arguments for graph commands.
#[derive(Debug, Parser)]
pub struct GraphArgs {
    #[command(subcommand)]
    pub action: GraphAction,
}

/// Graph actions.
#[derive(Debug, Subcommand)]
pub enum GraphAction {
    /// Build a snapshot from the committed facts
    Build {
        /// Write the graph JSON to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Arguments for the backlog command.
#[derive(Debug, Parser)]
pub struct BacklogArgs {
    /// Keep reporting on the configured interval until Ctrl+C
    #[arg(short, long)]
    pub watch: bool,
}

/// Task status argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StatusArg {
    /// Waiting for a reviewer
    Pending,
    /// Claimed by a reviewer
    InReview,
    /// Accepted
    Verified,
    /// Closed without a value
    Rejected,
}

/// Priority argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PriorityArg {
    /// Financially material
    High,
    /// Standard facts
    Medium,
    /// Cosmetic facts
    Low,
}

/// Task kind argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    /// Disagreeing claims
    Conflict,
    /// A single weak claim or an ambiguous name
    LowConfidence,
}

/// Entity kind argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum EntityKindArg {
    /// A startup
    Company,
    /// A fund or angel
    Investor,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<StatusArg> for fundwatch_domain::TaskStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => fundwatch_domain::TaskStatus::Pending,
            StatusArg::InReview => fundwatch_domain::TaskStatus::InReview,
            StatusArg::Verified => fundwatch_domain::TaskStatus::Verified,
            StatusArg::Rejected => fundwatch_domain::TaskStatus::Rejected,
        }
    }
}

impl From<PriorityArg> for fundwatch_domain::Priority {
    fn from(priority: PriorityArg) -> Self {
        match priority {
            PriorityArg::High => fundwatch_domain::Priority::High,
            PriorityArg::Medium => fundwatch_domain::Priority::Medium,
            PriorityArg::Low => fundwatch_domain::Priority::Low,
        }
    }
}

impl From<KindArg> for fundwatch_domain::TaskKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Conflict => fundwatch_domain::TaskKind::Conflict,
            KindArg::LowConfidence => fundwatch_domain::TaskKind::LowConfidence,
        }
    }
}

impl From<EntityKindArg> for fundwatch_domain::EntityKind {
    fn from(kind: EntityKindArg) -> Self {
        match kind {
            EntityKindArg::Company => fundwatch_domain::EntityKind::Company,
            EntityKindArg::Investor => fundwatch_domain::EntityKind::Investor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_command() {
        let cli = Cli::parse_from(["fundwatch", "ingest", "batch.json"]);
        match cli.command {
            Command::Ingest(args) => assert_eq!(args.file, Some(PathBuf::from("batch.json"))),
            _ => panic!("Expected Ingest command"),
        }
    }

    #[test]
    fn test_tasks_list_filters() {
        let cli = Cli::parse_from([
            "fundwatch", "tasks", "list", "--status", "in-review", "--priority", "high",
        ]);
        let Command::Tasks(TasksArgs { action: TaskAction::List(args) }) = cli.command else {
            panic!("Expected tasks list");
        };
        assert!(matches!(args.status, Some(StatusArg::InReview)));
        assert!(matches!(args.priority, Some(PriorityArg::High)));
        assert!(!args.overdue);
    }

    #[test]
    fn test_resolve_requires_a_verdict() {
        assert!(Cli::try_parse_from(["fundwatch", "tasks", "resolve", "abc"]).is_err());
        assert!(Cli::try_parse_from([
            "fundwatch", "tasks", "resolve", "abc", "--verified", "--rejected",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "fundwatch", "tasks", "resolve", "abc", "--rejected", "--value", "$1M",
        ])
        .is_err());

        let cli = Cli::parse_from([
            "fundwatch", "tasks", "resolve", "abc", "--verified", "--value", "$10M", "--notes", "SEC filing",
        ]);
        let Command::Tasks(TasksArgs { action: TaskAction::Resolve(args) }) = cli.command else {
            panic!("Expected tasks resolve");
        };
        assert!(args.verified);
        assert_eq!(args.value.as_deref(), Some("$10M"));
        assert_eq!(args.notes.as_deref(), Some("SEC filing"));
    }

    #[test]
    fn test_enum_conversion() {
        let status: fundwatch_domain::TaskStatus = StatusArg::InReview.into();
        assert_eq!(status, fundwatch_domain::TaskStatus::InReview);
        let kind: fundwatch_domain::EntityKind = EntityKindArg::Investor.into();
        assert_eq!(kind, fundwatch_domain::EntityKind::Investor);
    }
}
