//! Task command implementations.

use crate::cli::{ListArgs, ResolveArgs, TaskAction, TasksArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use fundwatch_domain::clock::current_timestamp;
use fundwatch_domain::{EntityId, FactValue, Priority, TaskFilter, TaskId, TaskKind};
use fundwatch_normalizer::{canonical_token, parse_money};
use fundwatch_pipeline::Pipeline;
use fundwatch_queue::ReviewRequest;
use fundwatch_store::SqliteStore;

/// Execute a task subcommand.
pub async fn execute_tasks(
    args: TasksArgs,
    pipeline: &Pipeline<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let now = current_timestamp();
    match args.action {
        TaskAction::List(list) => {
            let tasks = list_tasks(list, pipeline, now)?;
            println!("{}", formatter.format_tasks(&tasks, now)?);
        }
        TaskAction::Claim { id, assignee } => {
            let task = pipeline.claim_task(parse_task_id(&id)?, &assignee)?;
            println!("{}", formatter.success(&format!("Task {} claimed by {}", task.id, assignee)));
        }
        TaskAction::Release { id } => {
            let task = pipeline.release_task(parse_task_id(&id)?)?;
            println!("{}", formatter.success(&format!("Task {} released", task.id)));
        }
        TaskAction::Resolve(resolve) => {
            let task_id = parse_task_id(&resolve.id)?;
            let request = review_request(resolve)?;
            let outcome = pipeline.resolve_task(task_id, request, now).await?;
            println!("{}", formatter.format_review(&outcome)?);
        }
    }
    Ok(())
}

fn list_tasks(
    args: ListArgs,
    pipeline: &Pipeline<SqliteStore>,
    now: u64,
) -> Result<Vec<fundwatch_domain::VerificationTask>> {
    let priority: Option<Priority> = args.priority.map(Into::into);
    let kind: Option<TaskKind> = args.kind.map(Into::into);

    if args.overdue {
        let mut tasks = pipeline.overdue(now)?;
        tasks.retain(|t| priority.is_none_or(|p| t.priority == p) && kind.is_none_or(|k| t.kind == k));
        if let Some(limit) = args.limit {
            tasks.truncate(limit);
        }
        return Ok(tasks);
    }

    let filter = TaskFilter {
        status: args.status.map(Into::into),
        open_only: args.status.is_none(),
        priority,
        kind,
        limit: args.limit,
        ..Default::default()
    };
    Ok(pipeline.list_tasks(&filter)?)
}

fn review_request(args: ResolveArgs) -> Result<ReviewRequest> {
    let mut request = if args.rejected {
        ReviewRequest::reject(args.notes.unwrap_or_default())
    } else {
        let value = args.value.as_deref().map(parse_value).transpose()?;
        let request = ReviewRequest::verify(value);
        match args.notes {
            Some(notes) => request.with_notes(notes),
            None => request,
        }
    };
    if let Some(reviewer) = args.reviewer {
        request = request.by(reviewer);
    }
    Ok(request)
}

fn parse_task_id(id: &str) -> Result<TaskId> {
    TaskId::from_string(id).map_err(|e| CliError::InvalidInput(format!("Invalid task ID '{}': {}", id, e)))
}

/// Parse a reviewer-chosen value.
///
/// Accepts a JSON fact value (`{"type": "text", "value": "..."}`), an entity
/// ID, a money amount such as `$12M`, or a bare token taken as an enum value.
pub fn parse_value(input: &str) -> Result<FactValue> {
    let input = input.trim();
    if input.starts_with('{') {
        return Ok(serde_json::from_str(input)?);
    }
    if let Ok(id) = EntityId::from_string(input) {
        return Ok(FactValue::Entity(id));
    }
    if let Some(cents) = parse_money(input) {
        return Ok(FactValue::Money(cents));
    }
    match canonical_token(input) {
        Some(token) => Ok(FactValue::Enum(token)),
        None => Err(CliError::InvalidInput(format!("Cannot read '{}' as a value", input))),
    }
}
