//! Entity command implementation.

use crate::cli::{EntityAction, EntityArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use fundwatch_domain::EntityKind;
use fundwatch_pipeline::Pipeline;
use fundwatch_store::SqliteStore;

/// Execute an entity subcommand.
pub async fn execute_entity(
    args: EntityArgs,
    pipeline: &Pipeline<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        EntityAction::Show { name, kind } => {
            let kind: EntityKind = kind.into();
            // Merged names resolve to their survivor
            let entity = pipeline
                .find_entity(&name, kind)?
                .ok_or_else(|| CliError::NotFound(format!("{} '{}'", kind, name)))?;
            println!("{}", formatter.format_entity(&entity)?);
        }
    }
    Ok(())
}
