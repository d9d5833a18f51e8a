//! Backlog command implementation.

use crate::cli::BacklogArgs;
use crate::error::Result;
use crate::output::Formatter;
use fundwatch_domain::clock::current_timestamp;
use fundwatch_pipeline::Pipeline;
use fundwatch_queue::{BacklogWorker, QueueConfig};
use fundwatch_store::SqliteStore;
use std::sync::Arc;

/// Execute the backlog command.
///
/// With `--watch` the backlog worker reports on its interval until Ctrl+C.
pub async fn execute_backlog(
    args: BacklogArgs,
    pipeline: &Pipeline<SqliteStore>,
    queue: QueueConfig,
    formatter: &Formatter,
) -> Result<()> {
    if args.watch {
        println!("{}", formatter.info("Watching backlog, Ctrl+C to stop"));
        let mut worker = BacklogWorker::new(queue)?;
        worker.run(Arc::clone(pipeline.store())).await?;
        return Ok(());
    }

    let metrics = pipeline.backlog(current_timestamp())?;
    println!("{}", formatter.format_backlog(&metrics)?);
    Ok(())
}
