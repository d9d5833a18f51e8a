//! Graph command implementation.

use crate::cli::{GraphAction, GraphArgs};
use crate::error::Result;
use crate::output::Formatter;
use fundwatch_domain::clock::current_timestamp;
use fundwatch_pipeline::{Pipeline, PipelineError};
use fundwatch_store::SqliteStore;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Execute a graph subcommand.
///
/// Ctrl+C during a build cancels it; nothing is written.
pub async fn execute_graph(
    args: GraphArgs,
    pipeline: &Pipeline<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        GraphAction::Build { out } => {
            let cancel = Arc::new(AtomicBool::new(false));
            let watcher = {
                let cancel = Arc::clone(&cancel);
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Cancelling graph build");
                        cancel.store(true, Ordering::Release);
                    }
                })
            };

            let result = pipeline.build_graph(current_timestamp(), cancel).await;
            watcher.abort();
            let graph = result?;

            match out {
                Some(path) => {
                    fs::write(&path, graph.to_json().map_err(PipelineError::from)?)?;
                    println!("{}", formatter.format_graph(&graph)?);
                    println!("{}", formatter.success(&format!("Graph written to {}", path.display())));
                }
                None => println!("{}", formatter.format_graph(&graph)?),
            }
        }
    }
    Ok(())
}
