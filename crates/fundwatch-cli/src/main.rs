//! Fundwatch CLI - reconcile funding data and work the review queue.

use clap::Parser;
use fundwatch_cli::commands;
use fundwatch_cli::{Cli, CliError, Command, Config, Formatter};
use fundwatch_pipeline::Pipeline;
use fundwatch_store::SqliteStore;
use std::fs;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> fundwatch_cli::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.store.path = Some(db);
    }

    // Logs go to stderr so command output stays pipeable
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| CliError::Config(format!("logging: {}", e)))?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let color_enabled = !cli.no_color && config.output.color;
    let formatter = Formatter::new(format, color_enabled);

    let db_path = config.db_path()?;
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let store = Arc::new(Mutex::new(SqliteStore::new(&db_path)?));
    let pipeline = Pipeline::new(store, config.pipeline())?;

    match cli.command {
        Command::Ingest(args) => commands::execute_ingest(args, &pipeline, &formatter).await?,
        Command::Tasks(args) => commands::execute_tasks(args, &pipeline, &formatter).await?,
        Command::Entity(args) => commands::execute_entity(args, &pipeline, &formatter).await?,
        Command::Graph(args) => commands::execute_graph(args, &pipeline, &formatter).await?,
        Command::Backlog(args) => {
            commands::execute_backlog(args, &pipeline, config.queue.clone(), &formatter).await?
        }
    }

    Ok(())
}
