//! Ingest command implementation.

use crate::cli::IngestArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use fundwatch_domain::clock::current_timestamp;
use fundwatch_normalizer::SourcedRecord;
use fundwatch_pipeline::Pipeline;
use fundwatch_store::SqliteStore;
use std::fs;
use std::io::{self, Read};
use tracing::info;

/// Execute the ingest command.
pub async fn execute_ingest(
    args: IngestArgs,
    pipeline: &Pipeline<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let json_data = if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else if let Some(file_path) = &args.file {
        fs::read_to_string(file_path)?
    } else {
        return Err(CliError::InvalidInput(
            "Must specify either a file or --stdin".to_string(),
        ));
    };

    let batch = parse_batch(&json_data)?;
    info!(records = batch.len(), "Ingesting batch");

    let report = pipeline.ingest(batch, current_timestamp()).await?;
    println!("{}", formatter.format_ingest(&report)?);
    Ok(())
}

/// Parse a batch: a JSON array of `{source, record}` objects.
///
/// A record with an unknown `source_type` fails the whole batch here; records
/// that parse but lack required fields are counted as malformed downstream.
fn parse_batch(json_data: &str) -> Result<Vec<SourcedRecord>> {
    let batch: Vec<SourcedRecord> = serde_json::from_str(json_data)?;
    if batch.is_empty() {
        return Err(CliError::InvalidInput("No records provided".to_string()));
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch() {
        let json = r#"
        [
            {
                "source": { "source_id": "api:crunch", "fetched_at": 1700000000 },
                "record": { "source_type": "api", "name": "CyberSecure Inc.", "total_funding": "$10M" }
            },
            {
                "source": { "source_id": "news:wire", "fetched_at": 1700000000 },
                "record": {
                    "source_type": "news",
                    "headline": "CyberSecure raises $12M",
                    "company": "CyberSecure",
                    "published_at": "2023-11-14"
                }
            }
        ]
        "#;

        let batch = parse_batch(json).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].source.source_id, "api:crunch");
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(matches!(parse_batch("[]"), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_not_an_array_rejected() {
        assert!(matches!(parse_batch("{}"), Err(CliError::Serialization(_))));
    }
}
