//! ddl-emulator CLI
//!
//! A small operator-facing entry point over the DDL core: read a file of
//! `;`-separated DDL statements, apply them in order to an initially-empty
//! schema the way an admin `UpdateDatabaseDdl` request would (spec §6),
//! register the request as a completed operation (spec §4.F), and print the
//! result. The gRPC surface, resource-URI namespace, and authentication this
//! would sit behind in the real service are out of scope (spec §1).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ddl_emulator_core::{
    split_statements, Config, OperationId, OperationMetadata, OperationResult, OperationTracker,
    Schema,
};

#[derive(Parser, Debug)]
#[command(name = "ddl-emulator")]
#[command(about = "In-process emulator for a managed database's DDL dialect", long_about = None)]
struct Args {
    /// Path to configuration file (feature gates, output format).
    #[arg(short, long, default_value = "ddl-emulator.toml")]
    config: PathBuf,

    /// Path to a file containing `;`-separated DDL statements to apply, in
    /// order, to a fresh database.
    ddl_file: PathBuf,

    /// Resource URI of the database the statements are applied to, used to
    /// build the registered operation's URI.
    #[arg(long, default_value = "projects/local/instances/local/databases/local")]
    database: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = if args.config.exists() {
        Config::from_file(&args.config).context("failed to load configuration")?
    } else {
        tracing::warn!(path = %args.config.display(), "config file not found, using defaults");
        Config::default()
    };

    let text = std::fs::read_to_string(&args.ddl_file)
        .with_context(|| format!("failed to read {}", args.ddl_file.display()))?;
    let statement_texts =
        split_statements(&text).map_err(|status| anyhow::anyhow!("{status}"))?;

    let parsed: Result<Vec<_>, _> = statement_texts
        .iter()
        .map(|s| ddl_emulator_core::parse(s, config.features))
        .collect();

    let (schema, op_result) = match parsed {
        Ok(statements) => {
            let (schema, applied, err) =
                ddl_emulator_core::apply_sequence(&Schema::empty(), &statements);
            let result = match err {
                None => OperationResult::Success {
                    applied_statements: applied,
                },
                Some(status) => OperationResult::Error(status),
            };
            (schema, result)
        }
        Err(status) => (Schema::empty(), OperationResult::Error(status)),
    };

    let metadata = OperationMetadata::new("UpdateDatabaseDdl", statement_texts.clone());
    let tracker = OperationTracker::new();
    let handle = tracker
        .create(&args.database, OperationId::Auto, metadata, op_result)
        .context("failed to register operation")?;

    println!("operation: {}", handle.uri);
    match &handle.result {
        OperationResult::Success { applied_statements } => {
            println!(
                "applied {applied_statements} of {} statements",
                statement_texts.len()
            );
        }
        OperationResult::Error(status) => {
            println!("failed: {status}");
        }
    }

    if config.output.json {
        println!("{}", schema_summary_json(&schema)?);
    } else {
        let tables = schema
            .tables
            .iter()
            .filter(|(_, t)| !t.is_index_backing_table)
            .count();
        let indexes = schema.indexes.iter().filter(|(_, i)| !i.is_managed).count();
        println!("schema: {tables} tables, {indexes} user-created indexes");
    }

    Ok(())
}

fn schema_summary_json(schema: &Schema) -> Result<String> {
    #[derive(serde::Serialize)]
    struct TableSummary {
        name: String,
        columns: usize,
    }
    #[derive(serde::Serialize)]
    struct SchemaSummary {
        tables: Vec<TableSummary>,
        indexes: Vec<String>,
    }

    let summary = SchemaSummary {
        tables: schema
            .tables
            .iter()
            .filter(|(_, t)| !t.is_index_backing_table)
            .map(|(_, t)| TableSummary {
                name: t.name.clone(),
                columns: t.columns.len(),
            })
            .collect(),
        indexes: schema
            .indexes
            .iter()
            .filter(|(_, i)| !i.is_managed)
            .map(|(_, i)| i.name.clone())
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}
