//! Table gate operator tool
//!
//! Loads the gate configuration and policy resource, then prints the policy
//! or evaluates a single decision the way the host would.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use table_gate::{
    AccessGate, GateConfig, Identity, PolicyStore, RequestContext,
    config::{LogFormat, load_config},
    gate::{TableDescriptor, TableOperation},
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Table gate - admin-only table management policy tool
#[derive(Parser, Debug)]
#[command(name = "table-gate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "TABLE_GATE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TABLE_GATE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the loaded policy as JSON
    Show,

    /// Evaluate one operation and exit non-zero when it is denied
    Check {
        /// Operation (create, delete, modify)
        #[arg(value_parser = parse_operation)]
        operation: TableOperation,

        /// Table name
        table: String,

        /// Acting principal (defaults to the process user)
        #[arg(long = "as")]
        identity: Option<String>,
    },
}

fn parse_operation(s: &str) -> Result<TableOperation, String> {
    TableOperation::try_parse(s)
        .ok_or_else(|| format!("unknown operation '{}', expected create, delete or modify", s))
}

fn init_logging(config: &GateConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn load_store(config: &GateConfig) -> anyhow::Result<Arc<PolicyStore>> {
    let store = PolicyStore::from_config(config).context("Invalid policy location")?;
    // Operators want the file as it is now, not after the quiescence window
    if !store.force_reload().context("Failed to load policy resource")? {
        bail!("No policy resource loaded");
    }
    Ok(Arc::new(store))
}

fn run(args: Args, config: GateConfig) -> anyhow::Result<ExitCode> {
    let store = load_store(&config)?;

    match args.command {
        Command::Show => {
            let snapshot = store.snapshot();
            println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check {
            operation,
            table,
            identity,
        } => {
            let gate = AccessGate::from_config(&config, store);
            let desc = TableDescriptor::new(table.as_bytes());
            let decide = || match operation {
                TableOperation::Create => gate.check_create(&desc, &[]),
                TableOperation::Delete => gate.check_delete(table.as_bytes()),
                TableOperation::Modify => gate.check_modify(table.as_bytes(), &desc),
            };

            let result = match identity {
                Some(principal) => RequestContext::scope(Identity::new(principal), decide),
                None => decide(),
            };

            match result {
                Ok(()) => {
                    println!("ALLOWED: {} {}", operation, table);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("DENIED: {}", e);
                    Ok(ExitCode::from(1))
                }
            }
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_logging(&config, args.log_level.as_deref());

    info!(version = env!("CARGO_PKG_VERSION"), "Starting table gate");

    run(args, config).inspect_err(|e| error!(error = %e, "table-gate failed"))
}
