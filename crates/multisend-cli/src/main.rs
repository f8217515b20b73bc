//! # MultiSend Runtime
//!
//! Inspects recipient lists and simulates atomic batch execution against an
//! in-memory ledger.
//!
//! ## Usage
//!
//! ```text
//! multisend check recipients.csv
//! multisend export recipients.txt --to json
//! multisend simulate recipients.csv --value 10.5
//! multisend simulate recipients.json --token 0x6B17...1d0F --symbol DAI
//! ```
//!
//! Configuration comes from `MULTISEND_MAX_RECIPIENTS` and
//! `MULTISEND_EXPLORER_URL`, overridden by the matching flags.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{ExportFormat, InputFormat, SimulateOptions};
use multisend_engine::EngineConfig;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// MultiSend: validate recipient lists and simulate atomic batch transfers
#[derive(Parser, Debug)]
#[command(name = "multisend", version)]
#[command(about = "Validate recipient lists and simulate atomic batch transfers")]
struct Args {
    /// Largest batch accepted for execution
    #[arg(long, global = true)]
    max_recipients: Option<usize>,

    /// Block explorer base URL used for transaction links
    #[arg(long, global = true)]
    explorer: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the batch summary for a recipients file
    Check {
        /// Recipients file (pasted text, CSV or JSON)
        file: PathBuf,
        /// Input format; `auto` picks by file extension
        #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,
    },

    /// Convert a recipients file to CSV or JSON on stdout
    Export {
        /// Recipients file
        file: PathBuf,
        /// Input format; `auto` picks by file extension
        #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,
        /// Output format
        #[arg(long, value_enum)]
        to: ExportFormat,
    },

    /// Execute the batch against an in-memory ledger
    Simulate {
        /// Recipients file
        file: PathBuf,
        /// Input format; `auto` picks by file extension
        #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,
        #[command(flatten)]
        options: SimulateOptions,
    },
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = EngineConfig::from_env();
    if let Some(max) = args.max_recipients {
        config.max_recipients = max;
    }
    if let Some(url) = &args.explorer {
        config.explorer_base_url = Some(url.clone());
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = load_config(&args)?;
    debug!(?config, "Configuration loaded");

    match args.command {
        Command::Check { file, format } => {
            let batch = commands::load_batch(&file, format)?;
            commands::check(&batch, &config);
        }
        Command::Export { file, format, to } => {
            let batch = commands::load_batch(&file, format)?;
            print!("{}", commands::export(&batch, to)?);
        }
        Command::Simulate {
            file,
            format,
            options,
        } => {
            let batch = commands::load_batch(&file, format)?;
            info!(recipients = batch.len(), file = %file.display(), "Simulating batch");
            commands::simulate(&batch, &options, config).await?;
        }
    }

    Ok(())
}
