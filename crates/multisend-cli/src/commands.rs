//! Subcommand implementations.

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use multisend_engine::algorithms::{parse_recipients, preview_candidates};
use multisend_engine::display::{DEFAULT_ADDRESS_CHARS, DEFAULT_FRACTION_DIGITS};
use multisend_engine::{
    address_url, export_csv, export_json, format_address, format_amount, import_csv, import_json,
    tx_url, Address, Batch, BatchExecutor, BroadcastPublisher, DecimalAmount, EngineConfig,
    ExecutionRequest, InMemorySettlement, LifecycleTracker, TokenDescriptor, U256,
};
use std::path::Path;
use tracing::{info, warn};

/// Actor used when `--actor` is not given.
const DEFAULT_ACTOR: &str = "0x00000000000000000000000000000000000000a1";

/// How a recipients file is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// By extension: `.csv`, `.json`, anything else as pasted text
    Auto,
    /// One `address<sep>amount` per line
    Text,
    /// `Address,Amount` rows
    Csv,
    /// Array of `{address, amount}`
    Json,
}

/// Output of the `export` subcommand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// `Address,Amount` rows
    Csv,
    /// Pretty JSON array
    Json,
}

/// Options for `simulate`.
#[derive(clap::Args, Debug)]
pub struct SimulateOptions {
    /// Token contract address; the native asset when absent
    #[arg(long)]
    pub token: Option<String>,

    /// Asset symbol
    #[arg(long, default_value = "ETH")]
    pub symbol: String,

    /// Asset precision
    #[arg(long, default_value_t = 18)]
    pub decimals: u8,

    /// Native value to attach (defaults to exactly the batch total)
    #[arg(long)]
    pub value: Option<String>,

    /// Funds credited to the actor before settlement (defaults to what the batch needs)
    #[arg(long)]
    pub balance: Option<String>,

    /// Initiating account
    #[arg(long, default_value = DEFAULT_ACTOR)]
    pub actor: String,
}

fn resolve_format(path: &Path, format: InputFormat) -> InputFormat {
    if format != InputFormat::Auto {
        return format;
    }
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("csv") => InputFormat::Csv,
        Some("json") => InputFormat::Json,
        _ => InputFormat::Text,
    }
}

/// Reads a recipients file into a batch.
pub fn load_batch(path: &Path, format: InputFormat) -> Result<Batch> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let batch: Batch = match resolve_format(path, format) {
        InputFormat::Csv => import_csv(&text)
            .context("Failed to import CSV")?
            .into_iter()
            .collect(),
        InputFormat::Json => import_json(&text)
            .context("Failed to import JSON")?
            .into_iter()
            .collect(),
        InputFormat::Text | InputFormat::Auto => {
            let preview = preview_candidates(parse_recipients(&text));
            info!(
                valid = preview.valid,
                invalid = preview.invalid,
                total = preview.total,
                "Parsed pasted text"
            );
            Batch::from_text(&text)
        }
    };
    Ok(batch)
}

/// Prints the summary panel.
pub fn check(batch: &Batch, config: &EngineConfig) {
    let summary = batch.summary();

    println!("Recipients:  {}", summary.entries);
    println!("Valid:       {}", summary.valid_count);
    println!("Invalid:     {}", summary.invalid_count);
    match summary.total {
        Some(total) => println!("Total:       {}", format_amount(&total, DEFAULT_FRACTION_DIGITS)),
        None => println!("Total:       overflow"),
    }

    for (index, recipient) in batch.iter().enumerate() {
        if !recipient.is_executable() {
            println!(
                "  #{index:<4} {} {:?} not executable",
                format_address(recipient.address(), DEFAULT_ADDRESS_CHARS),
                recipient.amount()
            );
        }
    }
    if !summary.duplicates.is_empty() {
        println!("Duplicates:  {}", summary.duplicates.join(", "));
    }
    if summary.entries > config.max_recipients {
        warn!(
            entries = summary.entries,
            max = config.max_recipients,
            "Batch exceeds the recipient bound"
        );
    }
}

/// Renders the batch as CSV or JSON.
pub fn export(batch: &Batch, to: ExportFormat) -> Result<String> {
    let rendered = match to {
        ExportFormat::Csv => export_csv(batch.recipients())?,
        ExportFormat::Json => {
            let mut json = export_json(batch.recipients())?;
            json.push('\n');
            json
        }
    };
    Ok(rendered)
}

fn units(text: &str, decimals: u8, what: &str) -> Result<U256> {
    let amount: DecimalAmount = text
        .parse()
        .with_context(|| format!("Invalid {what} {text:?}"))?;
    amount
        .to_base_units(decimals)
        .with_context(|| format!("Invalid {what} {text:?}"))
}

/// Runs one attempt against a freshly funded in-memory ledger.
pub async fn simulate(batch: &Batch, options: &SimulateOptions, config: EngineConfig) -> Result<()> {
    let actor = Address::parse(&options.actor)
        .ok_or_else(|| anyhow!("Invalid actor address {:?}", options.actor))?;
    let decimals = options.decimals;

    let token = match &options.token {
        Some(raw) => {
            let address =
                Address::parse(raw).ok_or_else(|| anyhow!("Invalid token address {raw:?}"))?;
            TokenDescriptor::token(address, &options.symbol, &options.symbol, decimals)
        }
        None => TokenDescriptor::native(&options.symbol, &options.symbol, decimals),
    };

    let needed = batch
        .summary()
        .total
        .and_then(|total| total.to_base_units(decimals).ok())
        .unwrap_or_default();
    let attached = match (&options.value, token.is_native) {
        (Some(value), true) => units(value, decimals, "value").unwrap_or(needed),
        _ => needed,
    };
    let funds = match &options.balance {
        Some(balance) => units(balance, decimals, "balance")?,
        None => needed.max(attached),
    };

    let ledger = InMemorySettlement::new();
    ledger.set_balance(actor, token.address, funds);

    let explorer = config.explorer_base_url.clone();
    let executor = BatchExecutor::new(ledger, BroadcastPublisher::default(), config);
    let tracker = LifecycleTracker::new();

    let mut states = tracker.subscribe();
    let watcher = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let status = states.borrow_and_update().clone();
            info!(state = %status.state, error = ?status.error, "Lifecycle");
        }
    });

    let mut request = ExecutionRequest::new(actor, batch, Some(&token));
    if let Some(value) = &options.value {
        request = request.with_value(value);
    }
    let result = executor.execute(request, &tracker).await;

    drop(tracker);
    watcher.await.context("Lifecycle watcher panicked")?;

    match result.into_result() {
        Ok(completion) => {
            println!("Status:      success");
            println!("Reference:   {}", completion.reference);
            println!("Recipients:  {}", completion.recipient_count);
            println!(
                "Total:       {} {}",
                format_amount(&completion.total, DEFAULT_FRACTION_DIGITS),
                token.symbol
            );
            let link = tx_url(&completion.reference, explorer.as_deref());
            if !link.is_empty() {
                println!("Explorer:    {link}");
                println!(
                    "Sender:      {}",
                    address_url(&actor.to_string(), explorer.as_deref())
                );
            }
            Ok(())
        }
        Err(error) => bail!("Batch failed ({}): {error}", error.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR_A: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0";
    const ADDR_B: &str = "0xA574EC6E2B51B58eb339B7D5107598474BA14eC5";

    #[test]
    fn test_resolve_format_by_extension() {
        let auto = InputFormat::Auto;
        assert_eq!(resolve_format(Path::new("a.CSV"), auto), InputFormat::Csv);
        assert_eq!(resolve_format(Path::new("a.json"), auto), InputFormat::Json);
        assert_eq!(resolve_format(Path::new("a.txt"), auto), InputFormat::Text);
        assert_eq!(
            resolve_format(Path::new("a.csv"), InputFormat::Text),
            InputFormat::Text
        );
    }

    #[test]
    fn test_export_json_ends_with_newline() {
        let batch = Batch::from_text(&format!("{ADDR_A},1\n{ADDR_B},2"));
        let json = export(&batch, ExportFormat::Json).unwrap();
        assert!(json.ends_with("]\n"));
    }

    fn options(value: Option<&str>) -> SimulateOptions {
        SimulateOptions {
            token: None,
            symbol: "ETH".to_string(),
            decimals: 18,
            value: value.map(str::to_string),
            balance: None,
            actor: DEFAULT_ACTOR.to_string(),
        }
    }

    #[tokio::test]
    async fn test_simulate_native_batch() {
        let batch = Batch::from_text(&format!("{ADDR_A},1.5\n{ADDR_B},2"));
        simulate(&batch, &options(Some("4")), EngineConfig::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_simulate_reports_failure() {
        let batch = Batch::from_text(&format!("{ADDR_A},1.5\n{ADDR_A},2"));
        let err = simulate(&batch, &options(None), EngineConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("DuplicateAddress"));
    }
}
