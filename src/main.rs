//! Solana Pairwise Transfer Scanner CLI
//!
//! Lists the SOL and SPL token transfers made directly between two addresses.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sol_transfer_scanner::address::Address;
use sol_transfer_scanner::aggregate::render_report;
use sol_transfer_scanner::client::HeliusClient;
use sol_transfer_scanner::config::ScannerConfig;
use sol_transfer_scanner::scan::Scanner;
use sol_transfer_scanner::token_metadata::TokenMetadataResolver;

#[derive(Parser)]
#[command(name = "sol-transfer-scanner")]
#[command(version)]
#[command(about = "Scan the transfer history between two Solana addresses", long_about = None)]
struct Cli {
    /// Path to configuration file (optional, uses env vars if not provided)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List transfers between two addresses
    Scan {
        /// First address
        address1: String,

        /// Second address
        address2: String,

        /// Maximum transactions fetched per address (defaults to the configured value)
        #[arg(short, long)]
        max_transactions: Option<usize>,

        /// Print the scan result as JSON instead of the text report
        #[arg(long)]
        json: bool,
    },

    /// Look up token metadata for one or more mint addresses
    TokenInfo {
        /// Mint addresses
        #[arg(required = true)]
        mints: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging (stderr keeps stdout for the report)
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // Load configuration
    let config = match &cli.config {
        Some(path) => ScannerConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ScannerConfig::load().context("Failed to load config from environment")?,
    };
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Scan {
            address1,
            address2,
            max_transactions,
            json,
        } => {
            cmd_scan(&config, &address1, &address2, max_transactions, json).await?;
        }
        Commands::TokenInfo { mints } => {
            cmd_token_info(&config, &mints).await?;
        }
    }

    Ok(())
}

async fn cmd_scan(
    config: &ScannerConfig,
    address1: &str,
    address2: &str,
    max_transactions: Option<usize>,
    json: bool,
) -> Result<()> {
    let addr1 = Address::parse(address1).context("Invalid first address")?;
    let addr2 = Address::parse(address2).context("Invalid second address")?;
    let max_per_address = max_transactions.unwrap_or(config.scan.max_transactions_per_address);

    let scanner = Scanner::from_config(config).context("Failed to build Helius client")?;
    let result = scanner.scan(&addr1, &addr2, max_per_address).await;

    if !result.fetch_errors.is_empty() {
        warn!(
            "History incomplete: {} address fetch(es) failed",
            result.fetch_errors.len()
        );
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &result).context("Failed to write JSON result")?;
        writeln!(out)?;
    } else {
        render_report(&result, &mut out).context("Failed to write report")?;
    }

    Ok(())
}

async fn cmd_token_info(config: &ScannerConfig, mints: &[String]) -> Result<()> {
    let client = HeliusClient::new(
        config.helius_base_url.clone(),
        config.helius_api_key.clone(),
        config.commitment,
        config.rate_limits.clone(),
    )
    .context("Failed to build Helius client")?;

    let capacity = NonZeroUsize::new(config.scan.token_cache_capacity)
        .context("token_cache_capacity must be > 0")?;
    let resolver = TokenMetadataResolver::new(Arc::new(client), capacity);

    let resolved = resolver.resolve_many(mints).await;
    info!("Resolved {} of {} mint(s)", resolved.len(), mints.len());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for mint in mints {
        match resolved.iter().find(|(m, _)| m == mint) {
            Some((_, metadata)) => {
                writeln!(out, "{}:", mint)?;
                writeln!(out, "  Symbol: {}", metadata.symbol().unwrap_or("-"))?;
                writeln!(out, "  Name: {}", metadata.name().unwrap_or("-"))?;
                match metadata.decimals() {
                    Some(decimals) => writeln!(out, "  Decimals: {}", decimals)?,
                    None => writeln!(out, "  Decimals: -")?,
                }
            }
            None => writeln!(out, "{}: no metadata found", mint)?,
        }
    }

    Ok(())
}
