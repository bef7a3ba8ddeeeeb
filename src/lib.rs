//! Solana Pairwise Transfer Scanner
//!
//! Pulls the transaction history of two Solana addresses from the Helius
//! enhanced-transactions API and reports every SOL and SPL token transfer
//! that moved directly between them.
//!
//! # Pipeline Stages
//!
//! 1. **Fetch** ([`fetch_transactions`]): Cursor-paginated history per address, capped per address
//! 2. **Extract** ([`extract`]): Normalizes native and token transfers between the pair
//! 3. **Merge** ([`scan`]): Deduplicates transactions and transfers, newest first
//! 4. **Report** ([`aggregate`]): Per-category count/volume and the text report
//!
//! Token metadata ([`token_metadata`]) is looked up on demand and cached in a
//! bounded LRU; it is not needed for extraction.
//!
//! # Example
//!
//! ```no_run
//! use sol_transfer_scanner::address::Address;
//! use sol_transfer_scanner::config::ScannerConfig;
//! use sol_transfer_scanner::scan::Scanner;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScannerConfig::load()?;
//!     let scanner = Scanner::from_config(&config)?;
//!     let a = Address::parse("7C3o6iK4sNfB2ewc2ExRVPjRttQVBXdMZKXy6u6bh3DF")?;
//!     let b = Address::parse("H5kdkDUfT5umYbRxFKpWkgveeNWf1EcqUgBT7EdRmeij")?;
//!     let result = scanner.scan(&a, &b, 1000).await;
//!     println!("Found {} transfers", result.events.len());
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod aggregate;
pub mod client;
pub mod config;
pub mod extract;
pub mod fetch_transactions;
pub mod scan;
pub mod schemas;
pub mod token_metadata;

// Re-export commonly used types
pub use config::ScannerConfig;
pub use schemas::{ScanResult, TransferEvent, TransferKind, TransferStats};
