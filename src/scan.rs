//! Two-address scan orchestration.
//!
//! Fetches both histories, runs extraction once per distinct transaction,
//! drops duplicate transfers and orders the result newest first.

use crate::address::Address;
use crate::aggregate::summarize;
use crate::client::{ApiError, HeliusClient};
use crate::config::ScannerConfig;
use crate::extract::extract_transfers;
use crate::fetch_transactions::{FetchError, TransactionFetcher};
use crate::schemas::{FetchFailure, ScanResult, TransactionRecord, TransferEvent};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// History of one scanned address, or why it is missing
pub type AddressBatch = (Address, Result<Vec<TransactionRecord>, FetchError>);

pub struct Scanner {
    fetcher: TransactionFetcher,
}

impl Scanner {
    pub fn new(client: Arc<HeliusClient>) -> Self {
        Self {
            fetcher: TransactionFetcher::new(client),
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Result<Self, ApiError> {
        let client = HeliusClient::new(
            config.helius_base_url.clone(),
            config.helius_api_key.clone(),
            config.commitment,
            config.rate_limits.clone(),
        )?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Scan the transfer history between `addr1` and `addr2`.
    ///
    /// A failed fetch for one address is recorded in the result and the scan
    /// carries on with the other address; this never fails as a whole.
    pub async fn scan(&self, addr1: &Address, addr2: &Address, max_per_address: usize) -> ScanResult {
        info!("Scanning transactions between {} and {}", addr1, addr2);
        info!("Maximum transactions per address: {}", max_per_address);
        if addr1 == addr2 {
            warn!("Both scan addresses are {}; only self-transfers can match", addr1);
        }

        let (first, second) = tokio::join!(
            self.fetcher.fetch_transactions(addr1, max_per_address),
            self.fetcher.fetch_transactions(addr2, max_per_address)
        );

        let result = merge_batches(
            addr1,
            addr2,
            vec![(addr1.clone(), first), (addr2.clone(), second)],
        );

        info!(
            "Found {} transfers between addresses ({} SOL, {} token)",
            result.events.len(),
            result.stats.native.count,
            result.stats.tokens.values().map(|t| t.count).sum::<usize>()
        );

        result
    }
}

/// Merge fetched histories into a deduplicated, newest-first `ScanResult`.
///
/// Batches are processed in the given order. Transactions are deduplicated by
/// signature; transfers by full value equality, so identical legs inside one
/// transaction also collapse into a single event.
pub fn merge_batches(addr1: &Address, addr2: &Address, batches: Vec<AddressBatch>) -> ScanResult {
    let mut seen_signatures: HashSet<String> = HashSet::new();
    let mut events: Vec<TransferEvent> = Vec::new();
    let mut fetch_errors = Vec::new();

    for (address, batch) in batches {
        let transactions = match batch {
            Ok(transactions) => transactions,
            Err(e) => {
                warn!("No transactions available for {}: {}", address, e);
                fetch_errors.push(FetchFailure {
                    address: address.to_string(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let mut processed = 0usize;
        for tx in &transactions {
            // Unsigned records cannot be keyed; transfer equality still dedups them
            if let Some(signature) = &tx.signature {
                if !seen_signatures.insert(signature.clone()) {
                    continue;
                }
            }
            processed += 1;

            for transfer in extract_transfers(tx, addr1, addr2) {
                if !events.contains(&transfer) {
                    events.push(transfer);
                }
            }
        }

        debug!(
            "Processed {} of {} transactions fetched for {}",
            processed,
            transactions.len(),
            address
        );
    }

    // Stable: equal timestamps keep discovery order
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    ScanResult {
        stats: summarize(&events),
        events,
        fetch_errors,
    }
}
