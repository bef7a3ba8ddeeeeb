//! Data schemas for the transfer scanner.
//!
//! Wire types mirror the Helius enhanced-transaction payloads; domain types
//! are what the rest of the scanner works with.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Signature attached to events whose transaction carried none.
pub const UNKNOWN_SIGNATURE: &str = "unknown";

/// Label attached to token events without a token standard.
pub const UNKNOWN_TOKEN_LABEL: &str = "Unknown";

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: f64 = 1e9;

// ============================================================================
// PART A: Wire Schema
// ============================================================================

/// One enhanced transaction as returned by the transactions endpoint.
///
/// Every field decodes leniently: a value of the wrong JSON type is treated
/// as absent. Page entries go through [`TransactionRecord::from_json`], so an
/// entry that is not an object at all cannot fail a whole page either.
/// Transfer sub-records are kept as raw JSON and parsed one at a time by the
/// extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub signature: Option<String>,

    /// Block time (seconds since epoch)
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<i64>,

    #[serde(default, deserialize_with = "lenient")]
    pub native_transfers: Option<Vec<Value>>,

    #[serde(default, deserialize_with = "lenient")]
    pub token_transfers: Option<Vec<Value>>,
}

impl TransactionRecord {
    /// Decode one page entry. Anything that is not a JSON object becomes an
    /// empty record, which keeps its slot in the page but yields no transfers.
    pub fn from_json(value: Value) -> Self {
        match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                debug!("Treating unreadable transaction entry as empty: {}", e);
                Self::default()
            }
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// SOL movement inside a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NativeTransferRaw {
    #[serde(rename = "fromUserAccount", alias = "from", default)]
    pub from: Option<String>,

    #[serde(rename = "toUserAccount", alias = "to", default)]
    pub to: Option<String>,

    /// Amount in lamports
    #[serde(default)]
    pub amount: u64,
}

/// SPL token movement inside a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenTransferRaw {
    #[serde(rename = "fromUserAccount", alias = "from", default)]
    pub from: Option<String>,

    #[serde(rename = "toUserAccount", alias = "to", default)]
    pub to: Option<String>,

    #[serde(rename = "tokenAmount", default)]
    pub token_amount: Option<TokenAmount>,

    #[serde(default)]
    pub decimals: Option<u32>,

    #[serde(rename = "tokenStandard", default)]
    pub token_standard: Option<String>,

    #[serde(default)]
    pub mint: Option<String>,
}

/// Token amounts arrive either as JSON numbers or as decimal strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TokenAmount {
    Number(f64),
    Text(String),
}

impl TokenAmount {
    pub fn to_f64(&self) -> Result<f64, String> {
        match self {
            TokenAmount::Number(n) => Ok(*n),
            TokenAmount::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid token amount {:?}: {}", s, e)),
        }
        .and_then(|amount| {
            if amount.is_finite() {
                Ok(amount)
            } else {
                Err(format!("non-finite token amount {:?}", self))
            }
        })
    }
}

// ============================================================================
// PART B: Transfer Schema
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// SOL
    Native,
    /// SPL token
    Token,
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferKind::Native => write!(f, "SOL"),
            TransferKind::Token => write!(f, "SPL"),
        }
    }
}

/// A normalized transfer between the two scanned addresses.
///
/// `amount` is always in human-readable units. Equality over every field is
/// what the scanner uses to drop duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub kind: TransferKind,
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub timestamp: i64,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub token_label: Option<String>,
}

// ============================================================================
// PART C: Token Metadata Schema
// ============================================================================

/// Metadata record returned by the token-metadata endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Mint address
    #[serde(default)]
    pub account: String,

    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

impl TokenMetadata {
    pub fn symbol(&self) -> Option<&str> {
        self.lookup(&["legacyMetadata", "symbol"])
            .or_else(|| self.lookup(&["onChainMetadata", "metadata", "data", "symbol"]))
    }

    pub fn name(&self) -> Option<&str> {
        self.lookup(&["legacyMetadata", "name"])
            .or_else(|| self.lookup(&["onChainMetadata", "metadata", "data", "name"]))
    }

    pub fn decimals(&self) -> Option<u64> {
        self.details
            .get("legacyMetadata")
            .and_then(|m| m.get("decimals"))
            .and_then(Value::as_u64)
    }

    fn lookup(&self, path: &[&str]) -> Option<&str> {
        let (first, rest) = path.split_first()?;
        let mut current = self.details.get(*first)?;
        for key in rest {
            current = current.get(*key)?;
        }
        // On-chain metadata strings are NUL padded
        current
            .as_str()
            .map(|s| s.trim_matches(|c: char| c == '\0' || c.is_whitespace()))
            .filter(|s| !s.is_empty())
    }
}

// ============================================================================
// PART D: Scan Result Schema
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub count: usize,
    pub volume: f64,
}

impl CategoryTotals {
    pub fn record(&mut self, amount: f64) {
        self.count += 1;
        self.volume += amount;
    }
}

/// Per-category aggregates over a set of transfer events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferStats {
    pub native: CategoryTotals,
    /// Keyed by token label
    pub tokens: BTreeMap<String, CategoryTotals>,
}

/// An address whose history could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub address: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Newest first
    pub events: Vec<TransferEvent>,
    pub stats: TransferStats,
    pub fetch_errors: Vec<FetchFailure>,
}
