//! Transfer extraction.
//!
//! Turns one enhanced transaction into the SOL and SPL token transfers that
//! moved directly between the two scanned addresses, in either direction.
//! Each transfer sub-record is parsed on its own; a malformed one is dropped
//! without affecting its siblings.

use crate::address::Address;
use crate::schemas::{
    NativeTransferRaw, TokenTransferRaw, TransactionRecord, TransferEvent, TransferKind,
    LAMPORTS_PER_SOL, UNKNOWN_SIGNATURE, UNKNOWN_TOKEN_LABEL,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
#[error("malformed {kind} transfer #{index}: {reason}")]
pub struct MalformedTransfer {
    pub kind: TransferKind,
    pub index: usize,
    pub reason: String,
}

/// Extract every transfer in `tx` between `addr1` and `addr2`.
pub fn extract_transfers(
    tx: &TransactionRecord,
    addr1: &Address,
    addr2: &Address,
) -> Vec<TransferEvent> {
    let timestamp = tx.timestamp.unwrap_or(0);
    let signature = tx.signature.as_deref().unwrap_or(UNKNOWN_SIGNATURE);

    let native = tx
        .native_transfers
        .iter()
        .flatten()
        .enumerate()
        .map(|(index, raw)| parse_native(index, raw));

    let token = tx
        .token_transfers
        .iter()
        .flatten()
        .enumerate()
        .map(|(index, raw)| parse_token(index, raw));

    native
        .chain(token)
        .filter_map(|parsed| match parsed {
            Ok(leg) => Some(leg),
            Err(e) => {
                debug!("Skipping transfer in transaction {}: {}", signature, e);
                None
            }
        })
        .filter(|leg| is_between(leg.from.as_deref(), leg.to.as_deref(), addr1, addr2))
        .map(|leg| TransferEvent {
            kind: leg.kind,
            amount: leg.amount,
            from: leg.from.unwrap_or_default(),
            to: leg.to.unwrap_or_default(),
            timestamp,
            signature: signature.to_string(),
            token_label: leg.token_label,
        })
        .collect()
}

/// Whether `(from, to)` is `(addr1, addr2)` or `(addr2, addr1)`.
fn is_between(from: Option<&str>, to: Option<&str>, addr1: &Address, addr2: &Address) -> bool {
    (addr1.matches(from) && addr2.matches(to)) || (addr2.matches(from) && addr1.matches(to))
}

/// A parsed sub-record before the transaction-level fields are attached
struct Leg {
    kind: TransferKind,
    amount: f64,
    from: Option<String>,
    to: Option<String>,
    token_label: Option<String>,
}

fn parse_native(index: usize, raw: &Value) -> Result<Leg, MalformedTransfer> {
    let transfer = NativeTransferRaw::deserialize(raw).map_err(|e| MalformedTransfer {
        kind: TransferKind::Native,
        index,
        reason: e.to_string(),
    })?;

    Ok(Leg {
        kind: TransferKind::Native,
        amount: transfer.amount as f64 / LAMPORTS_PER_SOL,
        from: transfer.from,
        to: transfer.to,
        token_label: None,
    })
}

fn parse_token(index: usize, raw: &Value) -> Result<Leg, MalformedTransfer> {
    let malformed = |reason: String| MalformedTransfer {
        kind: TransferKind::Token,
        index,
        reason,
    };

    let transfer = TokenTransferRaw::deserialize(raw).map_err(|e| malformed(e.to_string()))?;

    let raw_amount = match &transfer.token_amount {
        Some(amount) => amount.to_f64().map_err(malformed)?,
        None => 0.0,
    };
    let decimals = transfer.decimals.unwrap_or(0);
    let scale = 10f64.powi(i32::try_from(decimals).map_err(|e| malformed(e.to_string()))?);

    Ok(Leg {
        kind: TransferKind::Token,
        amount: raw_amount / scale,
        from: transfer.from,
        to: transfer.to,
        token_label: Some(
            transfer
                .token_standard
                .unwrap_or_else(|| UNKNOWN_TOKEN_LABEL.to_string()),
        ),
    })
}
