//! Transfer aggregation and reporting.
//!
//! Accumulates count/volume per category (SOL, and SPL per token label) and
//! renders the human-readable scan report.

use crate::schemas::{ScanResult, TransferEvent, TransferKind, TransferStats, UNKNOWN_TOKEN_LABEL};
use chrono::DateTime;
use std::io::{self, Write};

const SEPARATOR: &str = "--------------------------------------------------";

/// Aggregate transfers into per-category totals
pub fn summarize(events: &[TransferEvent]) -> TransferStats {
    let mut stats = TransferStats::default();

    for event in events {
        match event.kind {
            TransferKind::Native => stats.native.record(event.amount),
            TransferKind::Token => {
                let label = event
                    .token_label
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_TOKEN_LABEL.to_string());
                stats.tokens.entry(label).or_default().record(event.amount);
            }
        }
    }

    stats
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Write the per-transfer listing followed by the summary block.
pub fn render_report<W: Write>(result: &ScanResult, out: &mut W) -> io::Result<()> {
    writeln!(out, "Found {} transfers between addresses:", result.events.len())?;
    writeln!(out, "{}", SEPARATOR)?;

    for (i, transfer) in result.events.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "Transfer {}:", i + 1)?;
        writeln!(out, "Date: {}", format_timestamp(transfer.timestamp))?;
        match &transfer.token_label {
            Some(label) => writeln!(out, "Type: {} ({})", transfer.kind, label)?,
            None => writeln!(out, "Type: {}", transfer.kind)?,
        }
        writeln!(out, "Amount: {}", transfer.amount)?;
        writeln!(out, "From: {}", transfer.from)?;
        writeln!(out, "To: {}", transfer.to)?;
        writeln!(out, "Signature: {}", transfer.signature)?;
        writeln!(out, "{}", SEPARATOR)?;
    }

    let stats = &result.stats;
    writeln!(out)?;
    writeln!(out, "Transaction Summary:")?;
    writeln!(out, "SOL Transfers:")?;
    writeln!(out, "  Count: {}", stats.native.count)?;
    writeln!(out, "  Volume: {:.4} SOL", stats.native.volume)?;

    if !stats.tokens.is_empty() {
        writeln!(out)?;
        writeln!(out, "SPL Token Transfers:")?;
        for (label, totals) in &stats.tokens {
            writeln!(out)?;
            writeln!(out, "{}:", label)?;
            writeln!(out, "  Count: {}", totals.count)?;
            writeln!(out, "  Volume: {:.4}", totals.volume)?;
        }
    }

    if !result.fetch_errors.is_empty() {
        writeln!(out)?;
        writeln!(out, "Incomplete history (fetch failed):")?;
        for failure in &result.fetch_errors {
            writeln!(out, "  {}: {}", failure.address, failure.error)?;
        }
    }

    Ok(())
}
