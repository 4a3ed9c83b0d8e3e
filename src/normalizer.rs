//! Trade record normalizer - raw statement rows into canonical events
//!
//! Rows arrive as untyped key/value maps with canonical lowercase keys
//! (`ticker`, `date`, `side`, `quantity`, `price`, `fees`; actions carry
//! `kind` plus `ratio`/`quantity`/`price`). Mapping broker-specific column
//! headers onto those keys is the importer's job; this module is a pure
//! translation layer with no side effects.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

use crate::error::LedgerError;
use crate::events::{ActionKind, CorporateAction, TradeEvent, TradeSide};

/// One untyped row as handed over by the ingestion layer.
pub type RawRow = HashMap<String, String>;

/// What to do when a row cannot be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Skip the row, keep the error for reporting. Counts are always surfaced.
    SkipAndReport,
    /// Fail the whole run on the first bad row.
    Abort,
}

/// Result of normalizing a batch of rows.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub trades: Vec<TradeEvent>,
    pub actions: Vec<CorporateAction>,
    /// Rows rejected under `SkipAndReport`, in source order.
    pub rejected: Vec<LedgerError>,
}

/// Normalize one trade row. Pure: exactly one `TradeEvent` or a
/// `MalformedRecord` naming the offending field.
pub fn normalize_trade(row: &RawRow, row_number: usize, seq: usize) -> Result<TradeEvent, LedgerError> {
    let ticker = required(row, "ticker", row_number)?.to_uppercase();
    let date = parse_date(required(row, "date", row_number)?, row_number)?;

    let side_token = required(row, "side", row_number)?;
    let side = TradeSide::parse(side_token).ok_or_else(|| LedgerError::MalformedRecord {
        row: row_number,
        field: "side",
        reason: format!("unknown side token '{}'", side_token.trim()),
    })?;

    let quantity = parse_positive_decimal(row, "quantity", row_number)?;
    let unit_price = parse_non_negative_decimal(row, "price", row_number)?;
    let fees = match row.get("fees") {
        Some(_) => parse_non_negative_decimal(row, "fees", row_number)?,
        None => Decimal::ZERO,
    };

    Ok(TradeEvent {
        ticker,
        date,
        side,
        quantity,
        unit_price,
        fees,
        seq,
    })
}

/// Normalize one corporate-action row. An unrecognized kind token surfaces as
/// `UnknownActionKind` so the caller can skip the action and keep going.
pub fn normalize_action(
    row: &RawRow,
    row_number: usize,
    seq: usize,
) -> Result<CorporateAction, LedgerError> {
    let ticker = required(row, "ticker", row_number)?.to_uppercase();
    let date = parse_date(required(row, "date", row_number)?, row_number)?;
    let kind_token = required(row, "kind", row_number)?.trim().to_uppercase();

    let kind = match kind_token.as_str() {
        "SPLIT" | "DESDOBRAMENTO" | "GRUPAMENTO" => ActionKind::Split {
            ratio: parse_positive_decimal(row, "ratio", row_number)?,
        },
        "BONUS" | "BONIFICACAO" | "BONIFICAÇÃO" => ActionKind::Bonus {
            quantity: parse_positive_decimal(row, "quantity", row_number)?,
        },
        "REINVEST" | "REINVESTIMENTO" => ActionKind::Reinvest {
            quantity: parse_positive_decimal(row, "quantity", row_number)?,
            unit_price: parse_non_negative_decimal(row, "price", row_number)?,
        },
        _ => {
            return Err(LedgerError::UnknownActionKind {
                ticker,
                date,
                kind: kind_token,
            })
        }
    };

    Ok(CorporateAction {
        ticker,
        date,
        kind,
        seq,
    })
}

/// Normalize trade and action rows under the given recovery policy.
///
/// `seq` numbering spans both slices in input order so the timeline tie-break
/// reflects the source file.
pub fn normalize(
    trade_rows: &[RawRow],
    action_rows: &[RawRow],
    policy: RecoveryPolicy,
) -> Result<NormalizedBatch, LedgerError> {
    let mut batch = NormalizedBatch::default();
    let mut seq = 0usize;

    for (idx, row) in trade_rows.iter().enumerate() {
        match normalize_trade(row, idx + 1, seq) {
            Ok(event) => batch.trades.push(event),
            Err(err) => handle_reject(err, policy, &mut batch)?,
        }
        seq += 1;
    }

    for (idx, row) in action_rows.iter().enumerate() {
        match normalize_action(row, idx + 1, seq) {
            Ok(action) => batch.actions.push(action),
            Err(err) => handle_reject(err, policy, &mut batch)?,
        }
        seq += 1;
    }

    Ok(batch)
}

fn handle_reject(
    err: LedgerError,
    policy: RecoveryPolicy,
    batch: &mut NormalizedBatch,
) -> Result<(), LedgerError> {
    match policy {
        RecoveryPolicy::Abort => Err(err),
        RecoveryPolicy::SkipAndReport => {
            warn!("skipping row: {}", err);
            batch.rejected.push(err);
            Ok(())
        }
    }
}

fn required<'a>(row: &'a RawRow, field: &'static str, row_number: usize) -> Result<&'a str, LedgerError> {
    match row.get(field).map(|s| s.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(LedgerError::MalformedRecord {
            row: row_number,
            field,
            reason: "missing required field".to_string(),
        }),
    }
}

/// Parse dates as they show up in CEI exports: DD/MM/YYYY and the short
/// DD/MM/YY variant, plus ISO as produced by re-exports.
fn parse_date(value: &str, row_number: usize) -> Result<NaiveDate, LedgerError> {
    let trimmed = value.trim();
    for format in ["%d/%m/%Y", "%d/%m/%y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(LedgerError::MalformedRecord {
        row: row_number,
        field: "date",
        reason: format!("unparseable date '{}'", trimmed),
    })
}

/// Parse a decimal accepting both Brazilian ("1.234,56") and plain ("1234.56")
/// notation.
pub fn parse_decimal_br(value: &str) -> Option<Decimal> {
    let cleaned = value.trim().replace("R$", "").replace(' ', "");
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.contains(',') {
        // Periods are thousands separators in Brazilian notation.
        let normalized = cleaned.replace('.', "").replace(',', ".");
        Decimal::from_str(&normalized).ok()
    } else {
        Decimal::from_str(&cleaned).ok()
    }
}

fn parse_field_decimal(
    row: &RawRow,
    field: &'static str,
    row_number: usize,
) -> Result<Decimal, LedgerError> {
    let value = required(row, field, row_number)?;
    parse_decimal_br(value).ok_or_else(|| LedgerError::MalformedRecord {
        row: row_number,
        field,
        reason: format!("not a number: '{}'", value.trim()),
    })
}

fn parse_positive_decimal(
    row: &RawRow,
    field: &'static str,
    row_number: usize,
) -> Result<Decimal, LedgerError> {
    let value = parse_field_decimal(row, field, row_number)?;
    if value <= Decimal::ZERO {
        return Err(LedgerError::MalformedRecord {
            row: row_number,
            field,
            reason: format!("must be greater than zero, got {}", value),
        });
    }
    Ok(value)
}

fn parse_non_negative_decimal(
    row: &RawRow,
    field: &'static str,
    row_number: usize,
) -> Result<Decimal, LedgerError> {
    let value = parse_field_decimal(row, field, row_number)?;
    if value < Decimal::ZERO {
        return Err(LedgerError::MalformedRecord {
            row: row_number,
            field,
            reason: format!("cannot be negative, got {}", value),
        });
    }
    Ok(value)
}
