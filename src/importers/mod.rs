// Import module - CEI statement readers (Excel and CSV) and action lists

pub mod actions_csv;
pub mod cei_csv;
pub mod cei_excel;

use anyhow::{anyhow, bail, Result};
use chrono::{Datelike, NaiveDate};
use std::path::Path;
use tracing::info;

use crate::b3;
use crate::normalizer::{parse_decimal_br, RawRow};

/// A brokerage statement reduced to untyped rows plus the header metadata the
/// file carries (Excel exports have a period/institution banner, CSV re-exports
/// do not).
#[derive(Debug)]
pub struct CeiStatement {
    pub year: Option<i32>,
    pub institution: Option<String>,
    pub trade_rows: Vec<RawRow>,
}

/// Import a CEI statement, dispatching on the file extension.
pub fn import_statement<P: AsRef<Path>>(path: P) -> Result<CeiStatement> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("file has no extension: {:?}", path))?
        .to_lowercase();

    info!("importing CEI statement: {:?} (type: {})", path, extension);

    match extension.as_str() {
        "xls" | "xlsx" => cei_excel::parse_statement(path),
        "csv" | "txt" => cei_csv::parse_statement(path),
        _ => bail!(
            "unsupported file format: {}. Supported formats: .xls, .xlsx, .csv",
            extension
        ),
    }
}

/// Import a corporate-action list (semicolon CSV).
pub fn import_actions<P: AsRef<Path>>(path: P) -> Result<Vec<RawRow>> {
    actions_csv::parse_actions(path.as_ref())
}

/// Validate the statement period and return the reference year.
///
/// A statement must cover exactly one full calendar year (01/01 to 31/12 of
/// the same year); anything else cannot feed an annual report.
pub fn validate_period(start: &str, end: &str) -> Result<i32> {
    let start_date = NaiveDate::parse_from_str(start.trim(), "%d/%m/%Y")
        .map_err(|_| anyhow!("unparseable period start '{}'", start.trim()))?;
    let end_date = NaiveDate::parse_from_str(end.trim(), "%d/%m/%Y")
        .map_err(|_| anyhow!("unparseable period end '{}'", end.trim()))?;

    if start_date.year() != end_date.year() {
        bail!(
            "statement spans more than one year ({} to {})",
            start_date.year(),
            end_date.year()
        );
    }
    if (start_date.day(), start_date.month()) != (1, 1)
        || (end_date.day(), end_date.month()) != (31, 12)
    {
        bail!("statement must cover a full calendar year, got {} to {}", start, end);
    }

    Ok(start_date.year())
}

/// Fill in derived fields the statement does not carry: the unit price when
/// only a gross total is present, and the B3 negotiation fees.
pub(crate) fn complete_row(row: &mut RawRow) {
    let quantity = row.get("quantity").and_then(|v| parse_decimal_br(v));
    let total = row.get("total").and_then(|v| parse_decimal_br(v));

    if !row.contains_key("price") {
        if let (Some(qty), Some(total)) = (quantity, total) {
            if !qty.is_zero() {
                row.insert("price".to_string(), (total / qty).to_string());
            }
        }
    }

    if !row.contains_key("fees") {
        let date = row
            .get("date")
            .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%d/%m/%Y").ok());
        if let (Some(date), Some(total)) = (date, total) {
            row.insert(
                "fees".to_string(),
                b3::negotiation_fees(date, total).to_string(),
            );
        }
    }
}
