//! CEI Excel statement parser.
//!
//! InfoCEI workbooks open with a banner block ("Período de 01/01/2019 a
//! 31/12/2019", institution name a few rows below) followed by the
//! negotiation table. Everything is read into untyped rows; typing them is
//! the normalizer's job.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{complete_row, validate_period, CeiStatement};
use crate::normalizer::RawRow;

/// Rows between the period banner and the institution line in CEI exports.
const INSTITUTION_ROW_OFFSET: usize = 4;

/// Column mapping for the CEI negotiation table.
#[derive(Debug, Clone, Default)]
struct ColumnMapping {
    date: Option<usize>,
    ticker: Option<usize>,
    side: Option<usize>,
    quantity: Option<usize>,
    price: Option<usize>,
    total: Option<usize>,
    fees: Option<usize>,
}

impl ColumnMapping {
    fn from_header(header: &[Data]) -> Self {
        let mut mapping = ColumnMapping::default();

        for (idx, cell) in header.iter().enumerate() {
            let text = cell.to_string().to_lowercase();

            if mapping.date.is_none() && text.contains("data") {
                mapping.date = Some(idx);
            }
            if text.contains("código") || text.contains("codigo") || text.contains("ticker") {
                mapping.ticker = Some(idx);
            }
            if text.contains("c/v") {
                mapping.side = Some(idx);
            }
            if text.contains("quantidade") || text.contains("qtd") {
                mapping.quantity = Some(idx);
            }
            if text.contains("preço") || text.contains("preco") {
                mapping.price = Some(idx);
            }
            if text.contains("valor") && text.contains("total") {
                mapping.total = Some(idx);
            }
            if text.contains("taxa") || text.contains("despesa") {
                mapping.fees = Some(idx);
            }
        }

        mapping
    }

    fn is_valid(&self) -> bool {
        self.date.is_some()
            && self.ticker.is_some()
            && self.side.is_some()
            && self.quantity.is_some()
            && (self.price.is_some() || self.total.is_some())
    }
}

/// Parse a CEI Excel statement into untyped rows plus header metadata.
pub fn parse_statement<P: AsRef<Path>>(file_path: P) -> Result<CeiStatement> {
    let path = file_path.as_ref();
    info!("parsing CEI Excel statement: {:?}", path);

    let mut workbook = open_workbook_auto(path).context("failed to open Excel file")?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("no sheets found in workbook"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .context("failed to read worksheet")?;

    let rows: Vec<&[Data]> = range.rows().collect();
    if rows.is_empty() {
        anyhow::bail!("statement file is empty");
    }

    let (year, institution) = read_banner(&rows)?;

    let mut header_idx = None;
    let mut mapping = None;
    for (idx, row) in rows.iter().enumerate() {
        let row_text = row
            .iter()
            .map(|cell| cell.to_string().to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        if row_text.contains("data") && row_text.contains("c/v") {
            let candidate = ColumnMapping::from_header(row);
            if candidate.is_valid() {
                debug!("column mapping: {:?}", candidate);
                header_idx = Some(idx);
                mapping = Some(candidate);
                break;
            }
            warn!("found potential header row but missing required columns");
        }
    }

    let header_idx =
        header_idx.ok_or_else(|| anyhow!("could not find negotiation table header"))?;
    let mapping = mapping.ok_or_else(|| anyhow!("could not map negotiation table columns"))?;

    let mut trade_rows = Vec::new();
    for row in rows.iter().skip(header_idx + 1) {
        if let Some(raw) = extract_row(row, &mapping) {
            trade_rows.push(raw);
        }
    }

    info!("extracted {} trade rows", trade_rows.len());
    Ok(CeiStatement {
        year,
        institution,
        trade_rows,
    })
}

/// Locate the period banner and the institution line below it.
fn read_banner(rows: &[&[Data]]) -> Result<(Option<i32>, Option<String>)> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let text = cell.to_string();
            let Some((start, end)) = split_period(&text) else {
                continue;
            };
            let year = validate_period(start, end)?;

            let institution = rows
                .get(row_idx + INSTITUTION_ROW_OFFSET)
                .and_then(|r| r.get(col_idx))
                .map(|c| c.to_string().trim().to_string())
                .filter(|s| !s.is_empty());

            return Ok((Some(year), institution));
        }
    }
    // Some re-exports strip the banner block; the year can still come from
    // the command line.
    Ok((None, None))
}

/// Split "01/01/2019 a 31/12/2019" into its two dates.
fn split_period(text: &str) -> Option<(&str, &str)> {
    let (start, end) = text.trim().split_once(" a ")?;
    let looks_like_date =
        |s: &str| s.trim().matches('/').count() == 2 && s.trim().len() >= 8;
    (looks_like_date(start) && looks_like_date(end)).then(|| (start.trim(), end.trim()))
}

/// Extract one untyped row; returns None for blank and non-data rows.
fn extract_row(row: &[Data], mapping: &ColumnMapping) -> Option<RawRow> {
    let ticker = row.get(mapping.ticker?)?.to_string().trim().to_string();
    if ticker.is_empty() {
        return None;
    }
    let date = row.get(mapping.date?)?;
    if date.is_empty() {
        return None;
    }

    let mut raw = RawRow::new();
    raw.insert("ticker".to_string(), ticker);
    raw.insert("date".to_string(), cell_to_date_string(date));

    if let Some(cell) = mapping.side.and_then(|i| row.get(i)) {
        raw.insert("side".to_string(), cell.to_string());
    }
    if let Some(cell) = mapping.quantity.and_then(|i| row.get(i)) {
        raw.insert("quantity".to_string(), cell.to_string());
    }
    if let Some(cell) = mapping.price.and_then(|i| row.get(i)) {
        if !cell.is_empty() {
            raw.insert("price".to_string(), cell.to_string());
        }
    }
    if let Some(cell) = mapping.total.and_then(|i| row.get(i)) {
        if !cell.is_empty() {
            raw.insert("total".to_string(), cell.to_string());
        }
    }
    if let Some(cell) = mapping.fees.and_then(|i| row.get(i)) {
        if !cell.is_empty() {
            raw.insert("fees".to_string(), cell.to_string());
        }
    }

    complete_row(&mut raw);
    Some(raw)
}

/// Render a date cell as DD/MM/YYYY regardless of how Excel stored it.
fn cell_to_date_string(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => {
            let days = dt.as_f64().floor() as i64;
            let excel_epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch");
            match excel_epoch.checked_add_signed(chrono::Duration::days(days)) {
                Some(date) => date.format("%d/%m/%Y").to_string(),
                None => cell.to_string(),
            }
        }
        _ => cell.to_string().trim().to_string(),
    }
}
