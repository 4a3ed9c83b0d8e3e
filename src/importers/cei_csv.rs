//! CEI CSV statement parser.
//!
//! Semicolon-separated re-exports of the negotiation table. These carry no
//! period/institution banner, so the reference year has to come from the
//! command line (or be absent in the report).

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info};

use super::{complete_row, CeiStatement};
use crate::normalizer::RawRow;

#[derive(Debug)]
struct CsvColumnMapping {
    date: usize,
    ticker: usize,
    side: usize,
    quantity: usize,
    price: Option<usize>,
    total: Option<usize>,
    fees: Option<usize>,
}

/// Parse a semicolon CSV statement into untyped rows.
pub fn parse_statement<P: AsRef<Path>>(file_path: P) -> Result<CeiStatement> {
    let path = file_path.as_ref();
    info!("parsing CEI CSV statement: {:?}", path);

    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .context("failed to open CSV file")?;

    let headers = reader
        .headers()
        .context("failed to read CSV headers")?
        .clone();
    debug!("CSV headers: {:?}", headers);

    let mapping = find_columns(&headers)?;

    let mut trade_rows = Vec::new();
    for result in reader.records() {
        let record = result.context("failed to read CSV record")?;

        let ticker = record.get(mapping.ticker).unwrap_or("").trim();
        if ticker.is_empty() {
            continue;
        }

        let mut raw = RawRow::new();
        raw.insert("ticker".to_string(), ticker.to_string());
        insert(&mut raw, "date", record.get(mapping.date));
        insert(&mut raw, "side", record.get(mapping.side));
        insert(&mut raw, "quantity", record.get(mapping.quantity));
        insert(&mut raw, "price", mapping.price.and_then(|i| record.get(i)));
        insert(&mut raw, "total", mapping.total.and_then(|i| record.get(i)));
        insert(&mut raw, "fees", mapping.fees.and_then(|i| record.get(i)));

        complete_row(&mut raw);
        trade_rows.push(raw);
    }

    info!("extracted {} trade rows from CSV", trade_rows.len());
    Ok(CeiStatement {
        year: None,
        institution: None,
        trade_rows,
    })
}

fn insert(raw: &mut RawRow, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            raw.insert(key.to_string(), value.to_string());
        }
    }
}

fn find_columns(headers: &csv::StringRecord) -> Result<CsvColumnMapping> {
    let mut date = None;
    let mut ticker = None;
    let mut side = None;
    let mut quantity = None;
    let mut price = None;
    let mut total = None;
    let mut fees = None;

    for (idx, header) in headers.iter().enumerate() {
        let text = header.to_lowercase();
        if date.is_none() && text.contains("data") {
            date = Some(idx);
        }
        if text.contains("código") || text.contains("codigo") || text.contains("ticker") {
            ticker = Some(idx);
        }
        if text.contains("c/v") || text == "side" {
            side = Some(idx);
        }
        if text.contains("quantidade") || text.contains("qtd") {
            quantity = Some(idx);
        }
        if text.contains("preço") || text.contains("preco") {
            price = Some(idx);
        }
        if text.contains("valor") && text.contains("total") {
            total = Some(idx);
        }
        if text.contains("taxa") || text.contains("despesa") {
            fees = Some(idx);
        }
    }

    Ok(CsvColumnMapping {
        date: date.ok_or_else(|| anyhow!("CSV is missing a date column"))?,
        ticker: ticker.ok_or_else(|| anyhow!("CSV is missing a ticker column"))?,
        side: side.ok_or_else(|| anyhow!("CSV is missing a C/V column"))?,
        quantity: quantity.ok_or_else(|| anyhow!("CSV is missing a quantity column"))?,
        price,
        total,
        fees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_csv_statement() {
        let file = write_csv(
            "Data Negócio;C/V;Código;Quantidade;Valor Total (R$)\n\
             10/10/2019;C;BOVA11;10;935,00\n\
             12/11/2019;V;PETR4;100;3050,00\n",
        );

        let statement = parse_statement(file.path()).unwrap();
        assert_eq!(statement.year, None);
        assert_eq!(statement.trade_rows.len(), 2);

        let first = &statement.trade_rows[0];
        assert_eq!(first.get("ticker").unwrap(), "BOVA11");
        assert_eq!(first.get("side").unwrap(), "C");
        // Derived from the total: 935 / 10
        assert_eq!(first.get("price").unwrap(), "93.5");
        // B3 fees reconstituted at 2019 rates
        assert_eq!(first.get("fees").unwrap(), "0.28");
    }

    #[test]
    fn test_blank_ticker_rows_are_skipped() {
        let file = write_csv(
            "Data Negócio;C/V;Código;Quantidade;Valor Total (R$)\n\
             10/10/2019;C;BOVA11;10;935,00\n\
             ;;;;\n",
        );
        let statement = parse_statement(file.path()).unwrap();
        assert_eq!(statement.trade_rows.len(), 1);
    }

    #[test]
    fn test_missing_required_column_fails() {
        let file = write_csv("Data Negócio;C/V;Quantidade\n10/10/2019;C;10\n");
        assert!(parse_statement(file.path()).is_err());
    }
}
