//! Corporate-action list parser.
//!
//! CEI statements do not carry splits, bonuses or reinvestments, so they are
//! supplied alongside the statement as a small semicolon CSV:
//!
//! ```text
//! ticker;date;kind;ratio;quantity;price
//! ITSA4;15/05/2019;desdobramento;2;;
//! ITSA4;20/06/2019;bonificacao;;10;
//! HGLG11;30/07/2019;reinvestimento;;3;162,50
//! ```

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::info;

use crate::normalizer::RawRow;

/// Canonical key for each recognized header spelling.
fn canonical_key(header: &str) -> Option<&'static str> {
    let text = header.trim().to_lowercase();
    match text.as_str() {
        "ticker" | "código" | "codigo" => Some("ticker"),
        "date" | "data" => Some("date"),
        "kind" | "evento" | "tipo" => Some("kind"),
        "ratio" | "razão" | "razao" | "proporção" | "proporcao" => Some("ratio"),
        "quantity" | "quantidade" => Some("quantity"),
        "price" | "preço" | "preco" => Some("price"),
        _ => None,
    }
}

/// Parse a corporate-action CSV into untyped rows.
pub fn parse_actions(path: &Path) -> Result<Vec<RawRow>> {
    info!("parsing corporate actions: {:?}", path);

    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .context("failed to open actions file")?;

    let headers = reader
        .headers()
        .context("failed to read actions headers")?
        .clone();

    let keys: Vec<Option<&'static str>> = headers.iter().map(canonical_key).collect();
    if !keys.contains(&Some("ticker")) || !keys.contains(&Some("kind")) {
        return Err(anyhow!(
            "actions file must have at least ticker and kind columns"
        ));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context("failed to read actions record")?;

        let mut raw = RawRow::new();
        for (idx, key) in keys.iter().enumerate() {
            if let (Some(key), Some(value)) = (key, record.get(idx)) {
                if !value.trim().is_empty() {
                    raw.insert(key.to_string(), value.to_string());
                }
            }
        }
        if !raw.is_empty() {
            rows.push(raw);
        }
    }

    info!("extracted {} action rows", rows.len());
    Ok(rows)
}
