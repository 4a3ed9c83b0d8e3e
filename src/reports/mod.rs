//! Report aggregator - read-only consolidation of ledgers into a report model
//!
//! Pure function over final lot states, disposal audit trails and month-end
//! snapshots. Currency amounts are truncated to centavos here, at emission
//! time; the ledgers themselves keep full precision throughout the run.

use chrono::Datelike;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::engine::{EngineOutcome, PositionSnapshot};
use crate::ledger::{PositionState, RealizedDisposal};
use crate::utils::round_down_money;

/// Goods-and-rights style view of one asset: what is still held at what cost,
/// plus its realized totals for the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetSummary {
    pub ticker: String,
    pub open_quantity: Decimal,
    pub total_cost: Decimal,
    pub average_unit_cost: Decimal,
    pub total_proceeds: Decimal,
    pub realized_gain_total: Decimal,
    pub realized_loss_total: Decimal,
    pub disposal_count: usize,
}

/// Realized results grouped by calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub proceeds: Decimal,
    pub gains: Decimal,
    pub losses: Decimal,
    pub net: Decimal,
}

/// The full presentation model handed to the report writer.
#[derive(Debug, Serialize)]
pub struct ReportModel {
    pub reference_year: Option<i32>,
    pub institution: Option<String>,
    pub assets: Vec<AssetSummary>,
    pub months: Vec<MonthlySummary>,
    pub month_end: Vec<PositionSnapshot>,
    /// Source rows that could not be normalized, surfaced as messages.
    pub rejected_rows: Vec<String>,
    /// Per-asset processing failures, surfaced as messages.
    pub processing_errors: Vec<String>,
}

/// Consolidate an engine outcome into the report model. No ledger mutation.
pub fn summarize(
    outcome: &EngineOutcome,
    reference_year: Option<i32>,
    institution: Option<String>,
) -> ReportModel {
    let assets = outcome
        .ledgers
        .values()
        .filter(|ledger| {
            ledger.state() == PositionState::Open || !ledger.disposals().is_empty()
        })
        .map(|ledger| {
            let lot = ledger.snapshot();
            let proceeds: Decimal = ledger.disposals().iter().map(|d| d.proceeds).sum();
            AssetSummary {
                ticker: ledger.ticker().to_string(),
                open_quantity: lot.open_quantity,
                total_cost: round_down_money(lot.total_cost),
                average_unit_cost: round_down_money(lot.average_unit_cost),
                total_proceeds: round_down_money(proceeds),
                realized_gain_total: round_down_money(lot.realized_gain_total),
                realized_loss_total: round_down_money(lot.realized_loss_total),
                disposal_count: ledger.disposals().len(),
            }
        })
        .collect();

    let mut disposals: Vec<&RealizedDisposal> = outcome
        .ledgers
        .values()
        .flat_map(|ledger| ledger.disposals())
        .collect();
    disposals.sort_by_key(|d| d.date);

    let months = disposals
        .iter()
        .chunk_by(|d| (d.date.year(), d.date.month()))
        .into_iter()
        .map(|((year, month), group)| {
            let mut proceeds = Decimal::ZERO;
            let mut gains = Decimal::ZERO;
            let mut losses = Decimal::ZERO;
            for disposal in group {
                proceeds += disposal.proceeds;
                if disposal.gain_or_loss >= Decimal::ZERO {
                    gains += disposal.gain_or_loss;
                } else {
                    losses += disposal.gain_or_loss.abs();
                }
            }
            MonthlySummary {
                year,
                month,
                proceeds: round_down_money(proceeds),
                gains: round_down_money(gains),
                losses: round_down_money(losses),
                net: round_down_money(gains - losses),
            }
        })
        .collect();

    ReportModel {
        reference_year,
        institution,
        assets,
        months,
        month_end: outcome.month_end.clone(),
        rejected_rows: Vec::new(),
        processing_errors: outcome.errors.iter().map(|e| e.to_string()).collect(),
    }
}
