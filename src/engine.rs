//! Run orchestrator: feeds the merged event timeline into per-asset ledgers.
//!
//! Assets are independent; each ledger owns only its own lot state. A failed
//! sale poisons just that asset (its later events are dropped), a failed
//! corporate action drops just that action. All errors are collected and
//! surfaced, never swallowed.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::events::{build_timeline, CorporateAction, LedgerEvent, TradeEvent};
use crate::ledger::{actions, Ledger, LotState, PositionState};

/// Lot state of one asset as of the end of a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSnapshot {
    pub ticker: String,
    pub year: i32,
    pub month: u32,
    pub lot: LotState,
}

/// Everything a single run produces, keyed deterministically by ticker.
#[derive(Debug, Default)]
pub struct EngineOutcome {
    pub ledgers: BTreeMap<String, Ledger>,
    /// Open positions captured at every month boundary the timeline crosses.
    pub month_end: Vec<PositionSnapshot>,
    /// Per-asset failures; the assets they name stopped processing early.
    pub errors: Vec<LedgerError>,
}

/// Process all events sequentially in chronological order.
pub fn process(trades: Vec<TradeEvent>, actions_input: Vec<CorporateAction>) -> EngineOutcome {
    let timeline = build_timeline(trades, actions_input);
    info!("processing {} events", timeline.len());

    let mut outcome = EngineOutcome::default();
    let mut poisoned: BTreeSet<String> = BTreeSet::new();
    let mut current_month: Option<(i32, u32)> = None;

    for event in &timeline {
        let month = (event.date().year(), event.date().month());
        if let Some(mut cursor) = current_month {
            // Capture every month boundary crossed, including gap months
            // where an open position simply carried over.
            while cursor < month {
                record_month_end(&outcome.ledgers, cursor, &mut outcome.month_end);
                cursor = next_month(cursor);
            }
        }
        current_month = Some(month);

        let ticker = event.ticker();
        if poisoned.contains(ticker) {
            continue;
        }
        let ledger = outcome
            .ledgers
            .entry(ticker.to_string())
            .or_insert_with(|| Ledger::new(ticker));

        match event {
            LedgerEvent::Trade(trade) => {
                if let Err(err) = ledger.apply(trade) {
                    warn!("{}; dropping later events for this asset", err);
                    poisoned.insert(ticker.to_string());
                    outcome.errors.push(err);
                }
            }
            LedgerEvent::Action(action) => {
                if let Err(err) = actions::apply(ledger, action) {
                    warn!("{}; action skipped", err);
                    outcome.errors.push(err);
                }
            }
        }
    }

    if let Some(cursor) = current_month {
        record_month_end(&outcome.ledgers, cursor, &mut outcome.month_end);
    }

    outcome
}

fn record_month_end(
    ledgers: &BTreeMap<String, Ledger>,
    (year, month): (i32, u32),
    out: &mut Vec<PositionSnapshot>,
) {
    for ledger in ledgers.values() {
        if ledger.state() == PositionState::Open {
            out.push(PositionSnapshot {
                ticker: ledger.ticker().to_string(),
                year,
                month,
                lot: ledger.snapshot(),
            });
        }
    }
}

fn next_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}
