//! Canonical event types and the merged processing timeline.
//!
//! The ledger consumes a single stream sorted by date. Within a day, corporate
//! actions apply before trades: splits and bonuses are record-date effective
//! before intraday trading is recognized. Remaining ties fall back to source
//! order, which the stable sort preserves.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Buy/sell side of a trade, normalized from the statement's C/V column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Parse a side token as it appears in CEI exports (" C ", "V", "COMPRA"...)
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_uppercase().as_str() {
            "C" | "COMPRA" | "BUY" => Some(TradeSide::Buy),
            "V" | "VENDA" | "SELL" => Some(TradeSide::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "C",
            TradeSide::Sell => "V",
        }
    }
}

/// A normalized market trade. Immutable once produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeEvent {
    pub ticker: String,
    pub date: NaiveDate,
    pub side: TradeSide,
    /// Always positive; the side carries the direction.
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub fees: Decimal,
    /// Position in the source file, tie-break within a day.
    pub seq: usize,
}

/// Corporate action kind with its payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ActionKind {
    /// Ratio of new shares per old share (2 for a 1:2 split, 0.1 for a 10:1
    /// reverse split). Total cost basis is preserved.
    Split { ratio: Decimal },
    /// Extra shares credited for free, diluting the average cost.
    Bonus { quantity: Decimal },
    /// Dividend reinvestment: an implicit purchase at the given price.
    Reinvest { quantity: Decimal, unit_price: Decimal },
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Split { .. } => "split",
            ActionKind::Bonus { .. } => "bonus",
            ActionKind::Reinvest { .. } => "reinvest",
        }
    }
}

/// A normalized corporate action. Immutable once produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorporateAction {
    pub ticker: String,
    pub date: NaiveDate,
    pub kind: ActionKind,
    pub seq: usize,
}

/// A single entry of the merged processing timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    Action(CorporateAction),
    Trade(TradeEvent),
}

impl LedgerEvent {
    pub fn ticker(&self) -> &str {
        match self {
            LedgerEvent::Action(a) => &a.ticker,
            LedgerEvent::Trade(t) => &t.ticker,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            LedgerEvent::Action(a) => a.date,
            LedgerEvent::Trade(t) => t.date,
        }
    }

    /// Actions sort before trades dated the same day.
    fn class_rank(&self) -> u8 {
        match self {
            LedgerEvent::Action(_) => 0,
            LedgerEvent::Trade(_) => 1,
        }
    }

    fn seq(&self) -> usize {
        match self {
            LedgerEvent::Action(a) => a.seq,
            LedgerEvent::Trade(t) => t.seq,
        }
    }
}

/// Merge trades and corporate actions into one chronologically ordered stream.
pub fn build_timeline(
    trades: Vec<TradeEvent>,
    actions: Vec<CorporateAction>,
) -> Vec<LedgerEvent> {
    let mut events: Vec<LedgerEvent> = actions
        .into_iter()
        .map(LedgerEvent::Action)
        .chain(trades.into_iter().map(LedgerEvent::Trade))
        .collect();

    events.sort_by_key(|e| (e.date(), e.class_rank(), e.seq()));
    events
}
