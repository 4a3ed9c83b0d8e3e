//! Cost-basis ledger - average-cost accounting state machine
//!
//! One ledger per asset, fed trade events in chronological order. Acquisitions
//! fold fees into a weighted-average unit cost; disposals consume cost basis at
//! that average and never alter it. That recurrence is what distinguishes the
//! average-cost method from FIFO/LIFO lot matching.

pub mod actions;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::LedgerError;
use crate::events::{TradeEvent, TradeSide};

/// Position lifecycle state. A ledger cycles OPEN -> EMPTY -> OPEN freely as
/// the asset is fully sold and repurchased within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Empty,
    Open,
}

/// Aggregate open position for one asset.
///
/// Invariant: `open_quantity * average_unit_cost` reconciles with `total_cost`
/// within currency rounding tolerance (two decimal places).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LotState {
    pub open_quantity: Decimal,
    /// Kept at full decimal precision; rounding to centavos happens only at
    /// report emission, never inside the running average.
    pub average_unit_cost: Decimal,
    pub total_cost: Decimal,
    pub realized_gain_total: Decimal,
    pub realized_loss_total: Decimal,
}

impl LotState {
    pub fn state(&self) -> PositionState {
        if self.open_quantity > Decimal::ZERO {
            PositionState::Open
        } else {
            PositionState::Empty
        }
    }
}

/// Audit record produced by a sale. Append-only, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealizedDisposal {
    pub ticker: String,
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub proceeds: Decimal,
    pub cost_basis_consumed: Decimal,
    pub gain_or_loss: Decimal,
}

/// Average-cost ledger for a single asset.
#[derive(Debug, Clone)]
pub struct Ledger {
    ticker: String,
    lot: LotState,
    disposals: Vec<RealizedDisposal>,
}

impl Ledger {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            lot: LotState::default(),
            disposals: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn state(&self) -> PositionState {
        self.lot.state()
    }

    /// Current lot state without mutation. Callable at any point, including
    /// mid-run for month-end reporting.
    pub fn snapshot(&self) -> LotState {
        self.lot.clone()
    }

    /// Audit trail of every sale applied to this ledger, in order.
    pub fn disposals(&self) -> &[RealizedDisposal] {
        &self.disposals
    }

    /// Apply one trade event. Atomic: on error the lot state is untouched.
    pub fn apply(&mut self, event: &TradeEvent) -> Result<(), LedgerError> {
        match event.side {
            TradeSide::Buy => {
                self.acquire(event.quantity, event.unit_price, event.fees);
                Ok(())
            }
            TradeSide::Sell => self.dispose(event),
        }
    }

    /// Fold an acquisition into the weighted average. Also the landing point
    /// for dividend reinvestment, which is an implicit purchase.
    pub(crate) fn acquire(&mut self, quantity: Decimal, unit_price: Decimal, fees: Decimal) {
        self.lot.total_cost += quantity * unit_price + fees;
        self.lot.open_quantity += quantity;
        self.lot.average_unit_cost = self.lot.total_cost / self.lot.open_quantity;
    }

    fn dispose(&mut self, event: &TradeEvent) -> Result<(), LedgerError> {
        if event.quantity > self.lot.open_quantity {
            return Err(LedgerError::InsufficientPosition {
                ticker: self.ticker.clone(),
                date: event.date,
                requested: event.quantity,
                available: self.lot.open_quantity,
            });
        }

        let cost_basis_consumed = event.quantity * self.lot.average_unit_cost;
        let proceeds = event.quantity * event.unit_price - event.fees;
        let gain_or_loss = proceeds - cost_basis_consumed;

        self.lot.open_quantity -= event.quantity;
        self.lot.total_cost -= cost_basis_consumed;
        if self.lot.open_quantity.is_zero() {
            // Full disposal: drop the sub-centavo residue left by the division
            // so a reopened position starts from a clean slate.
            self.lot.total_cost = Decimal::ZERO;
        }

        if gain_or_loss >= Decimal::ZERO {
            self.lot.realized_gain_total += gain_or_loss;
        } else {
            self.lot.realized_loss_total += gain_or_loss.abs();
        }

        self.disposals.push(RealizedDisposal {
            ticker: self.ticker.clone(),
            date: event.date,
            quantity: event.quantity,
            proceeds,
            cost_basis_consumed,
            gain_or_loss,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn buy(day: u32, qty: i64, price: i64) -> TradeEvent {
        TradeEvent {
            ticker: "PETR4".to_string(),
            date: NaiveDate::from_ymd_opt(2019, 5, day).unwrap(),
            side: TradeSide::Buy,
            quantity: Decimal::from(qty),
            unit_price: Decimal::from(price),
            fees: Decimal::ZERO,
            seq: 0,
        }
    }

    fn sell(day: u32, qty: i64, price: i64) -> TradeEvent {
        TradeEvent {
            side: TradeSide::Sell,
            ..buy(day, qty, price)
        }
    }

    #[test]
    fn test_first_buy_opens_position() {
        let mut ledger = Ledger::new("PETR4");
        assert_eq!(ledger.state(), PositionState::Empty);

        ledger.apply(&buy(10, 100, 10)).unwrap();
        assert_eq!(ledger.state(), PositionState::Open);

        let lot = ledger.snapshot();
        assert_eq!(lot.open_quantity, dec!(100));
        assert_eq!(lot.average_unit_cost, dec!(10));
        assert_eq!(lot.total_cost, dec!(1000));
    }

    #[test]
    fn test_weighted_average_across_buys() {
        let mut ledger = Ledger::new("PETR4");
        ledger.apply(&buy(10, 10, 100)).unwrap();
        ledger.apply(&buy(11, 10, 200)).unwrap();

        let lot = ledger.snapshot();
        assert_eq!(lot.open_quantity, dec!(20));
        assert_eq!(lot.average_unit_cost, dec!(150));
    }

    #[test]
    fn test_buy_fees_enter_cost_basis() {
        let mut ledger = Ledger::new("PETR4");
        let mut event = buy(10, 100, 10);
        event.fees = dec!(5);
        ledger.apply(&event).unwrap();

        let lot = ledger.snapshot();
        assert_eq!(lot.total_cost, dec!(1005));
        assert_eq!(lot.average_unit_cost, dec!(10.05));
    }

    #[test]
    fn test_sell_realizes_gain_and_keeps_average() {
        let mut ledger = Ledger::new("PETR4");
        ledger.apply(&buy(10, 10, 100)).unwrap();
        ledger.apply(&buy(11, 10, 200)).unwrap();
        ledger.apply(&sell(12, 5, 180)).unwrap();

        let lot = ledger.snapshot();
        assert_eq!(lot.open_quantity, dec!(15));
        assert_eq!(lot.average_unit_cost, dec!(150), "average must not move on disposal");
        assert_eq!(lot.realized_gain_total, dec!(150));

        let disposal = &ledger.disposals()[0];
        assert_eq!(disposal.cost_basis_consumed, dec!(750));
        assert_eq!(disposal.proceeds, dec!(900));
        assert_eq!(disposal.gain_or_loss, dec!(150));
    }

    #[test]
    fn test_sell_fees_reduce_proceeds() {
        let mut ledger = Ledger::new("PETR4");
        ledger.apply(&buy(10, 100, 10)).unwrap();
        let mut event = sell(11, 40, 12);
        event.fees = dec!(5);
        ledger.apply(&event).unwrap();

        let disposal = &ledger.disposals()[0];
        assert_eq!(disposal.proceeds, dec!(475));
        assert_eq!(disposal.gain_or_loss, dec!(75));
    }

    #[test]
    fn test_loss_accumulates_separately() {
        let mut ledger = Ledger::new("PETR4");
        ledger.apply(&buy(10, 100, 10)).unwrap();
        ledger.apply(&sell(11, 50, 8)).unwrap();

        let lot = ledger.snapshot();
        assert_eq!(lot.realized_gain_total, Decimal::ZERO);
        assert_eq!(lot.realized_loss_total, dec!(100));
    }

    #[test]
    fn test_oversell_fails_and_leaves_state_unchanged() {
        let mut ledger = Ledger::new("PETR4");
        ledger.apply(&buy(10, 10, 10)).unwrap();
        let before = ledger.snapshot();

        let err = ledger.apply(&sell(11, 20, 12)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientPosition { .. }));
        assert_eq!(ledger.snapshot(), before);
        assert!(ledger.disposals().is_empty());
    }

    #[test]
    fn test_full_disposal_returns_to_empty_and_reopens() {
        let mut ledger = Ledger::new("PETR4");
        ledger.apply(&buy(10, 10, 10)).unwrap();
        ledger.apply(&sell(11, 10, 12)).unwrap();
        assert_eq!(ledger.state(), PositionState::Empty);
        assert_eq!(ledger.snapshot().total_cost, Decimal::ZERO);

        ledger.apply(&buy(12, 30, 7)).unwrap();
        assert_eq!(ledger.state(), PositionState::Open);
        assert_eq!(ledger.snapshot().average_unit_cost, dec!(7));
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut ledger = Ledger::new("PETR4");
        ledger.apply(&buy(10, 7, 13)).unwrap();
        assert_eq!(ledger.snapshot(), ledger.snapshot());
    }

    #[test]
    fn test_closed_asset_cost_basis_round_trip() {
        let mut ledger = Ledger::new("PETR4");
        ledger.apply(&buy(1, 7, 11)).unwrap();
        ledger.apply(&buy(2, 13, 17)).unwrap();
        ledger.apply(&sell(3, 5, 20)).unwrap();
        ledger.apply(&buy(4, 3, 9)).unwrap();
        ledger.apply(&sell(5, 18, 15)).unwrap();
        assert_eq!(ledger.state(), PositionState::Empty);

        let total_acquired = dec!(7) * dec!(11) + dec!(13) * dec!(17) + dec!(3) * dec!(9);
        let consumed: Decimal = ledger
            .disposals()
            .iter()
            .map(|d| d.cost_basis_consumed)
            .sum();
        assert!((consumed - total_acquired).abs() < dec!(0.01));
    }
}
