//! B3 negotiation fee schedule.
//!
//! CEI negotiation statements carry gross trade values only; settlement
//! (liquidação) and emoluments charges have to be reconstituted from the
//! exchange's published rates before they can enter the cost basis. Each fee
//! is truncated to centavos on its own, matching how the exchange bills them.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::utils::round_down_money;

/// Settlement (liquidação) rate for swing-trade equity transactions: 0.0275%.
const SETTLEMENT_RATE: Decimal = Decimal::from_parts(275, 0, 0, false, 6);

/// Emoluments rate charged on top of settlement, by year. Only years covered
/// by the supported statements are tabled; anything else falls back to the
/// most recent published rate.
fn emoluments_rate(date: NaiveDate) -> Decimal {
    match date.year() {
        2019 => Decimal::from_parts(4105, 0, 0, false, 8), // 0.004105%
        _ => Decimal::from_parts(5, 0, 0, false, 5),       // 0.005%
    }
}

/// Settlement fee on a gross trade value, truncated to centavos.
pub fn settlement_fee(total: Decimal) -> Decimal {
    round_down_money(total * SETTLEMENT_RATE)
}

/// Emoluments fee on a gross trade value at the given trade date.
pub fn emoluments_fee(date: NaiveDate, total: Decimal) -> Decimal {
    round_down_money(total * emoluments_rate(date))
}

/// Combined negotiation fees for one trade.
pub fn negotiation_fees(date: NaiveDate, total: Decimal) -> Decimal {
    settlement_fee(total) + emoluments_fee(date, total)
}
