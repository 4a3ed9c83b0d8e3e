// Corporate-action adjuster - split/bonus/reinvestment applied to a lot

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::LedgerError;
use crate::events::{ActionKind, CorporateAction};
use crate::ledger::{Ledger, PositionState};

/// Apply a corporate action to a ledger's lot state.
///
/// Actions are quantity/price adjustments, not market trades: splits and
/// bonuses rescale the open lot without touching total cost, reinvestment
/// delegates to the acquisition path. Same-day ordering relative to trades is
/// decided upstream when the timeline is built (actions first).
///
/// Atomic: on error the lot state is untouched.
pub fn apply(ledger: &mut Ledger, action: &CorporateAction) -> Result<(), LedgerError> {
    debug!(
        ticker = %action.ticker,
        date = %action.date,
        kind = action.kind.as_str(),
        "applying corporate action"
    );

    match &action.kind {
        ActionKind::Split { ratio } => {
            require_open(ledger, action)?;
            // qty * r, price / r: total cost basis is unchanged.
            ledger.lot.open_quantity *= *ratio;
            ledger.lot.average_unit_cost /= *ratio;
            Ok(())
        }
        ActionKind::Bonus { quantity } => {
            require_open(ledger, action)?;
            // Bonus shares are free: cost stays, the average dilutes.
            ledger.lot.open_quantity += *quantity;
            ledger.lot.average_unit_cost = ledger.lot.total_cost / ledger.lot.open_quantity;
            Ok(())
        }
        ActionKind::Reinvest {
            quantity,
            unit_price,
        } => {
            ledger.acquire(*quantity, *unit_price, Decimal::ZERO);
            Ok(())
        }
    }
}

fn require_open(ledger: &Ledger, action: &CorporateAction) -> Result<(), LedgerError> {
    if ledger.state() == PositionState::Empty {
        return Err(LedgerError::NoOpenPosition {
            ticker: action.ticker.clone(),
            date: action.date,
            kind: action.kind.as_str(),
        });
    }
    Ok(())
}
