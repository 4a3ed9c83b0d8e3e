//! Error handling for the cost-basis engine
//!
//! Defines the typed ledger errors and establishes a unified Result type
//! using anyhow for context chaining at the binary boundary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Core error types for ledger operations.
///
/// Every variant carries enough context (ticker and event date where they are
/// known) to trace the failure back to a line in the source statement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// A raw row could not be turned into a canonical event.
    #[error("row {row}: malformed record in field '{field}': {reason}")]
    MalformedRecord {
        /// Row number in the source file (1-indexed for user display)
        row: usize,
        field: &'static str,
        reason: String,
    },

    /// A sale exceeds the open quantity. Signals bad input data or an
    /// untracked corporate action; never clamped or auto-corrected.
    #[error("{ticker} on {date}: selling {requested} units but only {available} held")]
    InsufficientPosition {
        ticker: String,
        date: NaiveDate,
        requested: Decimal,
        available: Decimal,
    },

    /// A split or bonus arrived for an asset with no open lot.
    #[error("{ticker} on {date}: {kind} event with no open position")]
    NoOpenPosition {
        ticker: String,
        date: NaiveDate,
        kind: &'static str,
    },

    /// Unrecognized corporate-action kind token; the action is skipped.
    #[error("{ticker} on {date}: unknown corporate action kind '{kind}'")]
    UnknownActionKind {
        ticker: String,
        date: NaiveDate,
        kind: String,
    },
}

/// Result type alias for pipeline operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = LedgerError::InsufficientPosition {
            ticker: "PETR4".to_string(),
            date: NaiveDate::from_ymd_opt(2019, 3, 6).unwrap(),
            requested: dec!(100),
            available: dec!(40),
        };
        assert_eq!(
            err.to_string(),
            "PETR4 on 2019-03-06: selling 100 units but only 40 held"
        );
    }

    #[test]
    fn test_malformed_record_carries_row() {
        let err = LedgerError::MalformedRecord {
            row: 12,
            field: "quantity",
            reason: "not a number: 'abc'".to_string(),
        };
        assert!(err.to_string().starts_with("row 12"));
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> =
            Err(anyhow::anyhow!("original error")).context("failed to process statement");
        match result {
            Err(e) => {
                assert!(e.to_string().contains("failed to process statement"));
                let debug_msg = format!("{:?}", e);
                assert!(debug_msg.contains("original error"));
            }
            Ok(_) => panic!("expected error"),
        }
    }
}
