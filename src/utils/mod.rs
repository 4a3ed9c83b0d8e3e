//! Formatting and rounding utilities shared by the report layer.

use rust_decimal::{Decimal, RoundingStrategy};

/// Truncate a monetary value to centavos.
///
/// Tax amounts are always rounded down, never to nearest: 5.999 becomes 5.99.
pub fn round_down_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Format a Decimal as Brazilian currency: "R$ 1.234,56".
///
/// Thousands separator `.`, decimal separator `,`, value truncated to
/// centavos first.
pub fn format_currency(value: Decimal) -> String {
    let truncated = round_down_money(value);
    let is_negative = truncated < Decimal::ZERO;
    let abs_value = truncated.abs();

    let formatted = format!("{:.2}", abs_value);
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec!['.', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    format!("R$ {}{},{}", sign, with_separators, decimal_part)
}

/// Format a quantity, trimming a trailing ".000..." tail from whole numbers.
pub fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}
