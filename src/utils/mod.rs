//! Formatting helpers for money, volumes and weights in terminal output

use rust_decimal::Decimal;

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// "¥ " prefix (Chinese yuan)
    Rmb,
    /// No symbol (table cells)
    None,
}

/// Format a money value with two decimals and `,` thousands separators.
///
/// `width` right-aligns the result (0 for no padding).
///
/// # Examples
/// ```
/// use quotedesk::utils::{format_money_with_width, CurrencySymbol};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(
///     format_money_with_width(dec!(1234.56), 0, CurrencySymbol::Rmb),
///     "¥ 1,234.56"
/// );
/// assert_eq!(
///     format_money_with_width(dec!(1234), 12, CurrencySymbol::None),
///     "    1,234.00"
/// );
/// ```
pub fn format_money_with_width(value: Decimal, width: usize, symbol: CurrencySymbol) -> String {
    let is_negative = value < Decimal::ZERO;
    let formatted = format!("{:.2}", value.abs().round_dp(2));
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let sign = if is_negative { "-" } else { "" };
    let prefix = match symbol {
        CurrencySymbol::Rmb => "¥ ",
        CurrencySymbol::None => "",
    };

    let result = format!(
        "{}{}{}.{}",
        prefix,
        sign,
        group_thousands(integer_part),
        decimal_part
    );

    if width > 0 && result.chars().count() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// "¥ 1,234.56"
///
/// ```
/// use quotedesk::utils::format_rmb;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_rmb(dec!(600)), "¥ 600.00");
/// ```
pub fn format_rmb(value: Decimal) -> String {
    format_money_with_width(value, 0, CurrencySymbol::Rmb)
}

/// Quantities, volumes and weights: no trailing zeros, grouped thousands
///
/// ```
/// use quotedesk::utils::format_quantity;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_quantity(dec!(0.0100)), "0.01");
/// assert_eq!(format_quantity(dec!(12000)), "12,000");
/// ```
pub fn format_quantity(value: Decimal) -> String {
    let text = value.normalize().to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    match digits.split_once('.') {
        Some((int, frac)) => format!("{}{}.{}", sign, group_thousands(int), frac),
        None => format!("{}{}", sign, group_thousands(digits)),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped: Vec<char> = Vec::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.into_iter().rev().collect()
}
