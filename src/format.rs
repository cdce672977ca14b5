//! Indonesian rupiah presentation helpers for the report output.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TRILLION: Decimal = dec!(1_000_000_000_000);
const BILLION: Decimal = dec!(1_000_000_000);
const MILLION: Decimal = dec!(1_000_000);

/// Full rupiah amount: `"Rp 1.234.568"`.
pub fn rupiah(value: Decimal) -> String {
    format!("Rp {}", group_thousands(value))
}

/// Compact magnitude shown next to headline figures: trillions as `T`,
/// billions as `M` (miliar), millions as `Jt` (juta).
pub fn compact(value: Decimal) -> String {
    if value >= TRILLION {
        format!("{:.2} T", (value / TRILLION).round_dp(2))
    } else if value >= BILLION {
        format!("{:.2} M", (value / BILLION).round_dp(2))
    } else if value >= MILLION {
        format!("{:.2} Jt", (value / MILLION).round_dp(2))
    } else {
        group_thousands(value)
    }
}

/// Round to whole rupiah and group digits with dots: `1234567.5` becomes
/// `"1.234.568"`.
pub fn group_thousands(value: Decimal) -> String {
    let rounded = value.round_dp(0);
    let digits = rounded.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}
