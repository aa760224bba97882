//! Price arithmetic and display using decimal arithmetic.
//!
//! The storefront sells in a single currency (USD). Amounts are carried as
//! [`Decimal`] so cart totals never pick up binary floating point drift.

use rust_decimal::Decimal;

/// Total for one cart line: `price * quantity`.
#[must_use]
pub fn line_total(price: Decimal, quantity: u32) -> Decimal {
    price * Decimal::from(quantity)
}

/// Format an amount as US dollars, e.g. `$1,234.50`.
///
/// Rounds half away from zero to cents.
///
/// ```
/// use rust_decimal::Decimal;
/// use shopfront_core::format_price;
///
/// assert_eq!(format_price(Decimal::new(40, 0)), "$40.00");
/// assert_eq!(format_price(Decimal::new(1_234_567, 1)), "$123,456.70");
/// ```
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    let rounded =
        amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{cents}")
}
