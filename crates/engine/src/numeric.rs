//! Decimal helpers for money arithmetic. No `f64` anywhere in the
//! forecast path.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round to a whole number, halves away from zero.
///
/// Amounts are non-negative, so this is round-half-up.
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// `round(amount × percent / 100)`.
///
/// `percent` is at most 100, so the product never exceeds `amount` and
/// cannot overflow.
pub fn percent_of(amount: Decimal, percent: u8) -> Decimal {
    round_whole(amount * Decimal::new(i64::from(percent), 2))
}

/// `round(part / whole × 100)` as a whole percentage, 0 when `whole` is 0.
pub fn ratio_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let ratio = Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole);
    round_whole(ratio).to_u32().unwrap_or(0)
}
