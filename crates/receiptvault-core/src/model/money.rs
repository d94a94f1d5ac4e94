//! Money normalization
//!
//! Every amount that enters a version goes through [`checked_normalize`], so
//! stored and compared values always carry exactly two decimal places and
//! stay within [`max_amount`].

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for every fee
pub const MONEY_SCALE: u32 = 2;

/// Round half-to-even to two places and fix the scale at two
pub fn normalize(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Largest fee accepted: `999999999999.99`. Five of these still sum and
/// spell out without overflow.
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, MONEY_SCALE)
}

/// [`normalize`], or `None` when the result cannot keep two places or is
/// larger than [`max_amount`] in magnitude
pub fn checked_normalize(amount: Decimal) -> Option<Decimal> {
    let normalized = normalize(amount);
    (normalized.scale() == MONEY_SCALE && normalized.abs() <= max_amount()).then_some(normalized)
}

/// `0.00`
pub fn zero() -> Decimal {
    Decimal::new(0, MONEY_SCALE)
}
