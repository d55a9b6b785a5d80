//! Shared rounding policy for schedules and distributions.
//!
//! Schedules are rounded to whole currency units, distributions to cents.
//! Rounding is half away from zero, except equal shares which are truncated
//! so the records never exceed the pool.

use rust_decimal::RoundingStrategy;
use rust_decimal_macros::dec;

use crate::types::Money;

/// Maximum allowed gap between a schedule's total and the loan total.
pub const RECONCILIATION_TOLERANCE: Money = dec!(1);

/// Decimal places used for distribution records.
pub const CENT_PLACES: u32 = 2;

/// Round to a whole currency unit.
pub fn round_currency_unit(amount: Money) -> Money {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to two decimal places.
pub fn round_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(CENT_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncate to two decimal places. Never rounds a positive share up.
pub fn floor_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(CENT_PLACES, RoundingStrategy::ToZero)
}

/// True when two totals agree within [`RECONCILIATION_TOLERANCE`].
pub fn reconciles(actual: Money, expected: Money) -> bool {
    (actual - expected).abs() <= RECONCILIATION_TOLERANCE
}
