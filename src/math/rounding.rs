//! Cent rounding for simulated USD prices
//!
//! Solver price adjustments are quoted in whole cents so the returned
//! scenario prices look like real quotes and the search cannot stall on
//! sub-cent steps.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a USD amount to whole cents, half away from zero.
#[inline]
pub fn round_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// True when a health factor value rounds to exactly 1.00 at two
/// decimal places.
#[inline]
pub fn rounds_to_one(value: Decimal) -> bool {
    round_to_cents(value) == Decimal::ONE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(dec!(1.004)), dec!(1.00));
        assert_eq!(round_to_cents(dec!(1.005)), dec!(1.01));
        assert_eq!(round_to_cents(dec!(199.999)), dec!(200.00));
        assert_eq!(round_to_cents(dec!(0.001)), dec!(0.00));
    }

    #[test]
    fn test_rounds_to_one() {
        assert!(rounds_to_one(dec!(1.0)));
        assert!(rounds_to_one(dec!(1.004)));
        assert!(rounds_to_one(dec!(0.995)));
        assert!(!rounds_to_one(dec!(1.005)));
        assert!(!rounds_to_one(dec!(0.99)));
    }
}
