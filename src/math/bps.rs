//! Basis point conversions
//!
//! Risk parameters (LTV, liquidation threshold) arrive as basis points
//! in 0..=10000 and enter the weighted averages as exact decimal ratios.

use rust_decimal::Decimal;
use crate::constants::BPS;

/// Convert a basis-point value to a decimal ratio.
///
/// 8000 bps -> 0.8. Exact: both operands are integers, so the quotient
/// carries no binary rounding error.
#[inline]
pub fn bps_to_ratio(bps: u64) -> Decimal {
    Decimal::from(bps) / Decimal::from(BPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bps_to_ratio() {
        assert_eq!(bps_to_ratio(8000), dec!(0.8));
        assert_eq!(bps_to_ratio(8250), dec!(0.825));
        assert_eq!(bps_to_ratio(0), Decimal::ZERO);
        assert_eq!(bps_to_ratio(10_000), Decimal::ONE);
    }

    #[test]
    fn test_odd_bps_exact() {
        // 1 bp = 0.0001 exactly, no drift over repeated sums
        let one_bp = bps_to_ratio(1);
        let sum: Decimal = (0..10_000).map(|_| one_bp).sum();
        assert_eq!(sum, Decimal::ONE);
    }
}
