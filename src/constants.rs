//! Engine constants and solver tuning parameters

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// === Risk Parameter Scaling ===

/// Basis points denominator (LTV / liquidation threshold scale)
pub const BPS: u64 = 10_000;

// === Stablecoin Detection ===

/// Symbol substrings that mark an asset as stable-valued.
///
/// Matched case-insensitively against the asset symbol; stable-valued
/// collateral is excluded from liquidation-scenario price search since
/// its price is not expected to move.
pub const STABLECOIN_MARKERS: [&str; 5] = ["DAI", "USD", "GHO", "EUR", "MAI"];

// === Scenario Eligibility Thresholds ===

/// Minimum cumulative USD value of candidate collateral
pub const MIN_CANDIDATE_VALUE_USD: Decimal = dec!(50);

/// Minimum share of total collateral the candidates must represent (5%)
pub const MIN_CANDIDATE_SHARE: Decimal = dec!(0.05);

// === Solver Tuning ===

/// Lower bound of the accepted health factor band.
/// Anything below is past the liquidation point and gets rolled back.
pub const HF_BAND_LOW: Decimal = Decimal::ONE;

/// Upper bound of the accepted health factor band
pub const HF_BAND_HIGH: Decimal = dec!(1.0049999999999);

/// Hard cap on solver passes, shared across both phases.
/// Guarantees termination without wall-clock timeouts.
pub const MAX_SOLVER_PASSES: u32 = 500;

/// Phase A price growth per pass (10%)
pub const GROWTH_RATE: Decimal = dec!(0.1);

/// Phase B decrement estimate factor applied to (hf - band high)
pub const DESCENT_FACTOR: Decimal = dec!(0.45);

/// Phase B cap on a single decrement as a fraction of price (50%)
pub const MAX_DESCENT_STEP: Decimal = dec!(0.5);

/// Smallest price movement and smallest admissible price ($0.01)
pub const PRICE_FLOOR: Decimal = dec!(0.01);
