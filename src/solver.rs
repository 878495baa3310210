//! Liquidation scenario solver
//!
//! Inverts the recomputation model: searches for a set of collateral
//! asset prices that drives the health factor to ~1.00. One scalar
//! constraint over N prices is underdetermined, so instead of a closed
//! form the solver runs a bounded proportional-adjustment search that
//! moves every candidate price together: geometric growth to escape a
//! health factor below 1.0, then a proportional descent with rollback
//! on overshoot. Overshooting below 1.0 is unrecoverable inside a pass
//! without the rollback; overshooting upward is harmless.
//!
//! The search operates on a disposable clone and never touches the
//! caller's snapshot.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    DESCENT_FACTOR, GROWTH_RATE, HF_BAND_HIGH, HF_BAND_LOW, MAX_DESCENT_STEP,
    MAX_SOLVER_PASSES, MIN_CANDIDATE_SHARE, MIN_CANDIDATE_VALUE_USD, PRICE_FLOOR,
};
use crate::engine::recompute;
use crate::errors::EngineError;
use crate::math::{checked_add, checked_mul, round_to_cents, rounds_to_one};
use crate::state::{HealthFactor, PositionSnapshot, ReserveLeg};

/// One candidate asset price in a solved scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPrice {
    pub symbol: String,
    pub price_usd: Decimal,
}

/// Collateral legs whose price the solver is allowed to move.
///
/// Stable-valued assets are excluded (their price is pinned by
/// definition), as are legs the user has not enabled as collateral.
/// The remaining legs must carry enough value to matter: more than 5%
/// of total collateral and more than $50, and there must be at least
/// one borrowed asset outside the candidate set. A position that
/// pledges and borrows the same asset cannot be liquidated by price
/// movement alone, since both sides scale together.
pub fn eligible_scenario_reserves(snapshot: &PositionSnapshot) -> Vec<&ReserveLeg> {
    let candidates: Vec<&ReserveLeg> = snapshot
        .reserves
        .iter()
        .filter(|leg| {
            leg.usage_as_collateral_enabled_on_user && !leg.asset.is_stablecoin()
        })
        .collect();

    let mut cumulative_usd = Decimal::ZERO;
    let mut cumulative_reference = Decimal::ZERO;
    for leg in &candidates {
        cumulative_usd += leg.value_usd;
        cumulative_reference += leg.value_in_reference_currency;
    }

    let exceeds_share = cumulative_reference
        > snapshot.total_collateral_in_reference_currency * MIN_CANDIDATE_SHARE;
    let exceeds_floor = cumulative_usd > MIN_CANDIDATE_VALUE_USD;
    if !(exceeds_share && exceeds_floor) {
        return Vec::new();
    }

    let has_distinct_borrow = snapshot.borrows.iter().any(|borrow| {
        !candidates
            .iter()
            .any(|reserve| reserve.asset.symbol == borrow.asset.symbol)
    });
    if !has_distinct_borrow {
        return Vec::new();
    }

    candidates
}

/// Search for candidate prices that put the health factor inside
/// `[HF_BAND_LOW, HF_BAND_HIGH]`.
///
/// An empty result means no viable scenario: the position is
/// ineligible, already debt-free, or the search hit its pass cap or
/// drove every candidate to the price floor. Non-convergence is not an
/// error.
pub fn solve(
    snapshot: &PositionSnapshot,
    reference_price_usd: Decimal,
) -> Result<Vec<ScenarioPrice>, EngineError> {
    let mut work = snapshot.clone();
    recompute(&mut work, reference_price_usd)?;

    let candidates: Vec<String> = eligible_scenario_reserves(&work)
        .into_iter()
        .map(|leg| leg.asset.symbol.clone())
        .collect();

    let mut hf = match work.health_factor {
        // No debt: no price movement can liquidate
        HealthFactor::Infinite => return Ok(Vec::new()),
        // Ill-defined collateral side behaves like "no position"
        HealthFactor::Finite(value) if value <= Decimal::ZERO => return Ok(Vec::new()),
        HealthFactor::Finite(value) => value,
    };

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    // Already at the liquidation point: the current prices are the
    // scenario.
    if rounds_to_one(hf) {
        debug!(%hf, "position already at liquidation point");
        return Ok(collect_prices(&work, &candidates));
    }

    let mut passes = 0u32;

    // Phase A: grow every candidate price 10% per pass until the
    // health factor climbs back above the band floor.
    while hf < HF_BAND_LOW && passes < MAX_SOLVER_PASSES {
        passes += 1;

        for symbol in &candidates {
            let price = candidate_price(&work, symbol);
            let base = if price.is_zero() { Decimal::ONE } else { price };
            let increment = round_to_cents(checked_mul(base, GROWTH_RATE)?);
            set_candidate_price(&mut work, symbol, checked_add(price, increment)?);
            recompute(&mut work, reference_price_usd)?;
            hf = finite_health_factor(&work);
        }
    }

    // Phase B: descend toward the band. Each pass applies one uniform
    // decrement percentage to every candidate so they all fall
    // proportionally; the percentage is seeded from the first asset's
    // gap estimate.
    let mut short_circuit = false;

    while hf > HF_BAND_HIGH && passes < MAX_SOLVER_PASSES && !short_circuit {
        passes += 1;

        let mut decrement_percentage: Option<Decimal> = None;

        for symbol in &candidates {
            if hf <= HF_BAND_HIGH {
                break;
            }

            let initial_price = candidate_price(&work, symbol);

            let raw_decrement = match decrement_percentage {
                Some(pct) => (checked_mul(pct, initial_price)? / dec!(100)).max(PRICE_FLOOR),
                None => checked_mul(initial_price, (hf - HF_BAND_HIGH) * DESCENT_FACTOR)?
                    .min(initial_price * MAX_DESCENT_STEP)
                    .max(PRICE_FLOOR),
            };
            let price_decrement = round_to_cents(raw_decrement);

            if decrement_percentage.is_none() && initial_price > Decimal::ZERO {
                decrement_percentage = Some(price_decrement * dec!(100) / initial_price);
            }

            let new_price = (initial_price - price_decrement).max(PRICE_FLOOR);
            set_candidate_price(&mut work, symbol, new_price);

            // Every candidate at one cent: no viable scenario exists
            if new_price == PRICE_FLOOR && all_candidates_at_floor(&work, &candidates) {
                short_circuit = true;
            }

            recompute(&mut work, reference_price_usd)?;
            let updated = finite_health_factor(&work);

            if updated < HF_BAND_LOW {
                // Overshot past the liquidation point: this asset's
                // step is unrecoverable, so undo it and move on.
                set_candidate_price(&mut work, symbol, initial_price);
                recompute(&mut work, reference_price_usd)?;
                continue;
            }

            hf = updated;
        }
    }

    if short_circuit || passes >= MAX_SOLVER_PASSES {
        debug!(passes, short_circuit, "no viable liquidation scenario");
        return Ok(Vec::new());
    }

    debug!(passes, %hf, "liquidation scenario converged");
    Ok(collect_prices(&work, &candidates))
}

fn candidate_price(work: &PositionSnapshot, symbol: &str) -> Decimal {
    work.reserve(symbol)
        .map(|leg| leg.asset.price_usd)
        .unwrap_or_default()
}

/// Price is per asset, so a borrow leg sharing the symbol moves too.
fn set_candidate_price(work: &mut PositionSnapshot, symbol: &str, price: Decimal) {
    if let Some(leg) = work.reserve_mut(symbol) {
        leg.asset.price_usd = price;
    }
    if let Some(leg) = work.borrow_mut(symbol) {
        leg.asset.price_usd = price;
    }
}

fn all_candidates_at_floor(work: &PositionSnapshot, candidates: &[String]) -> bool {
    candidates
        .iter()
        .all(|symbol| candidate_price(work, symbol) <= PRICE_FLOOR)
}

/// Inside the search loops debt is strictly positive, so the health
/// factor stays finite; the fallback only guards the type.
fn finite_health_factor(work: &PositionSnapshot) -> Decimal {
    work.health_factor.as_decimal().unwrap_or(Decimal::MAX)
}

fn collect_prices(work: &PositionSnapshot, candidates: &[String]) -> Vec<ScenarioPrice> {
    candidates
        .iter()
        .map(|symbol| ScenarioPrice {
            symbol: symbol.clone(),
            price_usd: candidate_price(work, symbol),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AssetRecord, BorrowLeg};
    use rust_decimal_macros::dec;

    fn asset(symbol: &str, price: Decimal) -> AssetRecord {
        AssetRecord {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price_usd: price,
            price_in_reference_currency: Decimal::ZERO,
            initial_price_usd: price,
            base_ltv_bps: 8000,
            liquidation_threshold_bps: 8000,
            usage_as_collateral_enabled: true,
            emode_category_id: None,
            emode_ltv_bps: None,
            emode_liquidation_threshold_bps: None,
            is_active: true,
            is_frozen: false,
            is_paused: false,
            borrowing_enabled: true,
            flash_loan_enabled: false,
        }
    }

    fn reserve(symbol: &str, price: Decimal, qty: Decimal) -> ReserveLeg {
        ReserveLeg {
            asset: asset(symbol, price),
            quantity: qty,
            usage_as_collateral_enabled_on_user: true,
            value_in_reference_currency: Decimal::ZERO,
            value_usd: Decimal::ZERO,
            is_user_added: false,
        }
    }

    fn borrow(symbol: &str, price: Decimal, qty: Decimal) -> BorrowLeg {
        BorrowLeg {
            asset: asset(symbol, price),
            quantity: qty,
            value_in_reference_currency: Decimal::ZERO,
            value_usd: Decimal::ZERO,
            is_user_added: false,
        }
    }

    fn recomputed(mut snapshot: PositionSnapshot, reference: Decimal) -> PositionSnapshot {
        recompute(&mut snapshot, reference).unwrap();
        snapshot
    }

    #[test]
    fn test_stablecoin_reserves_are_not_candidates() {
        let snapshot = recomputed(
            PositionSnapshot::new(
                vec![
                    reserve("ETH", dec!(2000), dec!(10)),
                    reserve("USDC", dec!(1), dec!(5000)),
                ],
                vec![borrow("DAI", dec!(1), dec!(100))],
                None,
            ),
            dec!(2000),
        );
        let eligible = eligible_scenario_reserves(&snapshot);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].asset.symbol, "ETH");
    }

    #[test]
    fn test_candidates_below_usd_floor_are_rejected() {
        // $40 of ETH is all the volatile collateral there is
        let snapshot = recomputed(
            PositionSnapshot::new(
                vec![reserve("ETH", dec!(2000), dec!(0.02))],
                vec![borrow("USDC", dec!(1), dec!(10))],
                None,
            ),
            dec!(2000),
        );
        assert!(eligible_scenario_reserves(&snapshot).is_empty());
    }

    #[test]
    fn test_candidates_below_share_threshold_are_rejected() {
        // Volatile collateral is only ~2% of total collateral value
        let snapshot = recomputed(
            PositionSnapshot::new(
                vec![
                    reserve("ETH", dec!(2000), dec!(0.05)),
                    reserve("USDC", dec!(1), dec!(5000)),
                ],
                vec![borrow("WBTC", dec!(40000), dec!(0.001))],
                None,
            ),
            dec!(2000),
        );
        assert!(eligible_scenario_reserves(&snapshot).is_empty());
    }

    #[test]
    fn test_self_referential_position_is_ineligible() {
        // Same asset pledged and borrowed: both sides move together
        let snapshot = recomputed(
            PositionSnapshot::new(
                vec![reserve("ETH", dec!(2000), dec!(10))],
                vec![borrow("ETH", dec!(2000), dec!(2))],
                None,
            ),
            dec!(2000),
        );
        assert!(eligible_scenario_reserves(&snapshot).is_empty());
        assert!(solve(&snapshot, dec!(2000)).unwrap().is_empty());
    }

    #[test]
    fn test_collateral_disabled_reserves_are_not_candidates() {
        let mut snapshot = PositionSnapshot::new(
            vec![reserve("ETH", dec!(2000), dec!(10))],
            vec![borrow("USDC", dec!(1), dec!(100))],
            None,
        );
        snapshot.reserves[0].usage_as_collateral_enabled_on_user = false;
        let snapshot = recomputed(snapshot, dec!(2000));
        assert!(eligible_scenario_reserves(&snapshot).is_empty());
    }

    #[test]
    fn test_no_debt_returns_empty() {
        let snapshot = recomputed(
            PositionSnapshot::new(vec![reserve("ETH", dec!(2000), dec!(10))], vec![], None),
            dec!(2000),
        );
        assert!(solve(&snapshot, dec!(2000)).unwrap().is_empty());
    }

    #[test]
    fn test_solver_does_not_mutate_input() {
        let snapshot = recomputed(
            PositionSnapshot::new(
                vec![reserve("ETH", dec!(2000), dec!(10))],
                vec![borrow("USDC", dec!(1), dec!(15000))],
                None,
            ),
            dec!(2000),
        );
        let before = snapshot.clone();
        let scenario = solve(&snapshot, dec!(2000)).unwrap();
        assert!(!scenario.is_empty());
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_floored_candidate_short_circuits_to_empty() {
        // Stable collateral holds the health factor above the band
        // even with the sole volatile candidate driven to one cent:
        // (1000 + ~0) * 0.8 / 700 never drops below ~1.14
        let snapshot = recomputed(
            PositionSnapshot::new(
                vec![
                    reserve("USDC", dec!(1), dec!(1000)),
                    reserve("ETH", dec!(100), dec!(1)),
                ],
                vec![borrow("WBTC", dec!(70000), dec!(0.01))],
                None,
            ),
            dec!(1),
        );
        assert!(solve(&snapshot, dec!(1)).unwrap().is_empty());
    }

    #[test]
    fn test_search_gives_up_at_the_pass_cap() {
        // At $0.04 the 10% growth increment rounds to zero cents, so
        // no pass can lift the health factor above 1.0
        let snapshot = recomputed(
            PositionSnapshot::new(
                vec![reserve("SHIB", dec!(0.04), dec!(10000))],
                vec![borrow("GHO", dec!(1), dec!(500))],
                None,
            ),
            dec!(1),
        );
        assert!(solve(&snapshot, dec!(1)).unwrap().is_empty());
    }

    #[test]
    fn test_position_already_at_liquidation_point_returns_current_prices() {
        // hf = 10 * 0.8 / 8.0 = 1.0 exactly
        let snapshot = recomputed(
            PositionSnapshot::new(
                vec![reserve("ETH", dec!(2000), dec!(10))],
                vec![borrow("USDC", dec!(1), dec!(16000))],
                None,
            ),
            dec!(2000),
        );
        let scenario = solve(&snapshot, dec!(2000)).unwrap();
        assert_eq!(
            scenario,
            vec![ScenarioPrice {
                symbol: "ETH".to_string(),
                price_usd: dec!(2000),
            }]
        );
    }
}
