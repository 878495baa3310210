//! Derived-position recomputation engine
//!
//! Pure function over a snapshot: given current leg quantities, prices
//! and collateral flags, rederives every dependent metric (per-leg
//! values, totals, weighted risk parameters, health factor, borrowing
//! power). Deterministic and idempotent: running it twice over
//! unchanged inputs yields bit-identical derived fields.
//!
//! All accumulation runs in `Decimal`; chained multiply/divide over
//! many legs must survive a set-then-reset cycle exactly.

use rust_decimal::Decimal;
use tracing::trace;

use crate::errors::EngineError;
use crate::math::{bps_to_ratio, checked_add, checked_div, checked_mul};
use crate::state::{HealthFactor, PositionSnapshot};

/// Recompute every derived field of `snapshot` in place.
///
/// Returns whether any derived field actually changed, so callers can
/// drive change detection without diffing the snapshot themselves.
///
/// # Errors
///
/// `InvalidReferencePrice` when `reference_price_usd <= 0`; that is a
/// caller bug, not a degenerate position. `ValueOutOfRange` when a
/// derived value leaves `Decimal`'s representable range. Degenerate
/// positions (no collateral, no debt) produce sentinel values instead:
/// zero ratios for an empty collateral side, [`HealthFactor::Infinite`]
/// for zero debt.
pub fn recompute(
    snapshot: &mut PositionSnapshot,
    reference_price_usd: Decimal,
) -> Result<bool, EngineError> {
    if reference_price_usd <= Decimal::ZERO {
        return Err(EngineError::InvalidReferencePrice);
    }

    let mut changed = false;
    let emode = snapshot.emode_category_id;

    let mut collateral_reference_total = Decimal::ZERO;
    let mut weighted_liquidation_threshold = Decimal::ZERO;
    let mut weighted_ltv = Decimal::ZERO;
    let mut debt_reference_total = Decimal::ZERO;

    for leg in &mut snapshot.reserves {
        let price_in_reference = checked_div(leg.asset.price_usd, reference_price_usd)?;
        let value_in_reference = checked_mul(price_in_reference, leg.quantity)?;
        let value_usd = checked_mul(leg.quantity, leg.asset.price_usd)?;

        assign(&mut leg.asset.price_in_reference_currency, price_in_reference, &mut changed);
        assign(&mut leg.value_in_reference_currency, value_in_reference, &mut changed);
        assign(&mut leg.value_usd, value_usd, &mut changed);

        if leg.usage_as_collateral_enabled_on_user {
            collateral_reference_total =
                checked_add(collateral_reference_total, value_in_reference)?;

            let lt = bps_to_ratio(leg.asset.effective_liquidation_threshold_bps(emode));
            let ltv = bps_to_ratio(leg.asset.effective_ltv_bps(emode));

            weighted_liquidation_threshold = checked_add(
                weighted_liquidation_threshold,
                checked_mul(lt, value_in_reference)?,
            )?;
            weighted_ltv = checked_add(weighted_ltv, checked_mul(ltv, value_in_reference)?)?;
        }
    }

    for leg in &mut snapshot.borrows {
        let price_in_reference = checked_div(leg.asset.price_usd, reference_price_usd)?;
        let value_in_reference = checked_mul(price_in_reference, leg.quantity)?;
        let value_usd = checked_mul(leg.quantity, leg.asset.price_usd)?;

        assign(&mut leg.asset.price_in_reference_currency, price_in_reference, &mut changed);
        assign(&mut leg.value_in_reference_currency, value_in_reference, &mut changed);
        assign(&mut leg.value_usd, value_usd, &mut changed);

        debt_reference_total = checked_add(debt_reference_total, value_in_reference)?;
    }

    assign(
        &mut snapshot.total_collateral_in_reference_currency,
        collateral_reference_total,
        &mut changed,
    );
    assign(
        &mut snapshot.total_debt_in_reference_currency,
        debt_reference_total,
        &mut changed,
    );

    // Weighted averages are only defined over a non-empty collateral
    // side; "no collateral, no threshold" degrades to zero.
    let liquidation_threshold = if collateral_reference_total > Decimal::ZERO {
        checked_div(weighted_liquidation_threshold, collateral_reference_total)?
    } else {
        Decimal::ZERO
    };
    let ltv = if collateral_reference_total > Decimal::ZERO {
        checked_div(weighted_ltv, collateral_reference_total)?
    } else {
        Decimal::ZERO
    };

    assign(&mut snapshot.current_liquidation_threshold, liquidation_threshold, &mut changed);
    assign(&mut snapshot.current_ltv, ltv, &mut changed);

    // collateral * avg_threshold / debt, computed as the weighted sum
    // over the debt directly: algebraically identical, but skipping
    // the intermediate average avoids a rounding step and keeps the
    // health factor exactly monotone in every leg quantity.
    let health_factor = if collateral_reference_total > Decimal::ZERO
        && debt_reference_total > Decimal::ZERO
        && liquidation_threshold > Decimal::ZERO
    {
        HealthFactor::Finite(checked_div(
            weighted_liquidation_threshold,
            debt_reference_total,
        )?)
    } else if debt_reference_total == Decimal::ZERO {
        HealthFactor::Infinite
    } else {
        HealthFactor::ZERO
    };

    if snapshot.health_factor != health_factor {
        snapshot.health_factor = health_factor;
        changed = true;
    }

    // Borrowing power cannot go negative; a position borrowed past its
    // LTV simply has nothing left to borrow. Same weighted-sum form as
    // the health factor.
    let available_reference = weighted_ltv - debt_reference_total;
    let available_usd = if available_reference > Decimal::ZERO {
        checked_mul(available_reference, reference_price_usd)?
    } else {
        Decimal::ZERO
    };

    assign(&mut snapshot.available_to_borrow_usd, available_usd, &mut changed);
    assign(
        &mut snapshot.total_debt_usd,
        checked_mul(debt_reference_total, reference_price_usd)?,
        &mut changed,
    );

    trace!(
        health_factor = %snapshot.health_factor,
        collateral = %collateral_reference_total,
        debt = %debt_reference_total,
        changed,
        "recomputed derived position data"
    );

    Ok(changed)
}

/// Overwrite a derived field only when the value moved.
#[inline]
fn assign(field: &mut Decimal, value: Decimal, changed: &mut bool) {
    if *field != value {
        *field = value;
        *changed = true;
    }
}
