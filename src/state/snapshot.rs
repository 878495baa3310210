//! Position snapshot: legs plus recomputed aggregates
//!
//! Two parallel snapshots exist per market: the fetched baseline and
//! the working copy the user edits. The engine only ever mutates the
//! working copy; resetting is a deep copy of fetched back over working.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::health::HealthFactor;
use super::leg::{BorrowLeg, ReserveLeg};

/// One user's position in one market, with all derived risk metrics.
///
/// Derived fields are never set directly; they are owned by
/// [`crate::engine::recompute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub reserves: Vec<ReserveLeg>,
    pub borrows: Vec<BorrowLeg>,

    /// eMode category the position opted into, if any
    #[serde(default)]
    pub emode_category_id: Option<u8>,

    // === Derived aggregates ===
    #[serde(default)]
    pub total_collateral_in_reference_currency: Decimal,
    #[serde(default)]
    pub total_debt_in_reference_currency: Decimal,

    /// Collateral-value-weighted average liquidation threshold, as a
    /// ratio (0 when there is no collateral)
    #[serde(default)]
    pub current_liquidation_threshold: Decimal,

    /// Collateral-value-weighted average loan-to-value, as a ratio
    #[serde(default)]
    pub current_ltv: Decimal,

    #[serde(default = "infinite")]
    pub health_factor: HealthFactor,

    #[serde(default)]
    pub available_to_borrow_usd: Decimal,
    #[serde(default)]
    pub total_debt_usd: Decimal,
}

fn infinite() -> HealthFactor {
    HealthFactor::Infinite
}

impl Default for PositionSnapshot {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), None)
    }
}

impl PositionSnapshot {
    /// Snapshot with zeroed derived fields; run the engine before
    /// reading aggregates.
    pub fn new(
        reserves: Vec<ReserveLeg>,
        borrows: Vec<BorrowLeg>,
        emode_category_id: Option<u8>,
    ) -> Self {
        Self {
            reserves,
            borrows,
            emode_category_id,
            total_collateral_in_reference_currency: Decimal::ZERO,
            total_debt_in_reference_currency: Decimal::ZERO,
            current_liquidation_threshold: Decimal::ZERO,
            current_ltv: Decimal::ZERO,
            health_factor: HealthFactor::Infinite,
            available_to_borrow_usd: Decimal::ZERO,
            total_debt_usd: Decimal::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reserves.is_empty() && self.borrows.is_empty()
    }

    pub fn reserve(&self, symbol: &str) -> Option<&ReserveLeg> {
        self.reserves.iter().find(|leg| leg.asset.symbol == symbol)
    }

    pub fn reserve_mut(&mut self, symbol: &str) -> Option<&mut ReserveLeg> {
        self.reserves
            .iter_mut()
            .find(|leg| leg.asset.symbol == symbol)
    }

    pub fn borrow(&self, symbol: &str) -> Option<&BorrowLeg> {
        self.borrows.iter().find(|leg| leg.asset.symbol == symbol)
    }

    pub fn borrow_mut(&mut self, symbol: &str) -> Option<&mut BorrowLeg> {
        self.borrows
            .iter_mut()
            .find(|leg| leg.asset.symbol == symbol)
    }
}
