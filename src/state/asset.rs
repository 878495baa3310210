//! Market-level asset description
//!
//! One record per unique symbol, shared by the reserve and borrow legs
//! that reference it. Price is the only field the simulation mutates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::STABLECOIN_MARKERS;

/// Market parameters and current (possibly simulated) price of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Stable key within a position
    pub symbol: String,

    pub name: String,

    /// Current simulated price, mutable under edits. Never negative.
    pub price_usd: Decimal,

    /// Derived: price_usd / reference currency price
    #[serde(default)]
    pub price_in_reference_currency: Decimal,

    /// Price as observed at fetch time, before any edits
    #[serde(default)]
    pub initial_price_usd: Decimal,

    /// Maximum loan-to-value when used as collateral, basis points
    pub base_ltv_bps: u64,

    /// Liquidation threshold, basis points
    pub liquidation_threshold_bps: u64,

    /// Protocol-level collateral eligibility (not user-controlled)
    pub usage_as_collateral_enabled: bool,

    /// eMode risk parameters, active only when the category matches the
    /// position's category
    #[serde(default)]
    pub emode_category_id: Option<u8>,
    #[serde(default)]
    pub emode_ltv_bps: Option<u64>,
    #[serde(default)]
    pub emode_liquidation_threshold_bps: Option<u64>,

    // Protocol status flags, pass-through from the data-fetch layer
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_frozen: bool,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub borrowing_enabled: bool,
    #[serde(default)]
    pub flash_loan_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl AssetRecord {
    /// Heuristic stable-value detection by symbol substring.
    ///
    /// Known to be fragile for exotic symbols; kept until the data
    /// source provides an explicit stability flag.
    pub fn is_stablecoin(&self) -> bool {
        let symbol = self.symbol.to_uppercase();
        STABLECOIN_MARKERS
            .iter()
            .any(|marker| symbol.contains(marker))
    }

    /// Active, not paused, not frozen
    pub fn is_usable(&self) -> bool {
        self.is_active && !self.is_paused && !self.is_frozen
    }

    pub fn is_borrowable(&self) -> bool {
        self.is_usable() && self.borrowing_enabled
    }

    pub fn is_suppliable(&self) -> bool {
        self.is_usable() && self.usage_as_collateral_enabled
    }

    pub fn is_flashloanable(&self) -> bool {
        self.is_usable() && self.flash_loan_enabled
    }

    /// Effective liquidation threshold in basis points, honoring an
    /// eMode category match.
    pub fn effective_liquidation_threshold_bps(&self, position_emode: Option<u8>) -> u64 {
        if self.emode_applies(position_emode) {
            self.emode_liquidation_threshold_bps.unwrap_or(0)
        } else {
            self.liquidation_threshold_bps
        }
    }

    /// Effective loan-to-value in basis points, honoring an eMode
    /// category match.
    pub fn effective_ltv_bps(&self, position_emode: Option<u8>) -> u64 {
        if self.emode_applies(position_emode) {
            self.emode_ltv_bps.unwrap_or(0)
        } else {
            self.base_ltv_bps
        }
    }

    fn emode_applies(&self, position_emode: Option<u8>) -> bool {
        match (self.emode_category_id, position_emode) {
            (Some(asset_category), Some(position_category)) => {
                asset_category == position_category
            }
            _ => false,
        }
    }
}
