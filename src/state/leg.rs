//! Position legs: one asset-specific exposure, collateral or debt
//!
//! The two kinds are distinct types rather than one dynamically probed
//! record; the snapshot holds them in separate, strongly typed lists
//! and APIs that work across both take a [`LegKind`] discriminant.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset::AssetRecord;

/// Discriminant for operations addressing either leg list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegKind {
    Reserve,
    Borrow,
}

impl LegKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::Borrow => "borrow",
        }
    }
}

/// Supplied collateral exposure to one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveLeg {
    pub asset: AssetRecord,

    /// Underlying balance. Never negative.
    pub quantity: Decimal,

    /// User opt-in to use this reserve as collateral, independent of
    /// the protocol-level eligibility flag on the asset
    pub usage_as_collateral_enabled_on_user: bool,

    /// Derived: quantity * price in reference currency
    #[serde(default)]
    pub value_in_reference_currency: Decimal,

    /// Derived: quantity * price in USD
    #[serde(default)]
    pub value_usd: Decimal,

    /// True for legs the user added in the simulation (seeded at
    /// quantity zero), false for fetched legs
    #[serde(default)]
    pub is_user_added: bool,
}

impl ReserveLeg {
    /// Fresh user-added reserve at quantity zero.
    ///
    /// Collateral usage starts at the protocol eligibility flag, the
    /// same default the protocol applies on first supply.
    pub fn user_added(asset: AssetRecord) -> Self {
        let usage = asset.usage_as_collateral_enabled;
        Self {
            asset,
            quantity: Decimal::ZERO,
            usage_as_collateral_enabled_on_user: usage,
            value_in_reference_currency: Decimal::ZERO,
            value_usd: Decimal::ZERO,
            is_user_added: true,
        }
    }
}

/// Borrowed debt exposure to one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowLeg {
    pub asset: AssetRecord,

    /// Total borrowed. Never negative.
    pub quantity: Decimal,

    /// Derived: quantity * price in reference currency
    #[serde(default)]
    pub value_in_reference_currency: Decimal,

    /// Derived: quantity * price in USD
    #[serde(default)]
    pub value_usd: Decimal,

    /// True for legs the user added in the simulation
    #[serde(default)]
    pub is_user_added: bool,
}

impl BorrowLeg {
    /// Fresh user-added borrow at quantity zero.
    pub fn user_added(asset: AssetRecord) -> Self {
        Self {
            asset,
            quantity: Decimal::ZERO,
            value_in_reference_currency: Decimal::ZERO,
            value_usd: Decimal::ZERO,
            is_user_added: true,
        }
    }
}
