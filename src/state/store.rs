//! Fetched/working snapshot ownership and mutation entry points
//!
//! One entry per (address, market) pair holds the as-observed snapshot
//! and the user-edited working copy. Every mutation entry point runs
//! an engine pass over the working copy before returning, so derived
//! fields are never stale. Callers provide exclusive access to an
//! entry while mutating it; the store does no locking of its own.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::recompute;
use crate::errors::EngineError;
use crate::solver::{solve, ScenarioPrice};

use super::asset::AssetRecord;
use super::leg::{BorrowLeg, LegKind, ReserveLeg};
use super::snapshot::PositionSnapshot;

/// One address's position in one market: baseline, working copy, and
/// the market context needed to recompute and to add new legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub address: String,
    pub market_id: String,

    /// USD price of the market's reference currency unit
    pub reference_currency_price_usd: Decimal,

    /// Catalog of assets the user may add as new legs
    pub available_assets: Vec<AssetRecord>,

    /// As-observed baseline; never edited after construction
    pub fetched: PositionSnapshot,

    /// The snapshot all edits apply to
    pub working: PositionSnapshot,
}

impl PositionEntry {
    /// Build an entry from a freshly mapped snapshot.
    ///
    /// Runs one engine pass over the baseline so its derived fields are
    /// internally consistent before it is frozen, then seeds the
    /// working copy from it.
    pub fn new(
        address: impl Into<String>,
        market_id: impl Into<String>,
        reference_currency_price_usd: Decimal,
        available_assets: Vec<AssetRecord>,
        mut fetched: PositionSnapshot,
    ) -> Result<Self, EngineError> {
        recompute(&mut fetched, reference_currency_price_usd)?;
        let working = fetched.clone();
        Ok(Self {
            address: address.into(),
            market_id: market_id.into(),
            reference_currency_price_usd,
            available_assets,
            fetched,
            working,
        })
    }

    /// True when any edit has moved the working copy off the baseline.
    pub fn has_edits(&self) -> bool {
        self.working != self.fetched
    }

    /// Set a reserve leg's underlying balance.
    pub fn set_reserve_quantity(
        &mut self,
        symbol: &str,
        quantity: Decimal,
    ) -> Result<(), EngineError> {
        if quantity < Decimal::ZERO {
            return Err(EngineError::NegativeQuantity);
        }
        let leg = self
            .working
            .reserve_mut(symbol)
            .ok_or_else(|| EngineError::UnknownAsset {
                symbol: symbol.to_string(),
                kind: LegKind::Reserve.as_str(),
            })?;
        leg.quantity = quantity;
        self.recompute_working()
    }

    /// Set a borrow leg's borrowed amount.
    pub fn set_borrow_quantity(
        &mut self,
        symbol: &str,
        quantity: Decimal,
    ) -> Result<(), EngineError> {
        if quantity < Decimal::ZERO {
            return Err(EngineError::NegativeQuantity);
        }
        let leg = self
            .working
            .borrow_mut(symbol)
            .ok_or_else(|| EngineError::UnknownAsset {
                symbol: symbol.to_string(),
                kind: LegKind::Borrow.as_str(),
            })?;
        leg.quantity = quantity;
        self.recompute_working()
    }

    /// Set an asset's simulated USD price.
    ///
    /// Price is per asset, not per leg: a reserve leg and a borrow leg
    /// sharing the symbol both move.
    pub fn set_asset_price(&mut self, symbol: &str, price: Decimal) -> Result<(), EngineError> {
        if price < Decimal::ZERO {
            return Err(EngineError::NegativePrice);
        }
        let mut found = false;
        if let Some(leg) = self.working.reserve_mut(symbol) {
            leg.asset.price_usd = price;
            found = true;
        }
        if let Some(leg) = self.working.borrow_mut(symbol) {
            leg.asset.price_usd = price;
            found = true;
        }
        if !found {
            return Err(EngineError::UnknownAsset {
                symbol: symbol.to_string(),
                kind: "reserve or borrow",
            });
        }
        self.recompute_working()
    }

    /// Toggle the user-level collateral opt-in on a reserve leg.
    pub fn set_collateral_usage(
        &mut self,
        symbol: &str,
        enabled: bool,
    ) -> Result<(), EngineError> {
        let leg = self
            .working
            .reserve_mut(symbol)
            .ok_or_else(|| EngineError::UnknownAsset {
                symbol: symbol.to_string(),
                kind: LegKind::Reserve.as_str(),
            })?;
        leg.usage_as_collateral_enabled_on_user = enabled;
        self.recompute_working()
    }

    /// Add a reserve leg at quantity zero from the asset catalog.
    pub fn add_reserve(&mut self, symbol: &str) -> Result<(), EngineError> {
        if self.working.reserve(symbol).is_some() {
            return Err(EngineError::DuplicateLeg {
                symbol: symbol.to_string(),
                kind: LegKind::Reserve.as_str(),
            });
        }
        let asset = self.catalog_asset(symbol)?;
        self.working.reserves.push(ReserveLeg::user_added(asset));
        self.recompute_working()
    }

    /// Add a borrow leg at quantity zero from the asset catalog.
    pub fn add_borrow(&mut self, symbol: &str) -> Result<(), EngineError> {
        if self.working.borrow(symbol).is_some() {
            return Err(EngineError::DuplicateLeg {
                symbol: symbol.to_string(),
                kind: LegKind::Borrow.as_str(),
            });
        }
        let asset = self.catalog_asset(symbol)?;
        self.working.borrows.push(BorrowLeg::user_added(asset));
        self.recompute_working()
    }

    /// Remove a leg by symbol and kind.
    pub fn remove_leg(&mut self, symbol: &str, kind: LegKind) -> Result<(), EngineError> {
        let removed = match kind {
            LegKind::Reserve => {
                let before = self.working.reserves.len();
                self.working.reserves.retain(|leg| leg.asset.symbol != symbol);
                self.working.reserves.len() != before
            }
            LegKind::Borrow => {
                let before = self.working.borrows.len();
                self.working.borrows.retain(|leg| leg.asset.symbol != symbol);
                self.working.borrows.len() != before
            }
        };
        if !removed {
            return Err(EngineError::UnknownAsset {
                symbol: symbol.to_string(),
                kind: kind.as_str(),
            });
        }
        self.recompute_working()
    }

    /// Discard every edit: deep-copy the baseline back over the
    /// working snapshot.
    pub fn reset_working(&mut self) -> Result<(), EngineError> {
        self.working = self.fetched.clone();
        self.recompute_working()
    }

    /// Solve for a liquidation scenario over the current working
    /// snapshot without applying it.
    pub fn liquidation_scenario(&self) -> Result<Vec<ScenarioPrice>, EngineError> {
        solve(&self.working, self.reference_currency_price_usd)
    }

    /// Solve and apply the scenario prices to the working snapshot.
    ///
    /// Returns whether a scenario existed and was applied.
    pub fn apply_liquidation_scenario(&mut self) -> Result<bool, EngineError> {
        let scenario = self.liquidation_scenario()?;
        if scenario.is_empty() {
            return Ok(false);
        }
        for price in &scenario {
            self.set_asset_price(&price.symbol, price.price_usd)?;
        }
        Ok(true)
    }

    fn catalog_asset(&self, symbol: &str) -> Result<AssetRecord, EngineError> {
        self.available_assets
            .iter()
            .find(|asset| asset.symbol == symbol)
            .cloned()
            .ok_or_else(|| EngineError::AssetNotInCatalog(symbol.to_string()))
    }

    fn recompute_working(&mut self) -> Result<(), EngineError> {
        recompute(&mut self.working, self.reference_currency_price_usd)?;
        Ok(())
    }
}

/// All tracked positions, keyed by (address, market).
#[derive(Debug, Clone, Default)]
pub struct PositionStore {
    entries: HashMap<(String, String), PositionEntry>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for its (address, market) pair.
    pub fn insert(&mut self, entry: PositionEntry) {
        self.entries
            .insert((entry.address.clone(), entry.market_id.clone()), entry);
    }

    pub fn get(&self, address: &str, market_id: &str) -> Option<&PositionEntry> {
        self.entries
            .get(&(address.to_string(), market_id.to_string()))
    }

    pub fn get_mut(&mut self, address: &str, market_id: &str) -> Option<&mut PositionEntry> {
        self.entries
            .get_mut(&(address.to_string(), market_id.to_string()))
    }

    pub fn remove(&mut self, address: &str, market_id: &str) -> Option<PositionEntry> {
        self.entries
            .remove(&(address.to_string(), market_id.to_string()))
    }

    /// Entries for one address across markets.
    pub fn markets_for<'a>(
        &'a self,
        address: &'a str,
    ) -> impl Iterator<Item = &'a PositionEntry> + 'a {
        self.entries
            .values()
            .filter(move |entry| entry.address == address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn asset(symbol: &str, price: Decimal) -> AssetRecord {
        AssetRecord {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price_usd: price,
            price_in_reference_currency: Decimal::ZERO,
            initial_price_usd: price,
            base_ltv_bps: 8000,
            liquidation_threshold_bps: 8250,
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

    fn entry() -> PositionEntry {
        let eth = ReserveLeg {
            asset: asset("ETH", dec!(2000)),
            quantity: dec!(10),
            usage_as_collateral_enabled_on_user: true,
            value_in_reference_currency: Decimal::ZERO,
            value_usd: Decimal::ZERO,
            is_user_added: false,
        };
        let usdc = BorrowLeg {
            asset: asset("USDC", dec!(1)),
            quantity: dec!(5000),
            value_in_reference_currency: Decimal::ZERO,
            value_usd: Decimal::ZERO,
            is_user_added: false,
        };
        PositionEntry::new(
            "0xabc",
            "ETHEREUM_V3",
            dec!(2000),
            vec![asset("ETH", dec!(2000)), asset("WBTC", dec!(40000)), asset("USDC", dec!(1))],
            PositionSnapshot::new(vec![eth], vec![usdc], None),
        )
        .unwrap()
    }

    #[test]
    fn test_construction_recomputes_baseline() {
        let entry = entry();
        assert_eq!(entry.fetched.total_collateral_in_reference_currency, dec!(10));
        assert_eq!(entry.working, entry.fetched);
        assert!(!entry.has_edits());
    }

    #[test]
    fn test_set_quantity_recomputes() {
        let mut entry = entry();
        entry.set_reserve_quantity("ETH", dec!(20)).unwrap();
        assert_eq!(entry.working.total_collateral_in_reference_currency, dec!(20));
        assert!(entry.has_edits());

        entry.set_borrow_quantity("USDC", dec!(10000)).unwrap();
        assert_eq!(entry.working.total_debt_usd, dec!(10000));
    }

    #[test]
    fn test_negative_inputs_rejected() {
        let mut entry = entry();
        assert_eq!(
            entry.set_reserve_quantity("ETH", dec!(-1)),
            Err(EngineError::NegativeQuantity)
        );
        assert_eq!(
            entry.set_asset_price("ETH", dec!(-0.5)),
            Err(EngineError::NegativePrice)
        );
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let mut entry = entry();
        assert!(matches!(
            entry.set_reserve_quantity("WBTC", dec!(1)),
            Err(EngineError::UnknownAsset { .. })
        ));
        assert!(matches!(
            entry.set_asset_price("DOGE", dec!(1)),
            Err(EngineError::UnknownAsset { .. })
        ));
    }

    #[test]
    fn test_price_edit_applies_to_both_legs() {
        let mut entry = entry();
        entry.add_reserve("USDC").unwrap();
        entry.set_reserve_quantity("USDC", dec!(100)).unwrap();

        entry.set_asset_price("USDC", dec!(0.9)).unwrap();
        assert_eq!(entry.working.reserve("USDC").unwrap().asset.price_usd, dec!(0.9));
        assert_eq!(entry.working.borrow("USDC").unwrap().asset.price_usd, dec!(0.9));
    }

    #[test]
    fn test_add_and_remove_legs() {
        let mut entry = entry();
        entry.add_reserve("WBTC").unwrap();

        let added = entry.working.reserve("WBTC").unwrap();
        assert_eq!(added.quantity, Decimal::ZERO);
        assert!(added.is_user_added);

        assert_eq!(
            entry.add_reserve("WBTC"),
            Err(EngineError::DuplicateLeg {
                symbol: "WBTC".to_string(),
                kind: "reserve",
            })
        );
        assert_eq!(
            entry.add_borrow("DOGE"),
            Err(EngineError::AssetNotInCatalog("DOGE".to_string()))
        );

        entry.remove_leg("WBTC", LegKind::Reserve).unwrap();
        assert!(entry.working.reserve("WBTC").is_none());
        assert!(matches!(
            entry.remove_leg("WBTC", LegKind::Reserve),
            Err(EngineError::UnknownAsset { .. })
        ));
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut entry = entry();
        entry.set_reserve_quantity("ETH", dec!(1)).unwrap();
        entry.set_asset_price("ETH", dec!(1500)).unwrap();
        entry.add_reserve("WBTC").unwrap();
        assert!(entry.has_edits());

        entry.reset_working().unwrap();
        assert_eq!(entry.working, entry.fetched);
        assert!(!entry.has_edits());
    }

    #[test]
    fn test_apply_liquidation_scenario_moves_health_factor_to_band() {
        let mut entry = entry();
        // 10 ETH * 0.825 LT vs 5000 USDC: hf well above the band
        assert!(entry.apply_liquidation_scenario().unwrap());

        let hf = entry.working.health_factor.as_decimal().unwrap();
        assert!(hf >= Decimal::ONE, "hf {hf} below band");
        assert!(hf <= dec!(1.005), "hf {hf} above band");
    }

    #[test]
    fn test_store_keying() {
        let mut store = PositionStore::new();
        store.insert(entry());
        assert_eq!(store.len(), 1);
        assert!(store.get("0xabc", "ETHEREUM_V3").is_some());
        assert!(store.get("0xabc", "POLYGON_V3").is_none());
        assert_eq!(store.markets_for("0xabc").count(), 1);

        store.insert(entry());
        assert_eq!(store.len(), 1);

        assert!(store.remove("0xabc", "ETHEREUM_V3").is_some());
        assert!(store.is_empty());
    }
}
