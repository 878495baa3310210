//! Position data model

pub mod asset;
pub mod health;
pub mod leg;
pub mod snapshot;
pub mod store;

pub use asset::AssetRecord;
pub use health::{HealthFactor, RiskBand};
pub use leg::{BorrowLeg, LegKind, ReserveLeg};
pub use snapshot::PositionSnapshot;
pub use store::{PositionEntry, PositionStore};
