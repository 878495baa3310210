//! What-if simulation engine for lending positions
//!
//! Explore hypothetical changes to a lending position (collateral and
//! debt quantities, prices, collateral flags) and see every dependent
//! risk metric recomputed instantly, without touching the underlying
//! protocol.
//!
//! ## Features
//! - Pure, idempotent recomputation of derived position data: per-leg
//!   values, weighted liquidation threshold and LTV, health factor,
//!   available borrowing power
//! - Liquidation scenario search: collateral prices that put the
//!   health factor at ~1.00, with bounded deterministic iteration
//! - eMode (efficiency mode) risk parameter substitution
//! - Fetched/working snapshot pairs with reset, per (address, market)
//! - All derived-field math in `rust_decimal` for exact round-trips
//!
//! No I/O, no blocking, no shared state: a call either completes or
//! returns. The solver clones before mutating, so it is safe to run
//! against a snapshot that other tasks are reading.

pub mod constants;
pub mod engine;
pub mod errors;
pub mod math;
pub mod solver;
pub mod state;

pub use engine::recompute;
pub use errors::EngineError;
pub use solver::{eligible_scenario_reserves, solve, ScenarioPrice};
pub use state::{
    AssetRecord, BorrowLeg, HealthFactor, LegKind, PositionEntry, PositionSnapshot,
    PositionStore, ReserveLeg, RiskBand,
};
