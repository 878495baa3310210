//! Decimal helpers shared by the engine and the solver

pub mod bps;
pub mod checked;
pub mod rounding;

pub use bps::*;
pub use checked::*;
pub use rounding::*;
