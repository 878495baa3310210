//! Health factor value type
//!
//! `Decimal` has no +infinity, so the no-debt sentinel ("cannot be
//! liquidated") is a dedicated variant that orders above every finite
//! value.

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ratio of threshold-weighted collateral to debt, or the no-debt
/// sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthFactor {
    Finite(Decimal),
    /// No debt: the position cannot be liquidated
    Infinite,
}

/// Coarse risk classification used by display layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    /// Below 1.0: eligible for liquidation
    Liquidation,
    /// Below 1.1: close to the liquidation point
    Risky,
    Moderate,
    /// Above 3.0 (or no debt)
    Safe,
}

impl HealthFactor {
    pub const ZERO: Self = Self::Finite(Decimal::ZERO);

    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// The finite value, if any.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Finite(value) => Some(*value),
            Self::Infinite => None,
        }
    }

    /// Liquidation is possible strictly below 1.0.
    pub fn is_liquidatable(&self) -> bool {
        matches!(self, Self::Finite(value) if *value < Decimal::ONE)
    }

    pub fn risk_band(&self) -> RiskBand {
        match self {
            Self::Infinite => RiskBand::Safe,
            Self::Finite(value) => {
                if *value < Decimal::ONE {
                    RiskBand::Liquidation
                } else if *value < Decimal::new(11, 1) {
                    RiskBand::Risky
                } else if *value <= Decimal::from(3) {
                    RiskBand::Moderate
                } else {
                    RiskBand::Safe
                }
            }
        }
    }
}

impl PartialOrd for HealthFactor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HealthFactor {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Infinite, Self::Infinite) => Ordering::Equal,
            (Self::Infinite, Self::Finite(_)) => Ordering::Greater,
            (Self::Finite(_), Self::Infinite) => Ordering::Less,
            (Self::Finite(a), Self::Finite(b)) => a.cmp(b),
        }
    }
}

impl From<Decimal> for HealthFactor {
    fn from(value: Decimal) -> Self {
        Self::Finite(value)
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(value) => write!(f, "{value}"),
            Self::Infinite => write!(f, "∞"),
        }
    }
}
