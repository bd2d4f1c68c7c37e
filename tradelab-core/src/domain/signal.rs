//! Signal: a per-bar, signed instruction to buy, sell, or hold.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed signal value for one bar.
///
/// Positive values buy/add that many units, negative values sell/reduce by the
/// absolute value, zero holds. How the magnitude is interpreted depends on the
/// generating strategy's [`OrderSizing`](crate::strategy::OrderSizing).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signal(pub i64);

impl Signal {
    pub const HOLD: Signal = Signal(0);
    pub const BUY: Signal = Signal(1);
    pub const SELL: Signal = Signal(-1);

    pub fn buy(units: u64) -> Self {
        Signal(units as i64)
    }

    pub fn sell(units: u64) -> Self {
        Signal(-(units as i64))
    }

    pub fn is_buy(self) -> bool {
        self.0 > 0
    }

    pub fn is_sell(self) -> bool {
        self.0 < 0
    }

    pub fn is_hold(self) -> bool {
        self.0 == 0
    }

    /// Absolute size requested by the signal.
    pub fn units(self) -> u64 {
        self.0.unsigned_abs()
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}
