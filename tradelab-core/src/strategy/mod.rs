//! Signal generators: the strategy layer.
//!
//! A strategy turns a bar series into a parallel sequence of signals. The set
//! of strategies is closed: each variant of [`StrategyConfig`] builds exactly
//! one generator through [`StrategyConfig::build`].
//!
//! # Contract
//! - Output length equals the series length.
//! - The signal at bar i depends only on bars 0..=i (no look-ahead).
//! - Generation is deterministic: the same input always yields the same output.
//! - Generators never see portfolio state. Strategies that track a holding
//!   (the averaging variants) carry their own bookkeeping through the fold.

pub mod buy_and_hold;
pub mod factory;
pub mod fixed_step;
pub mod ma_rsi;
pub mod percent_drop;

pub use buy_and_hold::BuyAndHold;
pub use factory::StrategyConfig;
pub use fixed_step::FixedStep;
pub use ma_rsi::{MaRsiCrossover, RsiFilter};
pub use percent_drop::PercentDrop;

use serde::{Deserialize, Serialize};

use crate::domain::{BarSeries, Signal};
use crate::error::BacktestError;

/// Tolerance applied before truncating a fractional size to whole units, so
/// that exact decimal ratios (6% of 100 = 6) survive binary rounding.
pub const UNIT_EPSILON: f64 = 1e-9;

/// How the simulator maps a signal's magnitude onto order size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSizing {
    /// Buy as many whole units as cash allows when flat; sell closes the
    /// whole holding. Buys while holding are ignored.
    AllIn,
    /// The signal magnitude is the unit count. Buys average into an existing
    /// holding, sells reduce it.
    Units,
}

pub trait SignalGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn sizing(&self) -> OrderSizing;

    /// Bars before which no signal can fire.
    fn warmup_bars(&self) -> usize;

    fn generate(&self, series: &BarSeries) -> Result<Vec<Signal>, BacktestError>;
}

/// Per-bar bookkeeping of the averaging strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AveragingStep {
    pub signal: Signal,
    /// Units held after this bar's signal.
    pub units_held: u64,
    pub avg_price: f64,
    pub last_buy_price: f64,
}

/// Truncate a non-negative size to whole units.
pub(crate) fn whole_units(size: f64) -> u64 {
    if !size.is_finite() || size <= 0.0 {
        return 0;
    }
    (size + UNIT_EPSILON).floor() as u64
}

pub(crate) fn ensure_non_empty(series: &BarSeries) -> Result<(), BacktestError> {
    if series.is_empty() {
        return Err(BacktestError::InvalidInput(format!(
            "{}: cannot generate signals for an empty series",
            series.symbol()
        )));
    }
    Ok(())
}

pub(crate) fn check_fraction(name: &str, value: f64) -> Result<f64, BacktestError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BacktestError::Configuration(format!(
            "{name} must be a positive finite fraction, got {value}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_units_tolerates_binary_rounding() {
        let drop = (100.0_f64 - 94.0) / 100.0;
        assert_eq!(whole_units(drop * 100.0), 6);
        assert_eq!(whole_units(0.2 / 0.1), 2);
        assert_eq!(whole_units(2.999), 2);
        assert_eq!(whole_units(-1.0), 0);
        assert_eq!(whole_units(f64::NAN), 0);
    }

    #[test]
    fn check_fraction_rejects_non_positive() {
        assert!(check_fraction("threshold", 0.05).is_ok());
        assert!(check_fraction("threshold", 0.0).is_err());
        assert!(check_fraction("threshold", f64::INFINITY).is_err());
    }
}
