//! Strategy configuration and construction.
//!
//! [`StrategyConfig`] is the serializable form of a strategy (TOML or JSON,
//! tagged by `type`). [`StrategyConfig::build`] validates the parameters and
//! returns the runtime generator.

use serde::{Deserialize, Serialize};

use super::{BuyAndHold, FixedStep, MaRsiCrossover, PercentDrop, SignalGenerator};
use crate::error::BacktestError;

/// Strategy configuration (serializable enum).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    /// Enter on the first bar and hold to the end.
    BuyAndHold,

    /// Fast/slow SMA crossover gated by RSI. Thresholds 0/100 disable the gate.
    MaRsiCrossover {
        #[serde(default = "defaults::fast_period")]
        fast_period: i64,
        #[serde(default = "defaults::slow_period")]
        slow_period: i64,
        #[serde(default = "defaults::rsi_period")]
        rsi_period: i64,
        #[serde(default = "defaults::rsi_oversold")]
        rsi_oversold: f64,
        #[serde(default = "defaults::rsi_overbought")]
        rsi_overbought: f64,
    },

    /// Buy bar-over-bar drops, sell bar-over-bar rises above the average price.
    PercentDrop {
        #[serde(default = "defaults::threshold")]
        threshold: f64,
        #[serde(default = "defaults::scale")]
        scale: f64,
    },

    /// Average in one unit per fixed step down, take profit in multiples.
    FixedStep {
        #[serde(default = "defaults::step")]
        step: f64,
        #[serde(default = "defaults::take_profit")]
        take_profit: f64,
        #[serde(default = "defaults::max_units")]
        max_units: i64,
    },
}

mod defaults {
    pub fn fast_period() -> i64 {
        20
    }
    pub fn slow_period() -> i64 {
        50
    }
    pub fn rsi_period() -> i64 {
        14
    }
    pub fn rsi_oversold() -> f64 {
        30.0
    }
    pub fn rsi_overbought() -> f64 {
        70.0
    }
    pub fn threshold() -> f64 {
        0.05
    }
    pub fn scale() -> f64 {
        100.0
    }
    pub fn step() -> f64 {
        0.05
    }
    pub fn take_profit() -> f64 {
        0.10
    }
    pub fn max_units() -> i64 {
        10
    }
}

impl StrategyConfig {
    pub fn ma_rsi_default() -> Self {
        Self::MaRsiCrossover {
            fast_period: defaults::fast_period(),
            slow_period: defaults::slow_period(),
            rsi_period: defaults::rsi_period(),
            rsi_oversold: defaults::rsi_oversold(),
            rsi_overbought: defaults::rsi_overbought(),
        }
    }

    pub fn percent_drop_default() -> Self {
        Self::PercentDrop {
            threshold: defaults::threshold(),
            scale: defaults::scale(),
        }
    }

    pub fn fixed_step_default() -> Self {
        Self::FixedStep {
            step: defaults::step(),
            take_profit: defaults::take_profit(),
            max_units: defaults::max_units(),
        }
    }

    /// Every strategy with its default parameters, in a fixed order.
    pub fn all_defaults() -> Vec<Self> {
        vec![
            Self::BuyAndHold,
            Self::ma_rsi_default(),
            Self::percent_drop_default(),
            Self::fixed_step_default(),
        ]
    }

    /// Stable snake_case name, matching [`SignalGenerator::name`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::BuyAndHold => "buy_and_hold",
            Self::MaRsiCrossover { .. } => "ma_rsi_crossover",
            Self::PercentDrop { .. } => "percent_drop",
            Self::FixedStep { .. } => "fixed_step",
        }
    }

    pub fn build(&self) -> Result<Box<dyn SignalGenerator>, BacktestError> {
        match *self {
            Self::BuyAndHold => Ok(Box::new(BuyAndHold)),
            Self::MaRsiCrossover {
                fast_period,
                slow_period,
                rsi_period,
                rsi_oversold,
                rsi_overbought,
            } => Ok(Box::new(MaRsiCrossover::new(
                period("fast_period", fast_period)?,
                period("slow_period", slow_period)?,
                period("rsi_period", rsi_period)?,
                rsi_oversold,
                rsi_overbought,
            )?)),
            Self::PercentDrop { threshold, scale } => {
                Ok(Box::new(PercentDrop::new(threshold, scale)?))
            }
            Self::FixedStep {
                step,
                take_profit,
                max_units,
            } => {
                let max_units = u64::try_from(max_units).map_err(|_| {
                    BacktestError::Configuration(format!(
                        "max_units must be >= 1, got {max_units}"
                    ))
                })?;
                Ok(Box::new(FixedStep::new(step, take_profit, max_units)?))
            }
        }
    }
}

fn period(name: &str, value: i64) -> Result<usize, BacktestError> {
    match usize::try_from(value) {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(BacktestError::Configuration(format!(
            "{name} must be >= 1, got {value}"
        ))),
    }
}
