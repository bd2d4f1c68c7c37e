//! Simulator configuration and run result types.

use serde::{Deserialize, Serialize};

use crate::domain::{Fill, Position, TradeRecord};
use crate::error::BacktestError;

/// Configuration for a single simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub initial_cash: f64,
    /// Proportional commission, charged on the notional of every fill.
    pub commission: f64,
    /// Realize the open holding at the last close instead of marking it.
    #[serde(default)]
    pub close_open_at_end: bool,
}

impl SimConfig {
    pub fn new(initial_cash: f64, commission: f64) -> Self {
        Self {
            initial_cash,
            commission,
            close_open_at_end: false,
        }
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(BacktestError::Configuration(format!(
                "initial_cash must be positive, got {}",
                self.initial_cash
            )));
        }
        if !self.commission.is_finite() || !(0.0..1.0).contains(&self.commission) {
            return Err(BacktestError::Configuration(format!(
                "commission must be in [0, 1), got {}",
                self.commission
            )));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(100_000.0, 0.001)
    }
}

/// Result of simulating one instrument.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    /// Equity after each bar's fill, one value per bar.
    pub equity_curve: Vec<f64>,
    pub fills: Vec<Fill>,
    /// Realized trades, one per sell fill.
    pub trades: Vec<TradeRecord>,
    /// Holding still open at the end of the series (marked, not realized).
    pub open_position: Option<Position>,
    pub final_cash: f64,
    pub final_equity: f64,
    pub total_commission: f64,
    /// Buys dropped because cash could not cover them.
    pub rejected_orders: usize,
}

impl SimulationResult {
    pub fn open_units(&self) -> f64 {
        self.open_position.as_ref().map_or(0.0, |p| p.quantity)
    }
}
