//! Fixed-step averaging-in.
//!
//! Whenever flat (including the first bar) buy one unit. While holding:
//! - close at least `step` below the *last* buy price, and fewer than
//!   `max_units` held: buy one more unit and re-average.
//! - otherwise, profit over the *average* price of at least `take_profit`:
//!   sell one unit per reached multiple of `take_profit`, capped at the
//!   holding. Average and last-buy price reset to zero once fully sold.

use super::{
    check_fraction, ensure_non_empty, whole_units, AveragingStep, OrderSizing, SignalGenerator,
};
use crate::domain::{BarSeries, Signal};
use crate::error::BacktestError;

#[derive(Debug, Clone)]
pub struct FixedStep {
    step: f64,
    take_profit: f64,
    max_units: u64,
}

impl FixedStep {
    pub fn new(step: f64, take_profit: f64, max_units: u64) -> Result<Self, BacktestError> {
        check_fraction("step", step)?;
        check_fraction("take_profit", take_profit)?;
        if max_units == 0 {
            return Err(BacktestError::Configuration(
                "max_units must be >= 1".into(),
            ));
        }
        Ok(Self {
            step,
            take_profit,
            max_units,
        })
    }

    pub fn default_params() -> Result<Self, BacktestError> {
        Self::new(0.05, 0.10, 10)
    }

    pub fn trace(&self, series: &BarSeries) -> Result<Vec<AveragingStep>, BacktestError> {
        ensure_non_empty(series)?;

        let mut units: u64 = 0;
        let mut avg_price = 0.0;
        let mut last_buy_price = 0.0;
        let mut steps = Vec::with_capacity(series.len());

        for bar in series.bars() {
            let price = bar.close;
            let mut signal = Signal::HOLD;

            if units == 0 {
                units = 1;
                avg_price = price;
                last_buy_price = price;
                signal = Signal::BUY;
            } else {
                let drop = (last_buy_price - price) / last_buy_price;
                let profit = (price - avg_price) / avg_price;

                if drop >= self.step && units < self.max_units {
                    units += 1;
                    avg_price = (avg_price * (units - 1) as f64 + price) / units as f64;
                    last_buy_price = price;
                    signal = Signal::BUY;
                } else if profit >= self.take_profit {
                    let portions = units.min(whole_units(profit / self.take_profit));
                    if portions > 0 {
                        units -= portions;
                        if units == 0 {
                            avg_price = 0.0;
                            last_buy_price = 0.0;
                        }
                        signal = Signal::sell(portions);
                    }
                }
            }

            steps.push(AveragingStep {
                signal,
                units_held: units,
                avg_price,
                last_buy_price,
            });
        }

        Ok(steps)
    }
}

impl SignalGenerator for FixedStep {
    fn name(&self) -> &str {
        "fixed_step"
    }

    fn sizing(&self) -> OrderSizing {
        OrderSizing::Units
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn generate(&self, series: &BarSeries) -> Result<Vec<Signal>, BacktestError> {
        Ok(self.trace(series)?.into_iter().map(|s| s.signal).collect())
    }
}
