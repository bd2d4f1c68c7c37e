//! Percentage-drop averaging.
//!
//! Buys on bar-over-bar drops and sells into bar-over-bar rises, both sized in
//! proportion to the move:
//! - drop >= threshold: buy `floor(drop * scale)` units and fold them into the
//!   weighted average buy price.
//! - rise >= threshold, units held, and close above the average price: sell
//!   `floor(min(held, rise * held))` units. Sells never happen at a loss.
//!
//! Bar 0 has no previous close and always holds.

use super::{
    check_fraction, ensure_non_empty, whole_units, AveragingStep, OrderSizing, SignalGenerator,
};
use crate::domain::{BarSeries, Signal};
use crate::error::BacktestError;

#[derive(Debug, Clone)]
pub struct PercentDrop {
    threshold: f64,
    scale: f64,
}

impl PercentDrop {
    pub fn new(threshold: f64, scale: f64) -> Result<Self, BacktestError> {
        check_fraction("threshold", threshold)?;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(BacktestError::Configuration(format!(
                "scale must be positive, got {scale}"
            )));
        }
        Ok(Self { threshold, scale })
    }

    pub fn default_params() -> Result<Self, BacktestError> {
        Self::new(0.05, 100.0)
    }

    /// Signals plus the strategy's own holding bookkeeping after every bar.
    pub fn trace(&self, series: &BarSeries) -> Result<Vec<AveragingStep>, BacktestError> {
        ensure_non_empty(series)?;
        let bars = series.bars();

        let mut units: u64 = 0;
        let mut avg_price = 0.0;
        let mut last_buy_price = 0.0;
        let mut steps = Vec::with_capacity(bars.len());
        steps.push(AveragingStep {
            signal: Signal::HOLD,
            units_held: 0,
            avg_price,
            last_buy_price,
        });

        for pair in bars.windows(2) {
            let (prev, price) = (pair[0].close, pair[1].close);
            let change = (price - prev) / prev;
            let mut signal = Signal::HOLD;

            if -change >= self.threshold {
                let to_buy = whole_units(-change * self.scale);
                if to_buy > 0 {
                    let total = units + to_buy;
                    avg_price =
                        (units as f64 * avg_price + to_buy as f64 * price) / total as f64;
                    units = total;
                    last_buy_price = price;
                    signal = Signal::buy(to_buy);
                }
            } else if change >= self.threshold && units > 0 && price > avg_price {
                let held = units as f64;
                let to_sell = whole_units(held.min(change * held));
                if to_sell > 0 {
                    units -= to_sell;
                    if units == 0 {
                        avg_price = 0.0;
                        last_buy_price = 0.0;
                    }
                    signal = Signal::sell(to_sell);
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

impl SignalGenerator for PercentDrop {
    fn name(&self) -> &str {
        "percent_drop"
    }

    fn sizing(&self) -> OrderSizing {
        OrderSizing::Units
    }

    fn warmup_bars(&self) -> usize {
        1
    }

    fn generate(&self, series: &BarSeries) -> Result<Vec<Signal>, BacktestError> {
        Ok(self.trace(series)?.into_iter().map(|s| s.signal).collect())
    }
}
