//! Moving average crossover with an RSI filter.
//!
//! Buy on a golden cross (fast crosses above slow) while RSI is below the
//! oversold level. Sell on a death cross (fast crosses below slow) or whenever
//! RSI is above the overbought level. A sell wins if both conditions hold.
//!
//! Crossover is asymmetric on purpose: previous `fast <= slow` and current
//! `fast > slow`. A flat stretch where the averages coincide therefore emits a
//! single signal on the bar they separate, never one per flat bar.

use super::{ensure_non_empty, OrderSizing, SignalGenerator};
use crate::domain::{BarSeries, Signal};
use crate::error::BacktestError;
use crate::indicators::{Indicator, Rsi, Sma};

/// RSI gate applied on top of the crossover.
#[derive(Debug, Clone)]
pub struct RsiFilter {
    rsi: Rsi,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiFilter {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Result<Self, BacktestError> {
        check_thresholds(oversold, overbought)?;
        Ok(Self {
            rsi: Rsi::new(period)?,
            oversold,
            overbought,
        })
    }

    pub fn period(&self) -> usize {
        self.rsi.period()
    }
}

#[derive(Debug, Clone)]
pub struct MaRsiCrossover {
    fast: Sma,
    slow: Sma,
    filter: Option<RsiFilter>,
}

impl MaRsiCrossover {
    /// Build with an RSI filter. Thresholds of exactly 0 (oversold) and 100
    /// (overbought) disable the filter.
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        rsi_period: usize,
        oversold: f64,
        overbought: f64,
    ) -> Result<Self, BacktestError> {
        // Validate the period even when the filter ends up disabled.
        Rsi::new(rsi_period)?;
        check_thresholds(oversold, overbought)?;
        let filter = if oversold == 0.0 && overbought == 100.0 {
            None
        } else {
            Some(RsiFilter::new(rsi_period, oversold, overbought)?)
        };
        Self::with_filter(fast_period, slow_period, filter)
    }

    pub fn without_rsi(fast_period: usize, slow_period: usize) -> Result<Self, BacktestError> {
        Self::with_filter(fast_period, slow_period, None)
    }

    pub fn with_filter(
        fast_period: usize,
        slow_period: usize,
        filter: Option<RsiFilter>,
    ) -> Result<Self, BacktestError> {
        if slow_period <= fast_period {
            return Err(BacktestError::Configuration(format!(
                "slow_period ({slow_period}) must be > fast_period ({fast_period})"
            )));
        }
        Ok(Self {
            fast: Sma::new(fast_period)?,
            slow: Sma::new(slow_period)?,
            filter,
        })
    }

    pub fn default_params() -> Result<Self, BacktestError> {
        Self::new(20, 50, 14, 30.0, 70.0)
    }

    pub fn rsi_filter(&self) -> Option<&RsiFilter> {
        self.filter.as_ref()
    }
}

fn check_thresholds(oversold: f64, overbought: f64) -> Result<(), BacktestError> {
    let valid = oversold.is_finite()
        && overbought.is_finite()
        && (0.0..=100.0).contains(&oversold)
        && (0.0..=100.0).contains(&overbought)
        && oversold <= overbought;
    if !valid {
        return Err(BacktestError::Configuration(format!(
            "RSI thresholds must satisfy 0 <= oversold ({oversold}) <= overbought ({overbought}) <= 100"
        )));
    }
    Ok(())
}

impl SignalGenerator for MaRsiCrossover {
    fn name(&self) -> &str {
        "ma_rsi_crossover"
    }

    fn sizing(&self) -> OrderSizing {
        OrderSizing::AllIn
    }

    fn warmup_bars(&self) -> usize {
        let ma = self.fast.period().max(self.slow.period());
        self.filter.as_ref().map_or(ma, |f| ma.max(f.period()))
    }

    fn generate(&self, series: &BarSeries) -> Result<Vec<Signal>, BacktestError> {
        ensure_non_empty(series)?;
        let bars = series.bars();
        let fast = self.fast.compute(bars);
        let slow = self.slow.compute(bars);
        let rsi = self.filter.as_ref().map(|f| f.rsi.compute(bars));
        let warmup = self.warmup_bars();

        let mut signals = vec![Signal::HOLD; bars.len()];
        for i in warmup.max(1)..bars.len() {
            let (fast_cur, slow_cur) = (fast[i], slow[i]);
            let (fast_prev, slow_prev) = (fast[i - 1], slow[i - 1]);
            if fast_cur.is_nan() || slow_cur.is_nan() || fast_prev.is_nan() || slow_prev.is_nan()
            {
                continue;
            }

            let crossed_up = fast_prev <= slow_prev && fast_cur > slow_cur;
            let crossed_down = fast_prev >= slow_prev && fast_cur < slow_cur;

            let (rsi_allows_buy, rsi_forces_sell) = match (&self.filter, &rsi) {
                (Some(filter), Some(values)) => {
                    let value = values[i];
                    if value.is_nan() {
                        continue;
                    }
                    (value < filter.oversold, value > filter.overbought)
                }
                _ => (true, false),
            };

            signals[i] = if crossed_down || rsi_forces_sell {
                Signal::SELL
            } else if crossed_up && rsi_allows_buy {
                Signal::BUY
            } else {
                Signal::HOLD
            };
        }

        Ok(signals)
    }
}
