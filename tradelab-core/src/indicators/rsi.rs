//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses, seeded with the
//! simple mean of the first `period` changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0; no movement → 50.

use super::Indicator;
use crate::domain::Bar;
use crate::error::BacktestError;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, BacktestError> {
        if period < 1 {
            return Err(BacktestError::Configuration(
                "RSI period must be >= 1".into(),
            ));
        }
        Ok(Self {
            period,
            name: format!("rsi_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period + 1 {
            return result;
        }

        let change = |i: usize| bars[i].close - bars[i - 1].close;

        // Seed: average gain and average loss over first `period` changes
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..=self.period {
            let ch = change(i);
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;

        result[self.period] = compute_rsi(avg_gain, avg_loss);

        // Wilder smoothing for subsequent values
        let alpha = 1.0 / self.period as f64;
        for (i, slot) in result.iter_mut().enumerate().skip(self.period + 1) {
            let ch = change(i);
            let gain = ch.max(0.0);
            let loss = (-ch).max(0.0);

            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;

            *slot = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
