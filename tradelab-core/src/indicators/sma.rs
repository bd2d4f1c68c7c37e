//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::Bar;
use crate::error::BacktestError;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, BacktestError> {
        if period < 1 {
            return Err(BacktestError::Configuration(
                "SMA period must be >= 1".into(),
            ));
        }
        Ok(Self {
            period,
            name: format!("sma_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let mut sum: f64 = bars.iter().take(self.period).map(|b| b.close).sum();
        result[self.period - 1] = sum / self.period as f64;

        // Roll the window forward. Bars are validated upstream, so no NaN scan.
        for i in self.period..n {
            sum += bars[i].close - bars[i - self.period].close;
            result[i] = sum / self.period as f64;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let sma = Sma::new(5).unwrap();
        let result = sma.compute(&bars);

        assert_eq!(result.len(), 7);
        for v in result.iter().take(4) {
            assert!(v.is_nan());
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1).unwrap().compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_zero_period_is_config_error() {
        assert!(matches!(
            Sma::new(0),
            Err(BacktestError::Configuration(_))
        ));
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(20).unwrap().lookback(), 19);
        assert_eq!(Sma::new(1).unwrap().lookback(), 0);
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        let result = Sma::new(5).unwrap().compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
