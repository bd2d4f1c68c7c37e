//! Buy-and-hold: enter fully on the first bar, never sell.
//!
//! The terminal holding is marked to market by the simulator rather than
//! closed by a signal.

use super::{ensure_non_empty, OrderSizing, SignalGenerator};
use crate::domain::{BarSeries, Signal};
use crate::error::BacktestError;

#[derive(Debug, Clone, Default)]
pub struct BuyAndHold;

impl SignalGenerator for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn sizing(&self) -> OrderSizing {
        OrderSizing::AllIn
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn generate(&self, series: &BarSeries) -> Result<Vec<Signal>, BacktestError> {
        ensure_non_empty(series)?;
        let mut signals = vec![Signal::HOLD; series.len()];
        signals[0] = Signal::BUY;
        Ok(signals)
    }
}
