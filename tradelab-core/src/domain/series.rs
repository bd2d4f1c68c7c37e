//! BarSeries: a validated, time-ordered sequence of bars for one symbol.
//!
//! This is the input contract for everything downstream. Construction is the
//! only place validation happens; once built, a series is immutable.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::bar::Bar;
use crate::error::BacktestError;

#[derive(Debug, Clone, Serialize)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate and wrap a bar sequence.
    ///
    /// Fails with `InvalidInput` if the sequence is empty, any bar is not sane,
    /// or timestamps are not strictly increasing.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BacktestError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(BacktestError::InvalidInput(format!(
                "{symbol}: bar series is empty"
            )));
        }

        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(BacktestError::InvalidInput(format!(
                    "{symbol}: bar {i} at {} fails OHLCV sanity check",
                    bar.timestamp
                )));
            }
        }

        if let Some(i) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(BacktestError::InvalidInput(format!(
                "{symbol}: timestamps not strictly increasing at bar {} ({} after {})",
                i + 1,
                bars[i + 1].timestamp,
                bars[i].timestamp
            )));
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// Position of the bar with exactly this timestamp.
    pub fn index_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.bars
            .binary_search_by(|bar| bar.timestamp.cmp(&timestamp))
            .ok()
    }

    /// Bar with exactly this timestamp.
    pub fn at(&self, timestamp: NaiveDateTime) -> Option<&Bar> {
        self.index_of(timestamp).map(|i| &self.bars[i])
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    /// A new series holding the first `len` bars (clamped to at least one).
    pub fn truncated(&self, len: usize) -> Self {
        let len = len.clamp(1, self.bars.len());
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[..len].to_vec(),
        }
    }
}
