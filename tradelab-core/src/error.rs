//! Error taxonomy for a single instrument's backtest.
//!
//! Every variant is fatal to the instrument it occurred on and to nothing else.
//! The runner converts these into failed outcomes; a batch never aborts on them.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    /// Malformed or insufficient bar series, or a signal sequence whose length
    /// does not match the bars.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A fill or equity computation produced NaN or infinity.
    #[error("numeric degeneracy at bar {bar_index}: {detail}")]
    NumericDegeneracy { bar_index: usize, detail: String },

    /// A strategy or simulator parameter outside its valid domain.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BacktestError {
    /// Short machine-readable tag, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            BacktestError::InvalidInput(_) => "invalid_input",
            BacktestError::NumericDegeneracy { .. } => "numeric_degeneracy",
            BacktestError::Configuration(_) => "configuration",
        }
    }
}
