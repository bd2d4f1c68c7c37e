//! Side-by-side comparison of every strategy over the same symbols.
//!
//! Each strategy runs as its own batch over identical inputs; the
//! per-strategy rows are reduced from the completed records only.

use serde::{Deserialize, Serialize};
use tracing::info;

use tradelab_core::strategy::StrategyConfig;

use crate::config::{BacktestConfig, BacktestSettings};
use crate::data_loader::{load_files, SymbolInput};
use crate::runner::{resolve_files, run_batch, BatchReport, RunError};

/// One strategy's row in the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: String,
    pub symbols: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub average_return_pct: f64,
    /// Share of completed symbols that finished with a positive return.
    pub positive_rate_pct: f64,
    pub total_trades: usize,
    pub average_max_drawdown_pct: f64,
    pub average_sharpe: f64,
}

impl StrategySummary {
    pub fn from_report(report: &BatchReport) -> Self {
        let summary = &report.summary;
        let positive = report
            .records()
            .filter(|r| r.total_return_pct > 0.0)
            .count();
        let positive_rate_pct = if summary.succeeded == 0 {
            0.0
        } else {
            positive as f64 / summary.succeeded as f64 * 100.0
        };

        Self {
            strategy: report.strategy.clone(),
            symbols: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            average_return_pct: summary.average_return_pct,
            positive_rate_pct,
            total_trades: report.records().map(|r| r.trade_count).sum(),
            average_max_drawdown_pct: summary.average_max_drawdown_pct,
            average_sharpe: summary.average_sharpe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    /// Sorted by average return, best first.
    pub strategies: Vec<StrategySummary>,
}

impl StrategyComparison {
    pub fn best(&self) -> Option<&StrategySummary> {
        self.strategies.first()
    }
}

/// Every strategy with default parameters, except the configured one,
/// which keeps the parameters from the config.
pub fn strategies_for(config: &BacktestConfig) -> Vec<StrategyConfig> {
    StrategyConfig::all_defaults()
        .into_iter()
        .map(|default| {
            if default.name() == config.strategy.name() {
                config.strategy.clone()
            } else {
                default
            }
        })
        .collect()
}

/// Run each strategy over the same inputs.
pub fn compare_strategies(
    inputs: &[SymbolInput],
    strategies: &[StrategyConfig],
    settings: &BacktestSettings,
) -> StrategyComparison {
    let mut rows: Vec<StrategySummary> = strategies
        .iter()
        .map(|strategy| StrategySummary::from_report(&run_batch(inputs, strategy, settings)))
        .collect();
    rows.sort_by(|a, b| b.average_return_pct.total_cmp(&a.average_return_pct));

    if let Some(best) = rows.first() {
        info!(
            strategy = %best.strategy,
            average_return_pct = best.average_return_pct,
            "Best strategy by average return"
        );
    }
    StrategyComparison { strategies: rows }
}

/// Load the configured data once and compare every strategy over it.
pub fn compare_from_config(config: &BacktestConfig) -> Result<StrategyComparison, RunError> {
    config.validate()?;
    let files = resolve_files(config)?;
    let inputs = load_files(&files, &config.data.columns);
    Ok(compare_strategies(
        &inputs,
        &strategies_for(config),
        &config.backtest,
    ))
}
