//! Batch runner: wires strategy, simulator and metrics per symbol.
//!
//! Entry points:
//! - `run_symbol()`: one pre-loaded series through the full pipeline.
//! - `run_batch()`: every loaded symbol, in parallel on the rayon pool
//!   unless `parallel = false`. Failures become `SymbolOutcome::Failed`.
//! - `run_from_config()`: load (and optionally sample) the data directory,
//!   then `run_batch()`. Used by the CLI.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use tradelab_core::domain::BarSeries;
use tradelab_core::engine::simulate;
use tradelab_core::metrics::PerformanceRecord;
use tradelab_core::strategy::StrategyConfig;
use tradelab_core::BacktestError;

use crate::config::{BacktestConfig, BacktestSettings, ConfigError};
use crate::data_loader::{list_data_files, load_files, LoadError, SymbolInput};
use crate::report::ReportError;
use crate::sampler::{sample_files, SampleError};

/// Errors that stop a whole run. Per-symbol failures never do.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("sampling error: {0}")]
    Sample(#[from] SampleError),
    #[error("report error: {0}")]
    Report(#[from] ReportError),
    #[error("strategy error: {0}")]
    Strategy(#[from] BacktestError),
    #[error("no data files with extension '{extension}' in {dir}")]
    NoData { dir: String, extension: String },
}

/// `error_kind` of a symbol whose data could not be loaded.
pub const LOAD_ERROR_KIND: &str = "load";

/// Result of one symbol's pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Completed(PerformanceRecord),
    Failed {
        symbol: String,
        /// `load` for unreadable data, otherwise the backtest error tag.
        #[serde(default)]
        error_kind: String,
        reason: String,
    },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolOutcome::Completed(record) => &record.symbol,
            SymbolOutcome::Failed { symbol, .. } => symbol,
        }
    }

    pub fn record(&self) -> Option<&PerformanceRecord> {
        match self {
            SymbolOutcome::Completed(record) => Some(record),
            SymbolOutcome::Failed { .. } => None,
        }
    }
}

/// Aggregates over the completed symbols of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub average_return_pct: f64,
    pub average_sharpe: f64,
    pub average_max_drawdown_pct: f64,
    /// Highest total return; `None` when nothing completed.
    pub best: Option<SymbolReturn>,
    pub worst: Option<SymbolReturn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReturn {
    pub symbol: String,
    pub total_return_pct: f64,
}

/// Every symbol's outcome plus the batch summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub strategy: String,
    pub summary: BatchSummary,
    /// Sorted by symbol; each symbol appears exactly once.
    pub outcomes: Vec<SymbolOutcome>,
}

impl BatchReport {
    pub fn records(&self) -> impl Iterator<Item = &PerformanceRecord> {
        self.outcomes.iter().filter_map(SymbolOutcome::record)
    }
}

/// Run one symbol: generate signals, simulate, compute metrics.
pub fn run_symbol(
    series: &BarSeries,
    strategy: &StrategyConfig,
    settings: &BacktestSettings,
) -> Result<PerformanceRecord, BacktestError> {
    let generator = strategy.build()?;
    let signals = generator.generate(series)?;
    let sim_config = settings.sim_config();
    let result = simulate(series, &signals, generator.sizing(), &sim_config)?;
    Ok(PerformanceRecord::compute(
        series,
        generator.name(),
        &result,
        settings.initial_cash,
        settings.periods_per_year,
    ))
}

fn run_input(
    input: &SymbolInput,
    strategy: &StrategyConfig,
    settings: &BacktestSettings,
) -> SymbolOutcome {
    let outcome = match &input.series {
        Ok(series) => match run_symbol(series, strategy, settings) {
            Ok(record) => SymbolOutcome::Completed(record),
            Err(e) => SymbolOutcome::Failed {
                symbol: input.symbol.clone(),
                error_kind: e.kind().to_string(),
                reason: e.to_string(),
            },
        },
        Err(e) => SymbolOutcome::Failed {
            symbol: input.symbol.clone(),
            error_kind: LOAD_ERROR_KIND.to_string(),
            reason: e.to_string(),
        },
    };

    match &outcome {
        SymbolOutcome::Completed(r) => info!(
            symbol = %r.symbol,
            strategy = %r.strategy,
            return_pct = r.total_return_pct,
            sharpe = r.sharpe,
            trades = r.trade_count,
            "Backtest complete"
        ),
        SymbolOutcome::Failed {
            symbol,
            error_kind,
            reason,
        } => warn!(
            symbol = %symbol,
            kind = %error_kind,
            reason = %reason,
            "Backtest failed"
        ),
    }
    outcome
}

/// Run every input through the pipeline and summarize.
pub fn run_batch(
    inputs: &[SymbolInput],
    strategy: &StrategyConfig,
    settings: &BacktestSettings,
) -> BatchReport {
    info!(
        strategy = strategy.name(),
        symbols = inputs.len(),
        parallel = settings.parallel,
        "Starting batch"
    );

    let mut outcomes: Vec<SymbolOutcome> = if settings.parallel {
        inputs
            .par_iter()
            .map(|input| run_input(input, strategy, settings))
            .collect()
    } else {
        inputs
            .iter()
            .map(|input| run_input(input, strategy, settings))
            .collect()
    };
    outcomes.sort_by(|a, b| a.symbol().cmp(b.symbol()));

    let summary = summarize(&outcomes);
    info!(
        strategy = strategy.name(),
        succeeded = summary.succeeded,
        failed = summary.failed,
        average_return_pct = summary.average_return_pct,
        "Batch finished"
    );

    BatchReport {
        strategy: strategy.name().to_string(),
        summary,
        outcomes,
    }
}

/// Resolve the data files a config points at, sampling if requested.
pub fn resolve_files(config: &BacktestConfig) -> Result<Vec<std::path::PathBuf>, RunError> {
    let data = &config.data;
    let files = list_data_files(&data.dir, &data.extension)?;
    if files.is_empty() {
        return Err(RunError::NoData {
            dir: data.dir.display().to_string(),
            extension: data.extension.clone(),
        });
    }
    match data.sample {
        Some(count) => Ok(sample_files(&files, count, data.seed)?),
        None => Ok(files),
    }
}

/// Load the configured data and run the configured strategy over it.
pub fn run_from_config(config: &BacktestConfig) -> Result<BatchReport, RunError> {
    config.validate()?;
    let files = resolve_files(config)?;
    let inputs = load_files(&files, &config.data.columns);
    Ok(run_batch(&inputs, &config.strategy, &config.backtest))
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn summarize(outcomes: &[SymbolOutcome]) -> BatchSummary {
    let records: Vec<&PerformanceRecord> =
        outcomes.iter().filter_map(SymbolOutcome::record).collect();
    let n = records.len();
    let average = |f: fn(&PerformanceRecord) -> f64| {
        if n == 0 {
            0.0
        } else {
            records.iter().map(|r| f(r)).sum::<f64>() / n as f64
        }
    };

    let by_return = |a: &&&PerformanceRecord, b: &&&PerformanceRecord| {
        a.total_return_pct.total_cmp(&b.total_return_pct)
    };
    let to_entry = |r: &&PerformanceRecord| SymbolReturn {
        symbol: r.symbol.clone(),
        total_return_pct: r.total_return_pct,
    };

    BatchSummary {
        total: outcomes.len(),
        succeeded: n,
        failed: outcomes.len() - n,
        average_return_pct: average(|r| r.total_return_pct),
        average_sharpe: average(|r| r.sharpe),
        average_max_drawdown_pct: average(|r| r.max_drawdown_pct),
        best: records.iter().max_by(by_return).map(to_entry),
        worst: records.iter().min_by(by_return).map(to_entry),
    }
}
