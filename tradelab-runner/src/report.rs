//! Report artifacts: JSON summaries, a CSV results table, console tables.
//!
//! File names carry a local timestamp (`%Y%m%d_%H%M%S`) so successive runs
//! never overwrite each other. All JSON artifacts include `schema_version`;
//! newer versions are rejected on load.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::compare::StrategyComparison;
use crate::config::{BacktestConfig, RunId};
use crate::runner::{BatchReport, SymbolOutcome};

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported schema version {found} (max supported: {max})", max = SCHEMA_VERSION)]
    SchemaVersion { found: u32 },
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Persisted form of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchArtifact {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub generated_at: NaiveDateTime,
    pub configuration: BacktestConfig,
    pub report: BatchReport,
}

/// Persisted form of a strategy comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonArtifact {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub generated_at: NaiveDateTime,
    pub configuration: BacktestConfig,
    pub comparison: StrategyComparison,
}

// ─── JSON ───────────────────────────────────────────────────────────

/// Write `backtest_summary_<timestamp>.json` into `dir`.
pub fn write_batch_report(
    dir: &Path,
    config: &BacktestConfig,
    report: &BatchReport,
) -> Result<PathBuf, ReportError> {
    let now = Local::now();
    let artifact = BatchArtifact {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        generated_at: now.naive_local(),
        configuration: config.clone(),
        report: report.clone(),
    };
    let path = dir.join(format!(
        "backtest_summary_{}.json",
        now.format(TIMESTAMP_FORMAT)
    ));
    write_json(&path, &artifact)?;
    info!(path = %path.display(), "Wrote batch summary");
    Ok(path)
}

/// Write `strategy_comparison_<timestamp>.json` into `dir`.
pub fn write_comparison(
    dir: &Path,
    config: &BacktestConfig,
    comparison: &StrategyComparison,
) -> Result<PathBuf, ReportError> {
    let now = Local::now();
    let artifact = ComparisonArtifact {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        generated_at: now.naive_local(),
        configuration: config.clone(),
        comparison: comparison.clone(),
    };
    let path = dir.join(format!(
        "strategy_comparison_{}.json",
        now.format(TIMESTAMP_FORMAT)
    ));
    write_json(&path, &artifact)?;
    info!(path = %path.display(), "Wrote strategy comparison");
    Ok(path)
}

/// Read a batch artifact back, rejecting unknown schema versions.
pub fn load_batch_report(path: &Path) -> Result<BatchArtifact, ReportError> {
    let json = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let artifact: BatchArtifact = serde_json::from_str(&json)?;
    if artifact.schema_version > SCHEMA_VERSION {
        return Err(ReportError::SchemaVersion {
            found: artifact.schema_version,
        });
    }
    Ok(artifact)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(io_err)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// One row per symbol; failed symbols carry the error kind and reason with
/// empty metrics.
pub fn export_results_csv(report: &BatchReport) -> Result<String, ReportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "status",
        "strategy",
        "total_return_pct",
        "sharpe",
        "max_drawdown_pct",
        "win_rate_pct",
        "trade_count",
        "profit_factor",
        "avg_trade",
        "best_trade",
        "worst_trade",
        "final_equity",
        "error_kind",
        "reason",
    ])?;

    for outcome in &report.outcomes {
        match outcome {
            SymbolOutcome::Completed(r) => wtr.write_record([
                r.symbol.clone(),
                "completed".into(),
                r.strategy.clone(),
                format!("{:.4}", r.total_return_pct),
                format!("{:.4}", r.sharpe),
                format!("{:.4}", r.max_drawdown_pct),
                format!("{:.2}", r.win_rate_pct),
                r.trade_count.to_string(),
                format!("{:.4}", r.profit_factor),
                format!("{:.2}", r.avg_trade),
                format!("{:.2}", r.best_trade),
                format!("{:.2}", r.worst_trade),
                format!("{:.2}", r.final_equity),
                String::new(),
                String::new(),
            ])?,
            SymbolOutcome::Failed {
                symbol,
                error_kind,
                reason,
            } => {
                let mut row = vec![symbol.clone(), "failed".into(), report.strategy.clone()];
                row.extend(std::iter::repeat(String::new()).take(10));
                row.push(error_kind.clone());
                row.push(reason.clone());
                wtr.write_record(&row)?;
            }
        }
    }

    let bytes = wtr.into_inner().map_err(|e| ReportError::Io {
        path: PathBuf::from("<memory>"),
        source: e.into_error(),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write `backtest_results_<timestamp>.csv` into `dir`.
pub fn write_results_csv(dir: &Path, report: &BatchReport) -> Result<PathBuf, ReportError> {
    let path = dir.join(format!(
        "backtest_results_{}.csv",
        Local::now().format(TIMESTAMP_FORMAT)
    ));
    let csv = export_results_csv(report)?;
    let io_err = |source| ReportError::Io {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    std::fs::write(&path, csv).map_err(io_err)?;
    Ok(path)
}

// ─── Console tables ─────────────────────────────────────────────────

/// Plain-text per-symbol table followed by the batch summary.
pub fn render_batch(report: &BatchReport) -> String {
    let mut out = String::with_capacity(256 + report.outcomes.len() * 96);
    out.push_str(&format!("Strategy: {}\n\n", report.strategy));
    out.push_str(&format!(
        "{:<12} {:>10} {:>8} {:>8} {:>8} {:>7} {:>8}\n",
        "Symbol", "Return %", "Sharpe", "MaxDD %", "Win %", "Trades", "PF"
    ));
    out.push_str(&"-".repeat(67));
    out.push('\n');

    for outcome in &report.outcomes {
        match outcome {
            SymbolOutcome::Completed(r) => out.push_str(&format!(
                "{:<12} {:>10.2} {:>8.2} {:>8.2} {:>8.1} {:>7} {:>8.2}\n",
                r.symbol,
                r.total_return_pct,
                r.sharpe,
                r.max_drawdown_pct,
                r.win_rate_pct,
                r.trade_count,
                r.profit_factor
            )),
            SymbolOutcome::Failed {
                symbol,
                error_kind,
                reason,
            } => out.push_str(&format!("{symbol:<12} FAILED ({error_kind}): {reason}\n")),
        }
    }

    let s = &report.summary;
    out.push_str(&format!(
        "\n{} symbols: {} succeeded, {} failed\n",
        s.total, s.succeeded, s.failed
    ));
    out.push_str(&format!(
        "Average return {:.2}%  Sharpe {:.2}  max drawdown {:.2}%\n",
        s.average_return_pct, s.average_sharpe, s.average_max_drawdown_pct
    ));
    if let (Some(best), Some(worst)) = (&s.best, &s.worst) {
        out.push_str(&format!(
            "Best {} ({:.2}%), worst {} ({:.2}%)\n",
            best.symbol, best.total_return_pct, worst.symbol, worst.total_return_pct
        ));
    }
    out
}

pub fn render_comparison(comparison: &StrategyComparison) -> String {
    let mut out = String::with_capacity(512);
    out.push_str(&format!(
        "{:<18} {:>10} {:>10} {:>8} {:>9} {:>8}\n",
        "Strategy", "Avg Ret %", "Positive %", "Trades", "Avg DD %", "Sharpe"
    ));
    out.push_str(&"-".repeat(68));
    out.push('\n');
    for row in &comparison.strategies {
        out.push_str(&format!(
            "{:<18} {:>10.2} {:>10.1} {:>8} {:>9.2} {:>8.2}\n",
            row.strategy,
            row.average_return_pct,
            row.positive_rate_pct,
            row.total_trades,
            row.average_max_drawdown_pct,
            row.average_sharpe
        ));
    }
    if let Some(best) = comparison.best() {
        out.push_str(&format!("\nBest by average return: {}\n", best.strategy));
    }
    out
}
