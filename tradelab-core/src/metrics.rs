//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar
//! out. None of them fail; degenerate inputs map to 0.0.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{BarSeries, TradeRecord};
use crate::engine::SimulationResult;

/// Annualization factor for daily bars.
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

/// Standard deviations below this are treated as zero.
const STD_EPSILON: f64 = 1e-12;

/// Summary of one instrument's backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub symbol: String,
    pub strategy: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub bar_count: usize,

    // ── Equity ──
    pub initial_cash: f64,
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub sharpe: f64,
    /// Positive number: 12.5 means a 12.5% peak-to-trough decline.
    pub max_drawdown_pct: f64,

    // ── Trades ──
    pub win_rate_pct: f64,
    pub trade_count: usize,
    pub profit_factor: f64,
    pub avg_trade: f64,
    pub best_trade: f64,
    pub worst_trade: f64,

    // ── Costs and leftovers ──
    pub total_commission: f64,
    pub rejected_orders: usize,
    pub open_units: f64,
}

impl PerformanceRecord {
    /// Compute all metrics from a finished simulation.
    pub fn compute(
        series: &BarSeries,
        strategy: &str,
        result: &SimulationResult,
        initial_cash: f64,
        periods_per_year: u32,
    ) -> Self {
        let trades = &result.trades;
        Self {
            symbol: series.symbol().to_string(),
            strategy: strategy.to_string(),
            start: series.first().timestamp,
            end: series.last().timestamp,
            bar_count: series.len(),
            initial_cash,
            final_equity: result.final_equity,
            total_return_pct: total_return_pct(result.final_equity, initial_cash),
            sharpe: sharpe_ratio(&result.equity_curve, periods_per_year),
            max_drawdown_pct: max_drawdown_pct(&result.equity_curve),
            win_rate_pct: win_rate_pct(trades),
            trade_count: trades.len(),
            profit_factor: profit_factor(trades),
            avg_trade: avg_trade(trades),
            best_trade: best_trade(trades),
            worst_trade: worst_trade(trades),
            total_commission: result.total_commission,
            rejected_orders: result.rejected_orders,
            open_units: result.open_units(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return in percent of the starting cash.
pub fn total_return_pct(final_equity: f64, initial_cash: f64) -> f64 {
    if initial_cash <= 0.0 {
        return 0.0;
    }
    (final_equity - initial_cash) / initial_cash * 100.0
}

/// Annualized Sharpe ratio of per-bar simple returns, zero risk-free rate.
///
/// Sharpe = mean(r) / sample_std(r) * sqrt(periods_per_year).
/// Returns 0.0 with fewer than two returns or zero variance.
pub fn sharpe_ratio(equity_curve: &[f64], periods_per_year: u32) -> f64 {
    let returns = period_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < STD_EPSILON {
        return 0.0;
    }
    mean(&returns) / std * f64::from(periods_per_year).sqrt()
}

/// Maximum drawdown in percent, as a positive number.
///
/// Returns 0.0 if equity never falls below a previous peak.
pub fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - eq) / peak);
        }
    }
    max_dd * 100.0
}

/// Share of trades with positive net P&L, in percent.
pub fn win_rate_pct(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64 * 100.0
}

/// Gross profit over gross loss.
///
/// 0.0 when there is no losing trade (including no trades at all).
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl.abs())
        .sum();

    if gross_loss <= 0.0 {
        return 0.0;
    }
    gross_profit / gross_loss
}

pub fn avg_trade(trades: &[TradeRecord]) -> f64 {
    let pnls: Vec<f64> = trades.iter().map(|t| t.net_pnl).collect();
    mean(&pnls)
}

pub fn best_trade(trades: &[TradeRecord]) -> f64 {
    trades
        .iter()
        .map(|t| t.net_pnl)
        .reduce(f64::max)
        .unwrap_or(0.0)
}

pub fn worst_trade(trades: &[TradeRecord]) -> f64 {
    trades
        .iter()
        .map(|t| t.net_pnl)
        .reduce(f64::min)
        .unwrap_or(0.0)
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Simple returns between consecutive equity values.
pub fn period_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
