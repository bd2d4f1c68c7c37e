//! Bar-by-bar execution simulator.
//!
//! Per bar, in order:
//! 1. Read the bar's signal and size an order from it (see [`OrderSizing`]).
//! 2. Fill at the bar's close, debit commission, update the holding.
//! 3. Mark to market and record equity.
//!
//! At most one fill happens per bar. Unaffordable buys are rejected and
//! counted, never clipped and never fatal.

use tracing::debug;

use crate::domain::{Bar, BarSeries, Fill, OrderSide, Portfolio, Signal, TradeRecord};
use crate::error::BacktestError;
use crate::strategy::{whole_units, OrderSizing};

use super::portfolio_update::apply_fill;
use super::state::{SimConfig, SimulationResult};

/// Simulate one instrument.
///
/// `signals` must hold one entry per bar of `series`.
pub fn simulate(
    series: &BarSeries,
    signals: &[Signal],
    sizing: OrderSizing,
    config: &SimConfig,
) -> Result<SimulationResult, BacktestError> {
    config.validate()?;
    if series.is_empty() {
        return Err(BacktestError::InvalidInput(format!(
            "{}: empty bar series",
            series.symbol()
        )));
    }
    if signals.len() != series.len() {
        return Err(BacktestError::InvalidInput(format!(
            "{}: {} signals for {} bars",
            series.symbol(),
            signals.len(),
            series.len()
        )));
    }

    let mut portfolio = Portfolio::new(config.initial_cash);
    let mut equity_curve = Vec::with_capacity(series.len());
    let mut fills: Vec<Fill> = Vec::new();
    let mut trades: Vec<TradeRecord> = Vec::new();
    let mut rejected_orders = 0usize;

    for (t, (bar, &signal)) in series.bars().iter().zip(signals).enumerate() {
        let price = bar.close;
        ensure_finite(t, "close", price)?;

        if let Some(fill) = match order_for(signal, sizing, &portfolio, bar, t, config) {
            Order::Fill(fill) => Some(fill),
            Order::Rejected { units } => {
                rejected_orders += 1;
                debug!(
                    symbol = series.symbol(),
                    bar = t,
                    units,
                    price,
                    cash = portfolio.cash,
                    "Buy rejected: insufficient cash"
                );
                None
            }
            Order::None => None,
        } {
            ensure_finite(t, "fill price", fill.price)?;
            if let Some(trade) = apply_fill(&fill, &mut portfolio) {
                trades.push(trade);
            }
            fills.push(fill);
            ensure_finite(t, "cash", portfolio.cash)?;
        }

        let equity = portfolio.equity(price);
        ensure_finite(t, "equity", equity)?;
        equity_curve.push(equity);
    }

    let last_index = series.len() - 1;
    if config.close_open_at_end {
        if let Some(pos) = portfolio.position.as_ref() {
            let fill = make_fill(series.last(), last_index, OrderSide::Sell, pos.quantity, config);
            if let Some(trade) = apply_fill(&fill, &mut portfolio) {
                trades.push(trade);
            }
            fills.push(fill);
            let equity = portfolio.cash;
            ensure_finite(last_index, "equity", equity)?;
            if let Some(slot) = equity_curve.last_mut() {
                *slot = equity;
            }
        }
    }

    let final_equity = equity_curve.last().copied().unwrap_or(config.initial_cash);
    Ok(SimulationResult {
        equity_curve,
        fills,
        trades,
        open_position: portfolio.position.clone(),
        final_cash: portfolio.cash,
        final_equity,
        total_commission: portfolio.total_commission,
        rejected_orders,
    })
}

// ─── Order sizing ────────────────────────────────────────────────────

enum Order {
    None,
    Fill(Fill),
    Rejected { units: u64 },
}

fn order_for(
    signal: Signal,
    sizing: OrderSizing,
    portfolio: &Portfolio,
    bar: &Bar,
    t: usize,
    config: &SimConfig,
) -> Order {
    if signal.is_buy() {
        let cash = portfolio.cash;
        // Affordability is judged on the exact amount `apply_fill` debits.
        let buy = |units: u64| make_fill(bar, t, OrderSide::Buy, units as f64, config);
        let fill = match sizing {
            OrderSizing::AllIn => {
                if !portfolio.is_flat() {
                    return Order::None;
                }
                let unit_cost = bar.close * (1.0 + config.commission);
                let mut units = whole_units(cash / unit_cost);
                while units > 0 && buy(units).net_amount() > cash {
                    units -= 1;
                }
                if units == 0 {
                    return Order::Rejected { units: 0 };
                }
                buy(units)
            }
            OrderSizing::Units => {
                let units = signal.units();
                let fill = buy(units);
                if fill.net_amount() > cash {
                    return Order::Rejected { units };
                }
                fill
            }
        };
        return Order::Fill(fill);
    }

    if signal.is_sell() {
        let held = portfolio.units();
        if held <= 0.0 {
            return Order::None;
        }
        let quantity = match sizing {
            OrderSizing::AllIn => held,
            OrderSizing::Units => held.min(signal.units() as f64),
        };
        return Order::Fill(make_fill(bar, t, OrderSide::Sell, quantity, config));
    }

    Order::None
}

fn make_fill(bar: &Bar, t: usize, side: OrderSide, quantity: f64, config: &SimConfig) -> Fill {
    Fill {
        bar_index: t,
        timestamp: bar.timestamp,
        side,
        price: bar.close,
        quantity,
        commission: bar.close * quantity * config.commission,
    }
}

fn ensure_finite(bar_index: usize, what: &str, value: f64) -> Result<(), BacktestError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BacktestError::NumericDegeneracy {
            bar_index,
            detail: format!("{what} is {value}"),
        })
    }
}
