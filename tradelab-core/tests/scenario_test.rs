//! End-to-end scenarios: strategy → simulator → metrics on tiny hand-checked series.

use chrono::NaiveDate;
use tradelab_core::domain::{Bar, BarSeries, Signal};
use tradelab_core::engine::{simulate, SimConfig};
use tradelab_core::metrics::{PerformanceRecord, DEFAULT_PERIODS_PER_YEAR};
use tradelab_core::strategy::{
    BuyAndHold, MaRsiCrossover, OrderSizing, PercentDrop, SignalGenerator,
};
use tradelab_core::BacktestError;

fn series(closes: &[f64]) -> BarSeries {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: base + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        })
        .collect();
    BarSeries::new("SCN", bars).unwrap()
}

fn run(
    series: &BarSeries,
    generator: &dyn SignalGenerator,
    config: &SimConfig,
) -> PerformanceRecord {
    let signals = generator.generate(series).unwrap();
    let result = simulate(series, &signals, generator.sizing(), config).unwrap();
    PerformanceRecord::compute(
        series,
        generator.name(),
        &result,
        config.initial_cash,
        DEFAULT_PERIODS_PER_YEAR,
    )
}

#[test]
fn buy_and_hold_marks_to_market() {
    let s = series(&[100.0, 90.0, 120.0]);
    let config = SimConfig::new(1000.0, 0.0);
    let signals = BuyAndHold.generate(&s).unwrap();
    let result = simulate(&s, &signals, BuyAndHold.sizing(), &config).unwrap();
    assert_eq!(result.fills.len(), 1);
    assert_eq!(result.fills[0].bar_index, 0);
    assert_eq!(result.fills[0].quantity, 10.0);
    assert_eq!(result.final_cash, 0.0);

    let record = run(&s, &BuyAndHold, &config);
    assert_eq!(record.open_units, 10.0);
    assert!((record.final_equity - 1200.0).abs() < 1e-9);
    assert!((record.total_return_pct - 20.0).abs() < 1e-9);
    assert!((record.max_drawdown_pct - 10.0).abs() < 1e-9);
    assert_eq!(record.trade_count, 0);
    assert_eq!(record.strategy, "buy_and_hold");
    assert_eq!(record.bar_count, 3);
}

#[test]
fn crossover_without_rsi_buys_on_separation() {
    let s = series(&[100.0, 90.0, 120.0]);
    let strat = MaRsiCrossover::new(1, 2, 14, 0.0, 100.0).unwrap();
    let signals = strat.generate(&s).unwrap();
    assert_eq!(signals, vec![Signal::HOLD, Signal::HOLD, Signal::BUY]);

    let result = simulate(&s, &signals, strat.sizing(), &SimConfig::new(1000.0, 0.0)).unwrap();
    assert_eq!(result.fills.len(), 1);
    assert_eq!(result.fills[0].bar_index, 2);
}

#[test]
fn percent_drop_buys_once_then_holds() {
    let s = series(&[100.0, 94.0, 94.0]);
    let strat = PercentDrop::new(0.05, 100.0).unwrap();
    let steps = strat.trace(&s).unwrap();
    assert_eq!(steps[1].signal, Signal::buy(6));
    assert_eq!(steps[2].signal, Signal::HOLD);
    assert!((steps[2].avg_price - 94.0).abs() < 1e-12);

    let record = run(&s, &strat, &SimConfig::new(1000.0, 0.0));
    assert_eq!(record.open_units, 6.0);
    assert_eq!(record.rejected_orders, 0);
}

#[test]
fn commission_round_trip() {
    let s = series(&[100.0, 110.0]);
    let signals = [Signal::buy(10), Signal::sell(10)];
    let config = SimConfig::new(10_000.0, 0.01);
    let result = simulate(&s, &signals, OrderSizing::Units, &config).unwrap();

    assert_eq!(result.trades.len(), 1);
    assert!((result.trades[0].net_pnl - 79.0).abs() < 1e-9);
    assert!((result.total_commission - 21.0).abs() < 1e-9);
    assert!((result.final_equity - 10_079.0).abs() < 1e-9);
}

#[test]
fn single_bar_has_zero_trade_metrics() {
    let s = series(&[50.0]);
    let record = run(&s, &BuyAndHold, &SimConfig::new(1000.0, 0.0));
    assert_eq!(record.trade_count, 0);
    assert_eq!(record.win_rate_pct, 0.0);
    assert_eq!(record.profit_factor, 0.0);
    assert_eq!(record.sharpe, 0.0);
    assert_eq!(record.max_drawdown_pct, 0.0);
    assert_eq!(record.start, record.end);
}

#[test]
fn rejected_buy_leaves_cash_untouched() {
    let s = series(&[100.0, 100.0]);
    let signals = [Signal::buy(50), Signal::HOLD];
    let result = simulate(&s, &signals, OrderSizing::Units, &SimConfig::new(1000.0, 0.0)).unwrap();
    assert_eq!(result.rejected_orders, 1);
    assert!(result.fills.is_empty());
    assert_eq!(result.final_cash, 1000.0);
    assert_eq!(result.equity_curve, vec![1000.0, 1000.0]);
}

#[test]
fn empty_series_is_invalid_input() {
    let err = BarSeries::new("SCN", Vec::new()).unwrap_err();
    assert!(matches!(err, BacktestError::InvalidInput(_)));
}
