//! Criterion benchmarks for TradeLab hot paths.
//!
//! Benchmarks:
//! 1. Simulator bar loop (precomputed signals)
//! 2. Signal generation per strategy
//! 3. Indicator compute (SMA, RSI)
//! 4. Full pipeline (generate → simulate → metrics)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tradelab_core::domain::{Bar, BarSeries, Signal};
use tradelab_core::engine::{simulate, SimConfig};
use tradelab_core::indicators::{Indicator, Rsi, Sma};
use tradelab_core::metrics::{PerformanceRecord, DEFAULT_PERIODS_PER_YEAR};
use tradelab_core::strategy::{OrderSizing, StrategyConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: close + 1.5,
                low: open - 1.5,
                close,
                volume: 1_000_000.0 + (i % 500_000) as f64,
            }
        })
        .collect()
}

fn make_series(n: usize) -> BarSeries {
    BarSeries::new("BENCH", make_bars(n)).unwrap()
}

/// Alternating buy/sell every 10 bars, so the loop exercises fills.
fn churn_signals(n: usize) -> Vec<Signal> {
    (0..n)
        .map(|i| match i % 20 {
            0 => Signal::BUY,
            10 => Signal::SELL,
            _ => Signal::HOLD,
        })
        .collect()
}

// ── 1. Simulator ─────────────────────────────────────────────────────

fn bench_simulator(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulator");
    let config = SimConfig::new(100_000.0, 0.001);

    for &bar_count in &[252, 1260, 2520] {
        let series = make_series(bar_count);
        let signals = churn_signals(bar_count);
        group.bench_with_input(
            BenchmarkId::new("all_in_churn", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    simulate(
                        black_box(&series),
                        black_box(&signals),
                        OrderSizing::AllIn,
                        black_box(&config),
                    )
                });
            },
        );
    }

    group.finish();
}

// ── 2. Signal generation ─────────────────────────────────────────────

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_generation");
    let series = make_series(2520);

    for config in StrategyConfig::all_defaults() {
        let generator = config.build().unwrap();
        group.bench_function(config.name(), |b| {
            b.iter(|| generator.generate(black_box(&series)));
        });
    }

    group.finish();
}

// ── 3. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_compute");

    for &bar_count in &[252, 2520] {
        let bars = make_bars(bar_count);
        let sma = Sma::new(50).unwrap();
        let rsi = Rsi::new(14).unwrap();
        group.bench_with_input(BenchmarkId::new("sma_50", bar_count), &bar_count, |b, _| {
            b.iter(|| sma.compute(black_box(&bars)));
        });
        group.bench_with_input(BenchmarkId::new("rsi_14", bar_count), &bar_count, |b, _| {
            b.iter(|| rsi.compute(black_box(&bars)));
        });
    }

    group.finish();
}

// ── 4. Full pipeline ─────────────────────────────────────────────────

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");
    let series = make_series(2520);
    let config = SimConfig::new(100_000.0, 0.001);
    let generator = StrategyConfig::ma_rsi_default().build().unwrap();

    group.bench_function("ma_rsi_2520_bars", |b| {
        b.iter(|| {
            let signals = generator.generate(black_box(&series)).unwrap();
            let result = simulate(&series, &signals, generator.sizing(), &config).unwrap();
            PerformanceRecord::compute(
                &series,
                generator.name(),
                &result,
                config.initial_cash,
                DEFAULT_PERIODS_PER_YEAR,
            )
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_simulator,
    bench_strategies,
    bench_indicators,
    bench_pipeline,
);
criterion_main!(benches);
