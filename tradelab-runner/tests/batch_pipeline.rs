//! Integration tests for the runner pipeline on real files.
//!
//! Each test writes a small data directory with tempfile, then drives it
//! through config → load → batch → report the way the CLI does.

use std::path::Path;

use tradelab_core::strategy::StrategyConfig;
use tradelab_runner::data_loader::list_data_files;
use tradelab_runner::report::{load_batch_report, write_batch_report, write_comparison};
use tradelab_runner::{
    compare_from_config, run_from_config, sample_dir, BacktestConfig, RunError, SymbolOutcome,
};

fn write_csv(dir: &Path, symbol: &str, closes: &[f64]) {
    let mut text = String::from("Date,Open,High,Low,Close,Volume\n");
    let base = chrono::NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    for (i, close) in closes.iter().enumerate() {
        let day = base + chrono::Duration::days(i as i64);
        text.push_str(&format!(
            "{},{close},{},{},{close},1000\n",
            day.format("%Y-%m-%d"),
            close * 1.01,
            close * 0.99
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), text).unwrap();
}

fn wave(n: usize, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + ((i as f64) * 0.15 + phase).sin() * 12.0 + i as f64 * 0.05)
        .collect()
}

fn config_for(dir: &Path, strategy: &str) -> BacktestConfig {
    let toml = format!(
        "[backtest]\ninitial_cash = 10000.0\ncommission = 0.001\n\n\
         [strategy]\n{strategy}\n\n\
         [data]\ndir = {:?}\n",
        dir.display().to_string()
    );
    BacktestConfig::from_toml(&toml).unwrap()
}

#[test]
fn batch_with_failing_symbol_reports_every_symbol_once() {
    let data = tempfile::tempdir().unwrap();
    write_csv(data.path(), "AAA", &wave(120, 0.0));
    write_csv(data.path(), "BBB", &wave(120, 1.3));
    std::fs::write(data.path().join("BROKEN.csv"), "Date,Close\n2023-01-02,10\n").unwrap();
    std::fs::write(data.path().join("EMPTY.csv"), "Date,Open,High,Low,Close,Volume\n").unwrap();
    std::fs::write(data.path().join("notes.txt"), "ignored").unwrap();

    let config = config_for(data.path(), "type = \"MA_RSI_CROSSOVER\"\nfast_period = 5\nslow_period = 20");
    let report = run_from_config(&config).unwrap();

    let symbols: Vec<&str> = report.outcomes.iter().map(|o| o.symbol()).collect();
    assert_eq!(symbols, vec!["AAA", "BBB", "BROKEN", "EMPTY"]);
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.strategy, "ma_rsi_crossover");

    match &report.outcomes[2] {
        SymbolOutcome::Failed {
            error_kind, reason, ..
        } => {
            assert_eq!(error_kind, "load");
            assert!(reason.contains("missing column"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn overflowing_symbol_fails_while_others_complete() {
    let data = tempfile::tempdir().unwrap();
    write_csv(data.path(), "AAA", &wave(60, 0.0));
    write_csv(data.path(), "HUGE", &[1.0, 1.0, 1e300]);
    write_csv(data.path(), "ZZZ", &wave(60, 2.0));

    let mut config = config_for(data.path(), "type = \"BUY_AND_HOLD\"");
    config.backtest.initial_cash = 1e300;
    config.backtest.commission = 0.0;
    let report = run_from_config(&config).unwrap();

    let symbols: Vec<&str> = report.outcomes.iter().map(|o| o.symbol()).collect();
    assert_eq!(symbols, vec!["AAA", "HUGE", "ZZZ"]);
    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 1);

    match &report.outcomes[1] {
        SymbolOutcome::Failed {
            error_kind, reason, ..
        } => {
            assert_eq!(error_kind, "numeric_degeneracy");
            assert!(reason.contains("bar 2"), "{reason}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn sampled_run_is_reproducible() {
    let data = tempfile::tempdir().unwrap();
    for i in 0..10 {
        write_csv(data.path(), &format!("S{i:02}"), &wave(60, i as f64));
    }

    let mut config = config_for(data.path(), "type = \"BUY_AND_HOLD\"");
    config.data.sample = Some(4);
    config.data.seed = Some(99);

    let a = run_from_config(&config).unwrap();
    let b = run_from_config(&config).unwrap();
    assert_eq!(a.summary.total, 4);
    assert_eq!(a, b);

    let chosen = sample_dir(data.path(), "csv", 4, Some(99)).unwrap();
    let chosen: Vec<String> = chosen
        .iter()
        .map(|p| p.file_stem().unwrap().to_string_lossy().into_owned())
        .collect();
    let ran: Vec<&str> = a.outcomes.iter().map(|o| o.symbol()).collect();
    assert_eq!(chosen, ran);
}

#[test]
fn missing_data_dir_and_empty_dir_are_errors() {
    let data = tempfile::tempdir().unwrap();
    let config = config_for(&data.path().join("nope"), "type = \"BUY_AND_HOLD\"");
    assert!(matches!(run_from_config(&config), Err(RunError::Load(_))));

    let config = config_for(data.path(), "type = \"BUY_AND_HOLD\"");
    assert!(matches!(run_from_config(&config), Err(RunError::NoData { .. })));
}

#[test]
fn reports_land_in_output_dir() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_csv(data.path(), "AAA", &wave(80, 0.0));
    write_csv(data.path(), "BBB", &wave(80, 2.0));

    let config = config_for(data.path(), "type = \"PERCENT_DROP\"\nthreshold = 0.04");
    let report = run_from_config(&config).unwrap();
    let summary_path = write_batch_report(out.path(), &config, &report).unwrap();

    let loaded = load_batch_report(&summary_path).unwrap();
    assert_eq!(loaded.configuration, config);
    assert_eq!(loaded.report.outcomes.len(), 2);

    let comparison = compare_from_config(&config).unwrap();
    assert_eq!(comparison.strategies.len(), 4);
    assert!(comparison.strategies.iter().all(|s| s.symbols == 2));
    let percent_drop = comparison
        .strategies
        .iter()
        .find(|s| s.strategy == StrategyConfig::percent_drop_default().name())
        .unwrap();
    assert_eq!(percent_drop.succeeded, 2);

    write_comparison(out.path(), &config, &comparison).unwrap();
    let written = list_data_files(out.path(), "json").unwrap();
    assert_eq!(written.len(), 2);
}
