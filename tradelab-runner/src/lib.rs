//! TradeLab Runner: batch orchestration over a directory of bar files.
//!
//! This crate builds on `tradelab-core` to provide:
//! - TOML configuration with a content-hash run id
//! - CSV loading with configurable column names
//! - Seeded random sampling of the data directory
//! - Parallel per-symbol batch runs with failure tallying
//! - Strategy comparison across the same symbols
//! - JSON/CSV report artifacts and console tables

pub mod compare;
pub mod config;
pub mod data_loader;
pub mod report;
pub mod runner;
pub mod sampler;

pub use compare::{compare_from_config, compare_strategies, StrategyComparison, StrategySummary};
pub use config::{BacktestConfig, BacktestSettings, ColumnMap, ConfigError, DataConfig, RunId};
pub use data_loader::{load_csv, load_dir, LoadError, SymbolInput};
pub use report::{write_batch_report, write_comparison, ReportError};
pub use runner::{
    run_batch, run_from_config, run_symbol, BatchReport, BatchSummary, RunError, SymbolOutcome,
};
pub use sampler::{sample_dir, sample_files, stage_sample, SampleError};
