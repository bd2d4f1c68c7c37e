//! TradeLab Core: bar series, strategies, execution simulator, metrics.
//!
//! This crate contains the single-instrument backtest pipeline:
//! - Domain types (bars, series, signals, fills, positions, trades)
//! - Indicators over closes (SMA, RSI)
//! - Signal generators behind the `SignalGenerator` trait
//! - Bar-by-bar execution simulator with commission and cash constraints
//! - Pure performance metrics
//!
//! Data loading, batching and reporting live in `tradelab-runner`.

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod strategy;

pub use error::BacktestError;
