//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! [backtest]
//! initial_cash = 100000.0
//! commission = 0.001
//!
//! [strategy]
//! type = "MA_RSI_CROSSOVER"
//! fast_period = 20
//! slow_period = 50
//!
//! [data]
//! dir = "test data"
//! sample = 10
//! seed = 42
//! ```
//!
//! Every section and field has a default, so an empty file is a valid
//! buy-and-hold run over `test data/*.csv`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradelab_core::engine::SimConfig;
use tradelab_core::metrics::DEFAULT_PERIODS_PER_YEAR;
use tradelab_core::strategy::StrategyConfig;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSettings,

    #[serde(default = "default_strategy")]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub data: DataConfig,
}

fn default_strategy() -> StrategyConfig {
    StrategyConfig::BuyAndHold
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            backtest: BacktestSettings::default(),
            strategy: default_strategy(),
            data: DataConfig::default(),
        }
    }
}

/// Simulator and metric settings shared by every symbol in the batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSettings {
    #[serde(default = "defaults::initial_cash")]
    pub initial_cash: f64,

    #[serde(default = "defaults::commission")]
    pub commission: f64,

    /// Annualization factor for the Sharpe ratio.
    #[serde(default = "defaults::periods_per_year")]
    pub periods_per_year: u32,

    #[serde(default)]
    pub close_open_at_end: bool,

    /// Run symbols on the rayon pool instead of one after another.
    #[serde(default = "defaults::parallel")]
    pub parallel: bool,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_cash: defaults::initial_cash(),
            commission: defaults::commission(),
            periods_per_year: defaults::periods_per_year(),
            close_open_at_end: false,
            parallel: defaults::parallel(),
        }
    }
}

impl BacktestSettings {
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            initial_cash: self.initial_cash,
            commission: self.commission,
            close_open_at_end: self.close_open_at_end,
        }
    }
}

/// Where the bar files live and how to read them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    #[serde(default = "defaults::data_dir")]
    pub dir: PathBuf,

    /// File extension without the dot.
    #[serde(default = "defaults::extension")]
    pub extension: String,

    /// Pick this many files at random instead of the whole directory.
    #[serde(default)]
    pub sample: Option<usize>,

    /// Sampler seed; a fresh random seed when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub columns: ColumnMap,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: defaults::data_dir(),
            extension: defaults::extension(),
            sample: None,
            seed: None,
            columns: ColumnMap::default(),
        }
    }
}

/// CSV header names for each bar field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnMap {
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            date: "Date".into(),
            open: "Open".into(),
            high: "High".into(),
            low: "Low".into(),
            close: "Close".into(),
            volume: "Volume".into(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn initial_cash() -> f64 {
        100_000.0
    }
    pub fn commission() -> f64 {
        0.001
    }
    pub fn periods_per_year() -> u32 {
        super::DEFAULT_PERIODS_PER_YEAR
    }
    pub fn parallel() -> bool {
        true
    }
    pub fn data_dir() -> PathBuf {
        PathBuf::from("test data")
    }
    pub fn extension() -> String {
        "csv".into()
    }
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if !bt.initial_cash.is_finite() || bt.initial_cash <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "backtest.initial_cash must be positive, got {}",
                bt.initial_cash
            )));
        }
        if !bt.commission.is_finite() || !(0.0..1.0).contains(&bt.commission) {
            return Err(ConfigError::Invalid(format!(
                "backtest.commission must be in [0, 1), got {}",
                bt.commission
            )));
        }
        if bt.periods_per_year == 0 {
            return Err(ConfigError::Invalid(
                "backtest.periods_per_year must be >= 1".into(),
            ));
        }
        if self.data.sample == Some(0) {
            return Err(ConfigError::Invalid("data.sample must be >= 1".into()));
        }
        if self.data.extension.is_empty() {
            return Err(ConfigError::Invalid("data.extension must not be empty".into()));
        }
        self.strategy
            .build()
            .map_err(|e| ConfigError::Invalid(format!("strategy: {e}")))?;
        Ok(())
    }

    /// Deterministic hash of the canonical JSON form.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[backtest]
initial_cash = 50000.0
commission = 0.002
periods_per_year = 52
close_open_at_end = true
parallel = false

[strategy]
type = "PERCENT_DROP"
threshold = 0.03
scale = 50.0

[data]
dir = "prices"
extension = "txt"
sample = 5
seed = 7

[data.columns]
date = "timestamp"
close = "adj_close"
"#;

    #[test]
    fn parses_full_file() {
        let config = BacktestConfig::from_toml(FULL).unwrap();
        assert_eq!(config.backtest.initial_cash, 50_000.0);
        assert_eq!(config.backtest.periods_per_year, 52);
        assert!(config.backtest.close_open_at_end);
        assert!(!config.backtest.parallel);
        assert_eq!(
            config.strategy,
            StrategyConfig::PercentDrop {
                threshold: 0.03,
                scale: 50.0
            }
        );
        assert_eq!(config.data.dir, PathBuf::from("prices"));
        assert_eq!(config.data.sample, Some(5));
        assert_eq!(config.data.seed, Some(7));
        assert_eq!(config.data.columns.date, "timestamp");
        assert_eq!(config.data.columns.close, "adj_close");
        // Unmapped columns keep their defaults.
        assert_eq!(config.data.columns.open, "Open");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = BacktestConfig::from_toml("").unwrap();
        assert_eq!(config, BacktestConfig::default());
        assert_eq!(config.strategy, StrategyConfig::BuyAndHold);
        assert_eq!(config.backtest.initial_cash, 100_000.0);
        assert_eq!(config.data.extension, "csv");
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_cash = "[backtest]\ninitial_cash = 0.0\n";
        assert!(matches!(
            BacktestConfig::from_toml(bad_cash),
            Err(ConfigError::Invalid(_))
        ));
        let bad_commission = "[backtest]\ncommission = 1.5\n";
        assert!(BacktestConfig::from_toml(bad_commission).is_err());
        let bad_periods = "[backtest]\nperiods_per_year = 0\n";
        assert!(BacktestConfig::from_toml(bad_periods).is_err());
        let bad_strategy =
            "[strategy]\ntype = \"MA_RSI_CROSSOVER\"\nfast_period = 50\nslow_period = 20\n";
        assert!(matches!(
            BacktestConfig::from_toml(bad_strategy),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_strategy_is_parse_error() {
        let toml = "[strategy]\ntype = \"MOMENTUM\"\n";
        assert!(matches!(
            BacktestConfig::from_toml(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let config = BacktestConfig::from_toml(FULL).unwrap();
        assert_eq!(config.run_id(), config.run_id());
        assert_eq!(config.run_id().len(), 64);

        let mut other = config.clone();
        other.backtest.commission = 0.0;
        assert_ne!(config.run_id(), other.run_id());
    }

    #[test]
    fn toml_roundtrip() {
        let config = BacktestConfig::from_toml(FULL).unwrap();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(BacktestConfig::from_toml(&text).unwrap(), config);
    }
}
