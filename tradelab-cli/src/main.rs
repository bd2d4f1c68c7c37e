//! TradeLab CLI: run, compare and sample commands.
//!
//! Commands:
//! - `run`: backtest one strategy over every (or a sampled subset of) data file
//! - `compare`: run all four strategies over the same files and rank them
//! - `sample`: print (and optionally stage) a random subset of data files
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` to override the
//! default `tradelab=info` filter.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tradelab_core::strategy::StrategyConfig;
use tradelab_runner::report::{render_batch, render_comparison, write_results_csv};
use tradelab_runner::{
    compare_from_config, run_from_config, sample_dir, stage_sample, write_batch_report,
    write_comparison, BacktestConfig,
};

#[derive(Parser)]
#[command(
    name = "tradelab",
    about = "TradeLab CLI: bar-by-bar strategy backtests over CSV price files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one strategy over a data directory.
    Run {
        #[command(flatten)]
        common: CommonArgs,

        /// Strategy with default parameters, overriding the config file:
        /// buy_and_hold, ma_rsi_crossover, percent_drop, fixed_step.
        #[arg(long)]
        strategy: Option<String>,

        /// Also write a per-symbol CSV results table.
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// Run every strategy over the same files and compare averages.
    Compare {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Pick a random subset of data files.
    Sample {
        /// Directory holding one file per symbol.
        #[arg(long, default_value = "test data")]
        data_dir: PathBuf,

        /// How many files to pick.
        #[arg(long)]
        count: usize,

        /// Seed for a reproducible pick.
        #[arg(long)]
        seed: Option<u64>,

        /// Data file extension.
        #[arg(long, default_value = "csv")]
        extension: String,

        /// Copy the picked files into this directory, replacing its data files.
        #[arg(long)]
        into: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory, overriding `data.dir`.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Run on a random subset of this many files.
    #[arg(long)]
    sample: Option<usize>,

    /// Sampler seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Where report files are written.
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Run symbols one after another instead of in parallel.
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            common,
            strategy,
            csv,
        } => run_cmd(&common, strategy.as_deref(), csv),
        Commands::Compare { common } => compare_cmd(&common),
        Commands::Sample {
            data_dir,
            count,
            seed,
            extension,
            into,
        } => sample_cmd(&data_dir, count, seed, &extension, into.as_deref()),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tradelab=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_cmd(common: &CommonArgs, strategy: Option<&str>, csv: bool) -> Result<()> {
    let mut config = load_config(common)?;
    if let Some(name) = strategy {
        config.strategy = strategy_by_name(name)?;
        config.validate()?;
    }

    let report = run_from_config(&config)?;
    println!("{}", render_batch(&report));

    let path = write_batch_report(&common.output_dir, &config, &report)?;
    println!("Summary saved to: {}", path.display());
    if csv {
        let path = write_results_csv(&common.output_dir, &report)?;
        println!("Results table saved to: {}", path.display());
    }
    Ok(())
}

fn compare_cmd(common: &CommonArgs) -> Result<()> {
    let config = load_config(common)?;
    let comparison = compare_from_config(&config)?;
    println!("{}", render_comparison(&comparison));

    let path = write_comparison(&common.output_dir, &config, &comparison)?;
    println!("Comparison saved to: {}", path.display());
    Ok(())
}

fn sample_cmd(
    data_dir: &Path,
    count: usize,
    seed: Option<u64>,
    extension: &str,
    into: Option<&Path>,
) -> Result<()> {
    let chosen = sample_dir(data_dir, extension, count, seed)?;
    for file in &chosen {
        println!("{}", file.display());
    }
    if let Some(dest) = into {
        let staged = stage_sample(&chosen, dest)?;
        println!("Staged {} files into {}", staged.len(), dest.display());
    }
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Config file (or defaults) with command-line overrides applied.
fn load_config(common: &CommonArgs) -> Result<BacktestConfig> {
    let mut config = match &common.config {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BacktestConfig::default(),
    };

    if let Some(dir) = &common.data_dir {
        config.data.dir = dir.clone();
    }
    if common.sample.is_some() {
        config.data.sample = common.sample;
    }
    if common.seed.is_some() {
        config.data.seed = common.seed;
    }
    if common.sequential {
        config.backtest.parallel = false;
    }
    config.validate()?;
    Ok(config)
}

fn strategy_by_name(name: &str) -> Result<StrategyConfig> {
    let all = StrategyConfig::all_defaults();
    match all.iter().find(|s| s.name() == name) {
        Some(strategy) => Ok(strategy.clone()),
        None => {
            let known: Vec<&str> = all.iter().map(|s| s.name()).collect();
            bail!("unknown strategy '{name}' (expected one of: {})", known.join(", "))
        }
    }
}
