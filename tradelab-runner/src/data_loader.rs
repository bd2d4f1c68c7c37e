//! CSV bar loading for the runner.
//!
//! One file per symbol; the file stem is the symbol. Each file has a header
//! row and at least the mapped date, OHLC and volume columns. Loading:
//! 1. Resolve the mapped columns by header name
//! 2. Parse each row; drop rows with an unparseable timestamp or OHLC value
//! 3. Sort by timestamp
//! 4. Validate into a [`BarSeries`]
//!
//! Directory loading returns one result per file, so one bad file never
//! aborts the batch.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, info};
use tradelab_core::domain::{Bar, BarSeries};
use tradelab_core::BacktestError;

use crate::config::{ColumnMap, DataConfig};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("no usable rows ({dropped} dropped)")]
    NoRows { dropped: usize },

    #[error(transparent)]
    Series(#[from] BacktestError),
}

/// One symbol's load attempt.
#[derive(Debug)]
pub struct SymbolInput {
    pub symbol: String,
    pub path: PathBuf,
    pub series: Result<BarSeries, LoadError>,
}

/// Symbol name for a data file: its stem.
pub fn symbol_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Files in `dir` with the given extension, sorted by name.
pub fn list_data_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::DirNotFound(dir.to_path_buf()));
    }
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load one CSV file into a validated series.
pub fn load_csv(path: &Path, columns: &ColumnMap) -> Result<BarSeries, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_reader(&symbol_for(path), BufReader::new(file), columns)
}

/// Load CSV content from any reader.
pub fn load_reader<R: Read>(
    symbol: &str,
    reader: R,
    columns: &ColumnMap,
) -> Result<BarSeries, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let index = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn {
                column: name.to_string(),
            })
    };
    let date = index(&columns.date)?;
    let open = index(&columns.open)?;
    let high = index(&columns.high)?;
    let low = index(&columns.low)?;
    let close = index(&columns.close)?;
    let volume = index(&columns.volume)?;

    let mut bars = Vec::new();
    let mut dropped = 0usize;
    for record in csv_reader.records() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or("");

        let bar = parse_timestamp(field(date)).and_then(|timestamp| {
            Some(Bar {
                timestamp,
                open: parse_price(field(open))?,
                high: parse_price(field(high))?,
                low: parse_price(field(low))?,
                close: parse_price(field(close))?,
                volume: parse_volume(field(volume))?,
            })
        });
        match bar {
            Some(bar) => bars.push(bar),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(symbol, dropped, "Dropped unparseable rows");
    }
    if bars.is_empty() {
        return Err(LoadError::NoRows { dropped });
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(BarSeries::new(symbol, bars)?)
}

/// Load every file in `files`, one result per file, in input order.
pub fn load_files(files: &[PathBuf], columns: &ColumnMap) -> Vec<SymbolInput> {
    files
        .iter()
        .map(|path| SymbolInput {
            symbol: symbol_for(path),
            path: path.clone(),
            series: load_csv(path, columns),
        })
        .collect()
}

/// Load the whole data directory described by `data`.
pub fn load_dir(data: &DataConfig) -> Result<Vec<SymbolInput>, LoadError> {
    let files = list_data_files(&data.dir, &data.extension)?;
    info!(dir = %data.dir.display(), files = files.len(), "Loading bar data");
    Ok(load_files(&files, &data.columns))
}

// ─── Field parsing ───────────────────────────────────────────────────

/// Accepts unix seconds, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// An empty volume cell reads as zero.
fn parse_volume(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return Some(0.0);
    }
    parse_price(raw)
}
