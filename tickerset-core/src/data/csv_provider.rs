//! Local CSV data provider.
//!
//! Layout: `{dir}/{SYMBOL}.csv`, one file per symbol, with the header
//! `Date,Open,High,Low,Close,Adj Close,Volume` and optional
//! `Dividends,Stock Splits` columns. Empty cells read as NaN (prices) or 0.

use super::provider::{DataError, DataProvider, FetchRequest, RawBar};
use crate::options::Interval;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<f64>,
    #[serde(rename = "Volume", default)]
    volume: Option<f64>,
    #[serde(rename = "Dividends", default)]
    dividends: Option<f64>,
    #[serde(rename = "Stock Splits", default)]
    stock_splits: Option<f64>,
}

impl From<CsvRow> for RawBar {
    fn from(row: CsvRow) -> Self {
        let close = row.close.unwrap_or(f64::NAN);
        RawBar {
            date: row.date,
            open: row.open.unwrap_or(f64::NAN),
            high: row.high.unwrap_or(f64::NAN),
            low: row.low.unwrap_or(f64::NAN),
            close,
            adj_close: row.adj_close.unwrap_or(close),
            volume: row.volume.map_or(0, |v| v.max(0.0) as u64),
            dividends: row.dividends.unwrap_or(0.0),
            stock_splits: row.stock_splits.unwrap_or(0.0),
        }
    }
}

/// Serves daily bars from a directory of per-symbol CSV files.
pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path to a symbol's file: `{dir}/{SYMBOL}.csv`
    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Read every bar in a symbol's file, sorted by date ascending.
    pub fn read_all(&self, symbol: &str) -> Result<Vec<RawBar>, DataError> {
        let path = self.symbol_path(symbol);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;
            bars.push(RawBar::from(row));
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv_dir"
    }

    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<Vec<RawBar>, DataError> {
        if request.interval != Interval::OneDay {
            return Err(DataError::UnsupportedInterval {
                provider: self.name().to_string(),
                interval: request.interval,
            });
        }

        Ok(self
            .read_all(symbol)?
            .into_iter()
            .filter(|b| request.range.contains(b.date))
            .collect())
    }

    fn has_symbol(&self, symbol: &str) -> bool {
        self.symbol_path(symbol).is_file()
    }
}
