//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over single-symbol data sources (local CSV
//! files, test doubles) so the batch downloader can fan out over any of them.

use crate::frame::FrameError;
use crate::options::{DateRange, DownloadOptions, Interval};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw OHLCV bar from a data provider, before adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
    /// Cash dividend paid on this date, 0 if none.
    pub dividends: f64,
    /// Split ratio effective on this date, 0 if none.
    pub stock_splits: f64,
}

impl RawBar {
    /// Placeholder for a date the symbol has no bar on.
    pub fn void(date: NaiveDate) -> Self {
        Self {
            date,
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close: f64::NAN,
            adj_close: f64::NAN,
            volume: 0,
            dividends: f64::NAN,
            stock_splits: f64::NAN,
        }
    }

    pub fn is_void(&self) -> bool {
        self.open.is_nan() && self.high.is_nan() && self.low.is_nan() && self.close.is_nan()
    }

    /// Scale open/high/low by `adj_close / close` and replace close with the adjusted close.
    pub fn adjusted(&self) -> Self {
        let ratio = self.adj_close / self.close;
        if !ratio.is_finite() {
            return self.clone();
        }
        Self {
            open: self.open * ratio,
            high: self.high * ratio,
            low: self.low * ratio,
            close: self.adj_close,
            ..self.clone()
        }
    }
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in both library and CLI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no symbols to download")]
    NoSymbols,

    #[error("provider '{provider}' does not serve interval {interval}")]
    UnsupportedInterval { provider: String, interval: Interval },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("table error: {0}")]
    Frame(#[from] FrameError),

    #[error("data error: {0}")]
    Other(String),
}

/// Parameters for a single-symbol fetch, resolved from [`DownloadOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub range: DateRange,
    pub interval: Interval,
    /// Pre/post market bars. Only set for intraday intervals.
    pub prepost: bool,
    pub proxy: Option<String>,
}

impl FetchRequest {
    pub fn from_options(options: &DownloadOptions, today: NaiveDate) -> Result<Self, DataError> {
        Ok(Self {
            range: options.date_range(today)?,
            interval: options.interval,
            prepost: options.prepost && options.interval.is_intraday(),
            proxy: options.proxy.clone(),
        })
    }
}

/// Trait for single-symbol data providers.
///
/// Implementations handle the specifics of one source. Transport, retries and
/// caching, if any, live behind this trait.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for a symbol, sorted by date ascending.
    fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<Vec<RawBar>, DataError>;

    /// Whether the provider knows this symbol at all.
    fn has_symbol(&self, _symbol: &str) -> bool {
        true
    }
}

/// Progress callback for multi-symbol operations.
pub trait DownloadProgress: Send + Sync {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol fetch completes, with the bar count or the error.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, outcome: Result<usize, &DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {symbol}...", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        outcome: Result<usize, &DataError>,
    ) {
        match outcome {
            Ok(bars) => println!("  OK: {symbol} ({bars} bars)"),
            Err(e) => println!("  FAIL: {symbol}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nDownload complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}
