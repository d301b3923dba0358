//! Batch downloader: fans a symbol list out over a single-symbol provider and
//! merges the results into one combined table.

use super::align::align_symbols;
use super::provider::{DataError, DataProvider, DownloadProgress, FetchRequest, RawBar};
use crate::aggregate::{regroup, BatchDownloader};
use crate::frame::{ColumnKey, Frame};
use crate::options::DownloadOptions;
use crate::symbols::Symbol;
use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, error, info};

/// Free-form option keys this downloader understands.
const KNOWN_EXTRA: &[&str] = &["rounding"];

const PRICE_FIELDS: &[&str] = &["Open", "High", "Low", "Close", "Adj Close"];

/// [`BatchDownloader`] built on any [`DataProvider`].
pub struct MultiDownloader<'a> {
    provider: &'a dyn DataProvider,
    progress: Option<&'a dyn DownloadProgress>,
    today: Option<NaiveDate>,
}

impl<'a> MultiDownloader<'a> {
    pub fn new(provider: &'a dyn DataProvider) -> Self {
        Self {
            provider,
            progress: None,
            today: None,
        }
    }

    /// Report per-symbol progress here when the options ask for progress.
    pub fn with_progress(mut self, progress: &'a dyn DownloadProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Pin "today" for resolving periods and open-ended ranges.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn fetch_one(
        &self,
        symbol: &Symbol,
        index: usize,
        total: usize,
        request: &FetchRequest,
        progress: Option<&dyn DownloadProgress>,
    ) -> Result<Vec<RawBar>, DataError> {
        if let Some(p) = progress {
            p.on_start(symbol.as_str(), index, total);
        }

        let result = self.provider.fetch(symbol.as_str(), request);

        if let Some(p) = progress {
            p.on_complete(
                symbol.as_str(),
                index,
                total,
                result.as_ref().map(|bars| bars.len()),
            );
        }
        result
    }
}

impl BatchDownloader for MultiDownloader<'_> {
    fn download(&self, symbols: &[Symbol], options: &DownloadOptions) -> Result<Frame, DataError> {
        let mut unique: Vec<Symbol> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if !unique.contains(symbol) {
                unique.push(symbol.clone());
            }
        }
        if unique.is_empty() {
            return Err(DataError::NoSymbols);
        }

        let today = self
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let request = FetchRequest::from_options(options, today)?;

        for key in options.extra.keys() {
            if !KNOWN_EXTRA.contains(&key.as_str()) {
                debug!(option = %key, provider = self.provider.name(), "ignoring unknown download option");
            }
        }
        debug!(
            provider = self.provider.name(),
            symbols = unique.len(),
            interval = %options.interval,
            prepost = options.prepost,
            threads = options.threads,
            "starting batch download"
        );

        let progress = if options.progress { self.progress } else { None };
        let total = unique.len();

        let results: Vec<Result<Vec<RawBar>, DataError>> = if options.threads {
            unique
                .par_iter()
                .enumerate()
                .map(|(i, symbol)| self.fetch_one(symbol, i, total, &request, progress))
                .collect()
        } else {
            unique
                .iter()
                .enumerate()
                .map(|(i, symbol)| self.fetch_one(symbol, i, total, &request, progress))
                .collect()
        };

        let mut first_error = None;
        let mut succeeded = 0;
        let mut fetched: Vec<(String, Vec<RawBar>)> = Vec::with_capacity(total);

        for (symbol, result) in unique.iter().zip(results) {
            match result {
                Ok(bars) => {
                    succeeded += 1;
                    fetched.push((symbol.to_string(), bars));
                }
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "symbol download failed");
                    fetched.push((symbol.to_string(), Vec::new()));
                    first_error.get_or_insert(e);
                }
            }
        }

        let failed = total - succeeded;
        if let Some(p) = progress {
            p.on_batch_complete(succeeded, failed, total);
        }
        info!(succeeded, failed, total, "batch download finished");

        if succeeded == 0 {
            return Err(first_error.unwrap_or(DataError::NoSymbols));
        }

        let aligned = align_symbols(fetched);
        let single = aligned.bars.len() == 1;

        let mut columns = Vec::new();
        for (symbol, bars) in &aligned.bars {
            for (field, values) in field_columns(bars, options) {
                let key = if single {
                    ColumnKey::field(field)
                } else {
                    ColumnKey::pair(symbol.as_str(), field)
                };
                columns.push((key, values));
            }
        }

        let mut frame = Frame::new(aligned.dates, columns)?;
        if options.extra_flag("rounding") {
            frame = frame.map_columns(|field| PRICE_FIELDS.contains(&field), round2);
        }

        if single {
            Ok(frame)
        } else {
            Ok(regroup(frame, options.group_by)?)
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Field columns for one symbol's aligned bars, in output order.
fn field_columns(bars: &[RawBar], options: &DownloadOptions) -> Vec<(&'static str, Vec<f64>)> {
    let bars: Vec<RawBar> = if options.auto_adjust {
        bars.iter().map(RawBar::adjusted).collect()
    } else {
        bars.to_vec()
    };

    let pick = |f: fn(&RawBar) -> f64| -> Vec<f64> { bars.iter().map(f).collect() };
    let volume = |b: &RawBar| if b.is_void() { f64::NAN } else { b.volume as f64 };

    let mut columns = vec![
        ("Open", pick(|b| b.open)),
        ("High", pick(|b| b.high)),
        ("Low", pick(|b| b.low)),
        ("Close", pick(|b| b.close)),
    ];
    if !options.auto_adjust {
        columns.push(("Adj Close", pick(|b| b.adj_close)));
    }
    columns.push(("Volume", pick(volume)));
    if options.actions {
        columns.push(("Dividends", pick(|b| b.dividends)));
        columns.push(("Stock Splits", pick(|b| b.stock_splits)));
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{GroupBy, Period};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryProvider {
        bars: HashMap<String, Vec<RawBar>>,
        calls: Mutex<Vec<String>>,
    }

    impl MemoryProvider {
        fn new(entries: Vec<(&str, Vec<RawBar>)>) -> Self {
            Self {
                bars: entries
                    .into_iter()
                    .map(|(s, b)| (s.to_string(), b))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl DataProvider for MemoryProvider {
        fn name(&self) -> &str {
            "memory"
        }

        fn fetch(&self, symbol: &str, request: &FetchRequest) -> Result<Vec<RawBar>, DataError> {
            self.calls.lock().unwrap().push(symbol.to_string());
            Ok(self
                .bars
                .get(symbol)
                .ok_or_else(|| DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })?
                .iter()
                .filter(|b| request.range.contains(b.date))
                .cloned()
                .collect())
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn bar(day: u32, close: f64) -> RawBar {
        RawBar {
            date: d(day),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            adj_close: close / 2.0,
            volume: 100,
            dividends: 0.0,
            stock_splits: 0.0,
        }
    }

    fn opts() -> DownloadOptions {
        DownloadOptions::default()
            .with_period(Period::Max)
            .with_progress(false)
    }

    fn symbols(list: &[&str]) -> Vec<Symbol> {
        list.iter().map(|s| Symbol::new(s)).collect()
    }

    #[test]
    fn single_symbol_gives_flat_table() {
        let provider = MemoryProvider::new(vec![("AAPL", vec![bar(2, 10.0), bar(3, 11.0)])]);
        let frame = MultiDownloader::new(&provider)
            .with_today(d(20))
            .download(&symbols(&["AAPL"]), &opts().with_auto_adjust(false))
            .unwrap();

        assert_eq!(frame.nlevels(), 1);
        assert_eq!(
            frame.top_labels(),
            vec!["Open", "High", "Low", "Close", "Adj Close", "Volume", "Dividends", "Stock Splits"]
        );
        assert_eq!(frame.field("Close"), Some(&[10.0, 11.0][..]));
    }

    #[test]
    fn several_symbols_grouped_by_ticker() {
        let provider = MemoryProvider::new(vec![
            ("AAPL", vec![bar(2, 10.0), bar(3, 11.0)]),
            ("MSFT", vec![bar(3, 20.0)]),
        ]);
        let frame = MultiDownloader::new(&provider)
            .with_today(d(20))
            .download(
                &symbols(&["AAPL", "MSFT"]),
                &opts().with_group_by(GroupBy::Ticker).with_actions(false),
            )
            .unwrap();

        assert_eq!(frame.nlevels(), 2);
        assert_eq!(frame.top_labels(), vec!["AAPL", "MSFT"]);
        assert_eq!(frame.sub_labels(), vec!["Open", "High", "Low", "Close", "Volume"]);
        let msft_close = frame.get("MSFT", "Close").unwrap();
        assert!(msft_close[0].is_nan());
        assert_eq!(msft_close[1], 10.0);
        assert!(frame.get("MSFT", "Volume").unwrap()[0].is_nan());
    }

    #[test]
    fn column_grouping_swaps_and_sorts() {
        let provider = MemoryProvider::new(vec![
            ("MSFT", vec![bar(2, 20.0)]),
            ("AAPL", vec![bar(2, 10.0)]),
        ]);
        let frame = MultiDownloader::new(&provider)
            .with_today(d(20))
            .download(&symbols(&["MSFT", "AAPL"]), &opts().with_actions(false))
            .unwrap();

        assert_eq!(frame.top_labels(), vec!["Close", "High", "Low", "Open", "Volume"]);
        assert_eq!(frame.columns()[0], ColumnKey::pair("Close", "AAPL"));
        assert_eq!(frame.columns()[1], ColumnKey::pair("Close", "MSFT"));
    }

    #[test]
    fn duplicates_fetched_once() {
        let provider = MemoryProvider::new(vec![("AAPL", vec![bar(2, 10.0)])]);
        let frame = MultiDownloader::new(&provider)
            .with_today(d(20))
            .download(&symbols(&["AAPL", "AAPL"]), &opts().with_threads(false))
            .unwrap();

        assert_eq!(provider.calls.lock().unwrap().len(), 1);
        assert_eq!(frame.nlevels(), 1);
    }

    #[test]
    fn failed_symbol_becomes_nan_columns() {
        let provider = MemoryProvider::new(vec![("AAPL", vec![bar(2, 10.0)])]);
        let frame = MultiDownloader::new(&provider)
            .with_today(d(20))
            .download(
                &symbols(&["AAPL", "GONE"]),
                &opts().with_group_by(GroupBy::Ticker),
            )
            .unwrap();

        assert!(frame.contains_top("GONE"));
        assert!(frame.get("GONE", "Close").unwrap()[0].is_nan());
    }

    #[test]
    fn all_failed_returns_first_error() {
        let provider = MemoryProvider::new(vec![]);
        let err = MultiDownloader::new(&provider)
            .with_today(d(20))
            .download(&symbols(&["X", "Y"]), &opts().with_threads(false))
            .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { ref symbol } if symbol == "X"));
    }

    #[test]
    fn auto_adjust_and_rounding() {
        let raw = RawBar {
            close: 10.0,
            adj_close: 5.0134,
            ..bar(2, 10.0)
        };
        let provider = MemoryProvider::new(vec![("AAPL", vec![raw])]);
        let downloader = MultiDownloader::new(&provider).with_today(d(20));

        let rounded = downloader
            .download(&symbols(&["AAPL"]), &opts().with_extra("rounding", "true"))
            .unwrap();
        assert!(rounded.field("Adj Close").is_none());
        assert_eq!(rounded.field("Close"), Some(&[5.01][..]));
        // open 9.0 scaled by 0.50134
        assert_eq!(rounded.field("Open"), Some(&[4.51][..]));
        assert_eq!(rounded.field("Volume"), Some(&[100.0][..]));

        let unrounded = downloader
            .download(&symbols(&["AAPL"]), &opts())
            .unwrap();
        assert_eq!(unrounded.field("Close"), Some(&[5.0134][..]));
    }

    #[test]
    fn empty_symbol_list_is_an_error() {
        let provider = MemoryProvider::new(vec![]);
        let err = MultiDownloader::new(&provider)
            .download(&[], &opts())
            .unwrap_err();
        assert!(matches!(err, DataError::NoSymbols));
    }
}
