//! Per-symbol handles and the collaborators that create them.

use crate::aggregate::BatchDownloader;
use crate::data::multi::MultiDownloader;
use crate::data::provider::{DataError, DataProvider};
use crate::frame::Frame;
use crate::options::DownloadOptions;
use crate::symbols::Symbol;
use std::slice;

/// Handle for one symbol, holding its most recent history table.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    symbol: Symbol,
    history: Option<Frame>,
}

impl Ticker {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            history: None,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// History assigned by the last batch download or [`Ticker::fetch_history`].
    pub fn history(&self) -> Option<&Frame> {
        self.history.as_ref()
    }

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    pub(crate) fn set_history(&mut self, history: Frame) {
        self.history = Some(history);
    }

    /// Download this symbol alone and keep the result as its history.
    ///
    /// The returned table has a single column level (fields).
    pub fn fetch_history(
        &mut self,
        provider: &dyn DataProvider,
        options: &DownloadOptions,
    ) -> Result<&Frame, DataError> {
        let options = options.clone().with_progress(false);
        let frame = MultiDownloader::new(provider).download(slice::from_ref(&self.symbol), &options)?;
        Ok(&*self.history.insert(frame))
    }
}

/// Creates the handle for a symbol when a registry is built.
pub trait HandleProvider {
    fn handle(&self, symbol: &Symbol) -> Result<Ticker, DataError>;
}

/// Hands out a fresh, empty handle for every symbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandles;

impl HandleProvider for DefaultHandles {
    fn handle(&self, symbol: &Symbol) -> Result<Ticker, DataError> {
        Ok(Ticker::new(symbol.clone()))
    }
}

/// Refuses symbols the given provider does not know.
pub struct CheckedHandles<'a> {
    provider: &'a dyn DataProvider,
}

impl<'a> CheckedHandles<'a> {
    pub fn new(provider: &'a dyn DataProvider) -> Self {
        Self { provider }
    }
}

impl HandleProvider for CheckedHandles<'_> {
    fn handle(&self, symbol: &Symbol) -> Result<Ticker, DataError> {
        if self.provider.has_symbol(symbol.as_str()) {
            Ok(Ticker::new(symbol.clone()))
        } else {
            Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::csv_provider::CsvDirProvider;
    use crate::options::Period;
    use chrono::NaiveDate;
    use std::fs;

    #[test]
    fn new_ticker_has_no_history() {
        let t = Ticker::new(Symbol::new("aapl"));
        assert_eq!(t.symbol(), "AAPL");
        assert!(!t.has_history());
    }

    #[test]
    fn checked_handles_reject_unknown_symbols() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("SPY.csv"), "Date,Open,High,Low,Close\n").unwrap();
        let provider = CsvDirProvider::new(dir.path());
        let handles = CheckedHandles::new(&provider);

        assert!(handles.handle(&Symbol::new("spy")).is_ok());
        assert!(matches!(
            handles.handle(&Symbol::new("qqq")),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn fetch_history_caches_single_symbol_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("SPY.csv"),
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-02,472.2,473.7,470.5,472.7,472.7,123623700\n",
        )
        .unwrap();
        let provider = CsvDirProvider::new(dir.path());
        let options = DownloadOptions::default()
            .with_period(Period::Max)
            .with_end(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        let mut ticker = Ticker::new(Symbol::new("spy"));
        let rows = ticker.fetch_history(&provider, &options).unwrap().height();
        assert_eq!(rows, 1);

        let history = ticker.history().unwrap();
        assert_eq!(history.nlevels(), 1);
        assert_eq!(history.field("Close"), Some(&[472.7][..]));
    }
}
