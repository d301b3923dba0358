//! Batch aggregation: one download for the whole registry, then the result
//! is split back into the individual handles.

use crate::data::provider::DataError;
use crate::frame::{Frame, FrameError};
use crate::options::{DownloadOptions, GroupBy};
use crate::registry::Tickers;
use crate::symbols::Symbol;
use tracing::{info, warn};

/// Downloads several symbols in one call.
///
/// Returns a two-level table (symbol x field when grouped by ticker), or a
/// single-level table of fields when only one symbol was requested.
pub trait BatchDownloader {
    fn download(&self, symbols: &[Symbol], options: &DownloadOptions) -> Result<Frame, DataError>;
}

/// Reorder a two-level table's columns for the requested grouping.
///
/// `Column` swaps the levels and sorts by label; `Ticker` leaves the table as is.
pub fn regroup(frame: Frame, group_by: GroupBy) -> Result<Frame, FrameError> {
    match group_by {
        GroupBy::Ticker => Ok(frame),
        GroupBy::Column => Ok(frame.swap_levels()?.sort_columns()),
    }
}

impl Tickers {
    /// Download history for every symbol at once.
    ///
    /// The downloader always receives `group_by = ticker`; `options.group_by`
    /// only shapes the returned table. Every handle's history is replaced
    /// with its slice of the result.
    pub fn download(
        &mut self,
        downloader: &dyn BatchDownloader,
        options: &DownloadOptions,
    ) -> Result<Frame, DataError> {
        if self.is_empty() {
            return Err(DataError::NoSymbols);
        }

        let request = options.clone().with_group_by(GroupBy::Ticker);
        let data = downloader.download(self.symbols(), &request)?;
        let data = self.redistribute(data)?;

        info!(
            symbols = self.len(),
            rows = data.height(),
            columns = data.width(),
            group_by = %options.group_by,
            "combined history ready"
        );

        Ok(regroup(data, options.group_by)?)
    }

    /// Same as [`Tickers::download`].
    pub fn history(
        &mut self,
        downloader: &dyn BatchDownloader,
        options: &DownloadOptions,
    ) -> Result<Frame, DataError> {
        self.download(downloader, options)
    }

    /// Give each handle its sub-table, lifting a single-level result first.
    fn redistribute(&mut self, mut data: Frame) -> Result<Frame, FrameError> {
        let symbols = self.symbols().to_vec();

        for (symbol, handle) in symbols.iter().zip(self.handles_mut()) {
            if data.nlevels() == 1 {
                data = data.with_top_level(symbol.as_str())?;
            }

            let history = match data.xs(symbol.as_str()) {
                Some(sub) => sub,
                None => {
                    warn!(symbol = %symbol, "symbol missing from batch result");
                    Frame::empty(data.index().to_vec())
                }
            };
            handle.set_history(history);
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ColumnKey;
    use chrono::NaiveDate;
    use std::cell::RefCell;

    struct Canned {
        frame: Frame,
        seen: RefCell<Vec<(Vec<String>, GroupBy)>>,
    }

    impl Canned {
        fn new(frame: Frame) -> Self {
            Self {
                frame,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl BatchDownloader for Canned {
        fn download(&self, symbols: &[Symbol], options: &DownloadOptions) -> Result<Frame, DataError> {
            self.seen.borrow_mut().push((
                symbols.iter().map(|s| s.to_string()).collect(),
                options.group_by,
            ));
            Ok(self.frame.clone())
        }
    }

    fn index() -> Vec<NaiveDate> {
        vec![NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()]
    }

    #[test]
    fn downloader_always_sees_ticker_grouping() {
        let frame = Frame::new(index(), vec![(ColumnKey::field("Close"), vec![1.0])]).unwrap();
        let canned = Canned::new(frame);
        let mut tickers = Tickers::new("aapl");

        tickers
            .download(&canned, &DownloadOptions::default().with_group_by(GroupBy::Column))
            .unwrap();

        let seen = canned.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, vec!["AAPL"]);
        assert_eq!(seen[0].1, GroupBy::Ticker);
    }

    #[test]
    fn empty_registry_skips_downloader() {
        let canned = Canned::new(Frame::empty(index()));
        let mut tickers = Tickers::new("");
        let err = tickers.download(&canned, &DownloadOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::NoSymbols));
        assert!(canned.seen.borrow().is_empty());
    }

    #[test]
    fn missing_symbol_gets_empty_history() {
        let frame = Frame::new(
            index(),
            vec![(ColumnKey::pair("AAPL", "Close"), vec![1.0])],
        )
        .unwrap();
        let mut tickers = Tickers::new("aapl msft");
        tickers
            .download(&Canned::new(frame), &DownloadOptions::default())
            .unwrap();

        let msft = tickers.get("MSFT").unwrap().history().unwrap();
        assert_eq!(msft.width(), 0);
        assert_eq!(msft.height(), 1);
        assert!(!tickers.get("AAPL").unwrap().history().unwrap().is_empty());
    }

    #[test]
    fn regroup_ticker_is_identity() {
        let frame = Frame::new(
            index(),
            vec![
                (ColumnKey::pair("MSFT", "Open"), vec![2.0]),
                (ColumnKey::pair("AAPL", "Open"), vec![1.0]),
            ],
        )
        .unwrap();
        assert_eq!(regroup(frame.clone(), GroupBy::Ticker).unwrap(), frame);
    }
}
