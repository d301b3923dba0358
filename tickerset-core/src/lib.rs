//! Tickerset Core: multi-symbol history downloads merged into one table.
//!
//! This crate contains:
//! - Ticker list parsing, symbol normalization and attribute names
//! - The symbol registry ([`Tickers`]) owning one [`Ticker`] handle per symbol
//! - Batch aggregation: one download, redistributed into the handles
//! - Date-indexed tables with one or two column label levels ([`Frame`])
//! - A rayon-backed batch downloader over single-symbol providers
//! - A local CSV provider, CSV/Parquet export and TOML configuration

pub mod aggregate;
pub mod config;
pub mod data;
pub mod export;
pub mod frame;
pub mod options;
pub mod registry;
pub mod symbols;
pub mod ticker;

pub use aggregate::{regroup, BatchDownloader};
pub use config::{ConfigError, TickersConfig};
pub use data::{CsvDirProvider, DataError, DataProvider, MultiDownloader};
pub use frame::{ColumnKey, Frame, FrameError};
pub use options::{DownloadOptions, GroupBy, Interval, Period};
pub use registry::Tickers;
pub use symbols::{Symbol, TickerInput};
pub use ticker::{CheckedHandles, DefaultHandles, HandleProvider, Ticker};
