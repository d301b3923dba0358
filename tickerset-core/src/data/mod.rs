//! Data sources and the batch downloader built on them.

pub mod align;
pub mod csv_provider;
pub mod multi;
pub mod provider;

pub use align::{align_symbols, AlignedData};
pub use csv_provider::CsvDirProvider;
pub use multi::MultiDownloader;
pub use provider::{
    DataError, DataProvider, DownloadProgress, FetchRequest, RawBar, StdoutProgress,
};
