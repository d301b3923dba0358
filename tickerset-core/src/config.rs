//! TOML configuration: download defaults and named watchlists.
//!
//! ```toml
//! [download]
//! period = "6mo"
//! group_by = "ticker"
//!
//! [watchlists]
//! megacaps = "AAPL MSFT GOOGL AMZN"
//! etfs = ["SPY", "QQQ", "IWM"]
//! ```

use crate::options::DownloadOptions;
use crate::symbols::TickerInput;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown watchlist '{0}'")]
    UnknownWatchlist(String),
}

/// The complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickersConfig {
    #[serde(default)]
    pub download: DownloadOptions,
    #[serde(default)]
    pub watchlists: BTreeMap<String, TickerInput>,
}

impl TickersConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn watchlist(&self, name: &str) -> Result<&TickerInput, ConfigError> {
        self.watchlists
            .get(name)
            .ok_or_else(|| ConfigError::UnknownWatchlist(name.to_string()))
    }

    pub fn watchlist_names(&self) -> Vec<&str> {
        self.watchlists.keys().map(|s| s.as_str()).collect()
    }

    /// A starter configuration with a few US equity watchlists.
    pub fn sample() -> Self {
        let mut watchlists = BTreeMap::new();

        watchlists.insert(
            "megacaps".into(),
            TickerInput::Text("AAPL MSFT GOOGL AMZN NVDA META".into()),
        );

        watchlists.insert(
            "banks".into(),
            TickerInput::from(vec!["JPM", "BAC", "WFC", "GS", "MS", "C"]),
        );

        watchlists.insert(
            "etfs".into(),
            TickerInput::from(vec!["SPY", "QQQ", "IWM", "DIA"]),
        );

        Self {
            download: DownloadOptions::default(),
            watchlists,
        }
    }
}
