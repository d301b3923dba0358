//! Download options passed through to batch download collaborators.

use crate::data::provider::DataError;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lookback window used when no explicit start date is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    pub const ALL: [Period; 11] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
        Period::YearToDate,
        Period::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// First date of the window `[start, end)` that spans this period.
    /// `None` means unbounded.
    pub fn start_from(&self, end: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::OneDay => end.checked_sub_days(Days::new(1)),
            Period::FiveDays => end.checked_sub_days(Days::new(5)),
            Period::OneMonth => end.checked_sub_months(Months::new(1)),
            Period::ThreeMonths => end.checked_sub_months(Months::new(3)),
            Period::SixMonths => end.checked_sub_months(Months::new(6)),
            Period::OneYear => end.checked_sub_months(Months::new(12)),
            Period::TwoYears => end.checked_sub_months(Months::new(24)),
            Period::FiveYears => end.checked_sub_months(Months::new(60)),
            Period::TenYears => end.checked_sub_months(Months::new(120)),
            Period::YearToDate => {
                let last = end.pred_opt()?;
                NaiveDate::from_ymd_opt(last.year(), 1, 1)
            }
            Period::Max => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| DataError::InvalidOption(format!("unknown period '{s}'")))
    }
}

/// Bar spacing requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "2m")]
    TwoMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    SixtyMinutes,
    #[serde(rename = "90m")]
    NinetyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

impl Interval {
    pub const ALL: [Interval; 13] = [
        Interval::OneMinute,
        Interval::TwoMinutes,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::SixtyMinutes,
        Interval::NinetyMinutes,
        Interval::OneHour,
        Interval::OneDay,
        Interval::FiveDays,
        Interval::OneWeek,
        Interval::OneMonth,
        Interval::ThreeMonths,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::TwoMinutes => "2m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::SixtyMinutes => "60m",
            Interval::NinetyMinutes => "90m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::FiveDays => "5d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
            Interval::ThreeMonths => "3mo",
        }
    }

    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Interval::OneMinute
                | Interval::TwoMinutes
                | Interval::FiveMinutes
                | Interval::FifteenMinutes
                | Interval::ThirtyMinutes
                | Interval::SixtyMinutes
                | Interval::NinetyMinutes
                | Interval::OneHour
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s.trim())
            .ok_or_else(|| DataError::InvalidOption(format!("unknown interval '{s}'")))
    }
}

/// Column grouping of a combined table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Field first: (Close, AAPL), (Close, MSFT), ...
    #[default]
    Column,
    /// Symbol first: (AAPL, Close), (AAPL, Open), ...
    Ticker,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Column => f.write_str("column"),
            GroupBy::Ticker => f.write_str("ticker"),
        }
    }
}

impl FromStr for GroupBy {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "column" | "field" => Ok(GroupBy::Column),
            "ticker" | "symbol" => Ok(GroupBy::Ticker),
            other => Err(DataError::InvalidOption(format!("unknown grouping '{other}'"))),
        }
    }
}

/// Half-open date range `[start, end)`. A missing start is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && date < self.end
    }
}

/// Options for a multi-symbol history download.
///
/// Everything except `group_by` is handed to the batch downloader untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    pub period: Period,
    pub interval: Interval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    /// Exclusive upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    /// Include pre/post market bars (intraday intervals only).
    pub prepost: bool,
    /// Include dividend and split columns.
    pub actions: bool,
    /// Adjust OHLC for splits and dividends.
    pub auto_adjust: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Let the downloader fetch symbols in parallel.
    pub threads: bool,
    pub group_by: GroupBy,
    pub progress: bool,
    /// Free-form options for the downloader.
    pub extra: BTreeMap<String, String>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            period: Period::OneMonth,
            interval: Interval::OneDay,
            start: None,
            end: None,
            prepost: false,
            actions: true,
            auto_adjust: true,
            proxy: None,
            threads: true,
            group_by: GroupBy::Column,
            progress: true,
            extra: BTreeMap::new(),
        }
    }
}

impl DownloadOptions {
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_prepost(mut self, prepost: bool) -> Self {
        self.prepost = prepost;
        self
    }

    pub fn with_actions(mut self, actions: bool) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_auto_adjust(mut self, auto_adjust: bool) -> Self {
        self.auto_adjust = auto_adjust;
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_threads(mut self, threads: bool) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Read a boolean free-form option ("true", "1", "yes", "on").
    pub fn extra_flag(&self, key: &str) -> bool {
        self.extra.get(key).is_some_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            )
        })
    }

    /// Resolve start/end/period against `today`.
    ///
    /// Without `end`, the range runs through `today`. Without `start`, the
    /// period counts back from the exclusive end, so `[start, end)` spans
    /// exactly the period.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange, DataError> {
        let end = match self.end {
            Some(end) => end,
            None => today.succ_opt().unwrap_or(today),
        };
        let start = self.start.or_else(|| self.period.start_from(end));

        if let Some(start) = start {
            if start >= end {
                return Err(DataError::InvalidOption(format!(
                    "start {start} is not before end {end}"
                )));
            }
        }

        Ok(DateRange { start, end })
    }
}
