//! Multi-symbol time alignment.
//!
//! Given bars for multiple symbols, align them to a common timeline.
//! Missing bars become void bars (NaN prices), never forward-filled.

use super::provider::RawBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Aligned bar data for multiple symbols on a common timeline.
#[derive(Debug)]
pub struct AlignedData {
    /// The common date axis (sorted ascending).
    pub dates: Vec<NaiveDate>,
    /// Bars per symbol in input order. Each inner Vec has the same length as `dates`.
    pub bars: Vec<(String, Vec<RawBar>)>,
}

impl AlignedData {
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.bars.iter().map(|(symbol, _)| symbol.as_str())
    }
}

/// Align multiple symbols to a common timeline.
///
/// For each date in the union of all symbols' dates, each symbol either
/// has a real bar or gets a void bar. A symbol with no bars at all is
/// entirely void. Input order of symbols is preserved.
pub fn align_symbols(symbol_bars: Vec<(String, Vec<RawBar>)>) -> AlignedData {
    let dates: Vec<NaiveDate> = symbol_bars
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|b| b.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let bars = symbol_bars
        .into_iter()
        .map(|(symbol, bars)| {
            let mut date_map: HashMap<NaiveDate, RawBar> = HashMap::with_capacity(bars.len());
            for bar in bars {
                date_map.insert(bar.date, bar);
            }

            let aligned: Vec<RawBar> = dates
                .iter()
                .map(|date| date_map.remove(date).unwrap_or_else(|| RawBar::void(*date)))
                .collect();

            (symbol, aligned)
        })
        .collect();

    AlignedData { dates, bars }
}
