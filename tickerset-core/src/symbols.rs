//! Ticker symbols: list parsing, case normalization and attribute names.
//!
//! A ticker list arrives either as free text (`"aapl, msft brk.b"`) or as an
//! explicit list of strings. Both forms normalize to the same ordered
//! `Vec<Symbol>`. Duplicates are kept in input order.
//!
//! Every symbol also gets an *attribute name*: a sanitized identifier that can
//! be used as a field name (`BRK.B` -> `BRK_B`, `1A` -> `TKR__1A`). Names that
//! collide are disambiguated with a positional suffix.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// Prefix inserted in front of attribute names that would start with a digit.
pub const ATTR_PREFIX: &str = "TKR__";

static NON_IDENT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9_]+").expect("static pattern is valid"));

/// Normalized (uppercased) ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Normalize a raw token: surrounding whitespace is dropped, the rest is uppercased.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Attribute name for this symbol, before any collision handling.
    pub fn attr_name(&self) -> String {
        attr_name(&self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A user-supplied ticker list, as free text or as explicit entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TickerInput {
    /// Comma and/or whitespace separated symbols.
    Text(String),
    /// One symbol per entry.
    List(Vec<String>),
}

impl TickerInput {
    /// Normalized symbols, in input order.
    pub fn symbols(&self) -> Vec<Symbol> {
        match self {
            TickerInput::Text(text) => parse_tickers(text),
            TickerInput::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(Symbol::new)
                .collect(),
        }
    }
}

impl From<&str> for TickerInput {
    fn from(text: &str) -> Self {
        TickerInput::Text(text.to_string())
    }
}

impl From<String> for TickerInput {
    fn from(text: String) -> Self {
        TickerInput::Text(text)
    }
}

impl From<Vec<String>> for TickerInput {
    fn from(items: Vec<String>) -> Self {
        TickerInput::List(items)
    }
}

impl From<Vec<&str>> for TickerInput {
    fn from(items: Vec<&str>) -> Self {
        TickerInput::List(items.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for TickerInput {
    fn from(items: &[&str]) -> Self {
        TickerInput::List(items.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for TickerInput {
    fn from(items: [&str; N]) -> Self {
        TickerInput::List(items.iter().map(|s| s.to_string()).collect())
    }
}

/// Split free text on commas and whitespace and uppercase every token.
///
/// Consecutive delimiters collapse; leading and trailing delimiters are ignored.
/// Empty or delimiter-only text yields an empty list.
pub fn parse_tickers(text: &str) -> Vec<Symbol> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(Symbol::new)
        .collect()
}

/// Sanitize a symbol into an identifier.
///
/// `.` and `-` become `_`, a leading digit gets [`ATTR_PREFIX`], and every run of
/// characters outside `[A-Za-z0-9_]` collapses to one `_`.
pub fn attr_name(symbol: &str) -> String {
    let replaced = symbol.replace(['.', '-'], "_");
    let prefixed = if replaced.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{ATTR_PREFIX}{replaced}")
    } else {
        replaced
    };
    NON_IDENT_RUN.replace_all(&prefixed, "_").into_owned()
}

/// Attribute names for a whole symbol list, with collisions disambiguated.
///
/// The first symbol to claim a name keeps it. Later claimants get
/// `_<position>` appended, where position is their index in `symbols`; if that
/// is taken too, `_<position>_<n>` with `n` counting up from 1.
pub fn assign_attr_names(symbols: &[Symbol]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(symbols.len());

    symbols
        .iter()
        .enumerate()
        .map(|(position, symbol)| {
            let base = symbol.attr_name();
            let mut name = base.clone();
            if taken.contains(&name) {
                name = format!("{base}_{position}");
                let mut n = 1;
                while taken.contains(&name) {
                    name = format!("{base}_{position}_{n}");
                    n += 1;
                }
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}
