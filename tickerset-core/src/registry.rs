//! Symbol registry: the ordered symbol list and one handle per symbol.

use crate::data::provider::DataError;
use crate::symbols::{assign_attr_names, Symbol, TickerInput};
use crate::ticker::{HandleProvider, Ticker};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// A set of ticker handles built from one ticker list.
///
/// Handles are stored in symbol order, duplicates included. Each one is also
/// reachable by its attribute name (`BRK.B` -> `BRK_B`).
#[derive(Debug, Clone)]
pub struct Tickers {
    symbols: Vec<Symbol>,
    attrs: Vec<String>,
    handles: Vec<Ticker>,
    by_attr: HashMap<String, usize>,
}

impl Tickers {
    /// Build a registry with a fresh handle per symbol.
    pub fn new(input: impl Into<TickerInput>) -> Self {
        let symbols = input.into().symbols();
        let handles = symbols.iter().cloned().map(Ticker::new).collect();
        Self::assemble(symbols, handles)
    }

    /// Build a registry, asking `provider` for every handle.
    ///
    /// The first provider error aborts construction and is returned as-is.
    pub fn with_handles(
        input: impl Into<TickerInput>,
        provider: &dyn HandleProvider,
    ) -> Result<Self, DataError> {
        let symbols = input.into().symbols();
        let handles = symbols
            .iter()
            .map(|symbol| provider.handle(symbol))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::assemble(symbols, handles))
    }

    fn assemble(symbols: Vec<Symbol>, handles: Vec<Ticker>) -> Self {
        let attrs = assign_attr_names(&symbols);
        let by_attr = attrs
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        debug!(symbols = symbols.len(), "built ticker registry");
        Self {
            symbols,
            attrs,
            handles,
            by_attr,
        }
    }

    /// Normalized symbols in input order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Attribute names, parallel to [`Tickers::symbols`].
    pub fn attr_names(&self) -> &[String] {
        &self.attrs
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Handle by attribute name.
    pub fn get(&self, attr: &str) -> Option<&Ticker> {
        self.by_attr.get(attr).map(|&i| &self.handles[i])
    }

    /// First handle for a symbol. Input is normalized, so `"aapl"` finds `AAPL`.
    pub fn by_symbol(&self, symbol: &str) -> Option<&Ticker> {
        let wanted = Symbol::new(symbol);
        self.handles.iter().find(|t| *t.symbol() == wanted)
    }

    pub fn by_index(&self, index: usize) -> Option<&Ticker> {
        self.handles.get(index)
    }

    /// (attribute name, handle) pairs in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Ticker)> {
        self.attrs.iter().map(|a| a.as_str()).zip(self.handles.iter())
    }

    pub(crate) fn handles_mut(&mut self) -> &mut [Ticker] {
        &mut self.handles
    }
}

impl fmt::Display for Tickers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.symbols.iter().map(|s| s.as_str()).collect();
        write!(f, "Tickers <{}>", joined.join(","))
    }
}
