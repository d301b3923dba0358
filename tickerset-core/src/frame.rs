//! Date-indexed tables with one or two column label levels.
//!
//! A [`Frame`] is the combined table handed back by batch downloads. Columns
//! are labelled either by field alone (`Close`) or by a pair
//! (`AAPL`, `Close`) / (`Close`, `AAPL`). Reshaping only ever moves labels
//! and whole columns around; row order and cell values never change.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Label of one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKey {
    /// Single-level label.
    Field(String),
    /// Two-level label: (top, sub).
    Pair(String, String),
}

impl ColumnKey {
    pub fn field(name: impl Into<String>) -> Self {
        ColumnKey::Field(name.into())
    }

    pub fn pair(top: impl Into<String>, sub: impl Into<String>) -> Self {
        ColumnKey::Pair(top.into(), sub.into())
    }

    /// Outermost label.
    pub fn top(&self) -> &str {
        match self {
            ColumnKey::Field(name) => name,
            ColumnKey::Pair(top, _) => top,
        }
    }

    /// Inner label, if this is a two-level key.
    pub fn sub(&self) -> Option<&str> {
        match self {
            ColumnKey::Field(_) => None,
            ColumnKey::Pair(_, sub) => Some(sub),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            ColumnKey::Field(_) => 1,
            ColumnKey::Pair(..) => 2,
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::Field(name) => f.write_str(name),
            ColumnKey::Pair(top, sub) => write!(f, "({top}, {sub})"),
        }
    }
}

/// Errors from building or reshaping a frame.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("column {column} has {actual} rows but the index has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("column {column} has {actual} label levels, table has {expected}")]
    MixedDepth {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("operation needs {expected} column levels, table has {actual}")]
    LevelCount { expected: usize, actual: usize },
}

/// Column-major table indexed by date.
///
/// Invariants: every column has `index.len()` values, and every column key
/// has the same depth (`levels`).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: Vec<NaiveDate>,
    levels: usize,
    columns: Vec<ColumnKey>,
    values: Vec<Vec<f64>>,
}

impl Frame {
    /// Build a frame from a row index and labelled columns.
    pub fn new(
        index: Vec<NaiveDate>,
        columns: Vec<(ColumnKey, Vec<f64>)>,
    ) -> Result<Self, FrameError> {
        let levels = columns.first().map_or(1, |(key, _)| key.depth());
        let mut keys = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (key, column) in columns {
            if key.depth() != levels {
                return Err(FrameError::MixedDepth {
                    column: key.to_string(),
                    expected: levels,
                    actual: key.depth(),
                });
            }
            if column.len() != index.len() {
                return Err(FrameError::LengthMismatch {
                    column: key.to_string(),
                    expected: index.len(),
                    actual: column.len(),
                });
            }
            keys.push(key);
            values.push(column);
        }

        Ok(Self {
            index,
            levels,
            columns: keys,
            values,
        })
    }

    /// A frame with rows but no columns.
    pub fn empty(index: Vec<NaiveDate>) -> Self {
        Self {
            index,
            levels: 1,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    /// Number of column label levels (1 or 2).
    pub fn nlevels(&self) -> usize {
        self.levels
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|k| k == key)
            .map(|i| self.values[i].as_slice())
    }

    /// Values of a two-level column.
    pub fn get(&self, top: &str, sub: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|k| k.top() == top && k.sub() == Some(sub))
            .map(|i| self.values[i].as_slice())
    }

    /// Values of a single-level column.
    pub fn field(&self, name: &str) -> Option<&[f64]> {
        self.column(&ColumnKey::Field(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnKey, &[f64])> {
        self.columns
            .iter()
            .zip(self.values.iter().map(|v| v.as_slice()))
    }

    /// Distinct outermost labels in first-seen order.
    pub fn top_labels(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for key in &self.columns {
            if !seen.contains(&key.top()) {
                seen.push(key.top());
            }
        }
        seen
    }

    /// Distinct inner labels in first-seen order (empty for single-level frames).
    pub fn sub_labels(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for sub in self.columns.iter().filter_map(|k| k.sub()) {
            if !seen.contains(&sub) {
                seen.push(sub);
            }
        }
        seen
    }

    pub fn contains_top(&self, label: &str) -> bool {
        self.columns.iter().any(|k| k.top() == label)
    }

    /// Lift a single-level frame to two levels: `[label] x existing fields`.
    pub fn with_top_level(self, label: &str) -> Result<Frame, FrameError> {
        if self.levels != 1 {
            return Err(FrameError::LevelCount {
                expected: 1,
                actual: self.levels,
            });
        }
        let columns = self
            .columns
            .into_iter()
            .map(|key| ColumnKey::Pair(label.to_string(), key.top().to_string()))
            .collect();
        Ok(Frame {
            index: self.index,
            levels: 2,
            columns,
            values: self.values,
        })
    }

    /// Cross-section: the sub-table under one top label, as a single-level frame.
    ///
    /// Returns `None` for single-level frames and for labels that are absent.
    pub fn xs(&self, top: &str) -> Option<Frame> {
        if self.levels != 2 || !self.contains_top(top) {
            return None;
        }
        let (columns, values) = self
            .iter()
            .filter(|(key, _)| key.top() == top)
            .filter_map(|(key, values)| {
                key.sub()
                    .map(|sub| (ColumnKey::Field(sub.to_string()), values.to_vec()))
            })
            .unzip();
        Some(Frame {
            index: self.index.clone(),
            levels: 1,
            columns,
            values,
        })
    }

    /// Swap the two label levels: (a, b) becomes (b, a). Column order is kept.
    pub fn swap_levels(self) -> Result<Frame, FrameError> {
        if self.levels != 2 {
            return Err(FrameError::LevelCount {
                expected: 2,
                actual: self.levels,
            });
        }
        let columns = self
            .columns
            .into_iter()
            .map(|key| match key {
                ColumnKey::Pair(top, sub) => ColumnKey::Pair(sub, top),
                field => field,
            })
            .collect();
        Ok(Frame {
            columns,
            ..self
        })
    }

    /// Reorder columns by label (top first, then sub). Stable for equal labels.
    pub fn sort_columns(self) -> Frame {
        let mut pairs: Vec<(ColumnKey, Vec<f64>)> =
            self.columns.into_iter().zip(self.values).collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let (columns, values) = pairs.into_iter().unzip();
        Frame {
            index: self.index,
            levels: self.levels,
            columns,
            values,
        }
    }

    /// Apply `f` to the values of every column whose innermost label satisfies `select`.
    pub fn map_columns<S, F>(mut self, select: S, f: F) -> Frame
    where
        S: Fn(&str) -> bool,
        F: Fn(f64) -> f64,
    {
        for (key, values) in self.columns.iter().zip(self.values.iter_mut()) {
            let inner = key.sub().unwrap_or_else(|| key.top());
            if select(inner) {
                values.iter_mut().for_each(|v| *v = f(*v));
            }
        }
        self
    }
}
