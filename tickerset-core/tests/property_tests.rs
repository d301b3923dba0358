//! Property tests for symbol normalization and table reshaping.
//!
//! Uses proptest to verify:
//! 1. Text and list ticker inputs normalize to the same symbols
//! 2. Attribute names are valid identifiers and never collide
//! 3. Swapping column levels twice restores the table
//! 4. Column grouping never changes cell values

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::HashSet;
use tickerset_core::symbols::{assign_attr_names, parse_tickers};
use tickerset_core::{regroup, ColumnKey, Frame, GroupBy, TickerInput};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_token() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9.\\-^=]{0,6}"
}

fn arb_delimiter() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(" ".to_string()),
        Just(",".to_string()),
        Just(", ".to_string()),
        Just(" ,\t".to_string()),
        Just("\n".to_string()),
    ]
}

fn arb_symbols() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Z]{1,4}", 1..6).prop_map(|mut v| {
        v.sort();
        v.dedup();
        v
    })
}

fn arb_frame() -> impl Strategy<Value = Frame> {
    (arb_symbols(), 1..5usize).prop_flat_map(|(symbols, rows)| {
        let fields = ["Close", "High", "Low", "Open", "Volume"];
        let n_cols = symbols.len() * fields.len();
        prop::collection::vec(-1.0e6..1.0e6_f64, n_cols * rows).prop_map(move |cells| {
            let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let index = (0..rows)
                .map(|i| base + chrono::Duration::days(i as i64))
                .collect();
            let mut columns = Vec::new();
            let mut chunks = cells.chunks(rows);
            for symbol in &symbols {
                for field in fields {
                    let values = chunks.next().unwrap().to_vec();
                    columns.push((ColumnKey::pair(symbol.as_str(), field), values));
                }
            }
            Frame::new(index, columns).unwrap()
        })
    })
}

// ── 1. Input forms agree ─────────────────────────────────────────────

proptest! {
    #[test]
    fn text_and_list_inputs_agree(
        tokens in prop::collection::vec(arb_token(), 0..8),
        delims in prop::collection::vec(arb_delimiter(), 8),
    ) {
        let mut text = String::new();
        for (token, delim) in tokens.iter().zip(delims.iter()) {
            text.push_str(delim);
            text.push_str(token);
        }

        let from_text = TickerInput::from(text.as_str()).symbols();
        let from_list = TickerInput::from(tokens.clone()).symbols();
        prop_assert_eq!(&from_text, &from_list);

        for (symbol, token) in from_text.iter().zip(tokens.iter()) {
            prop_assert_eq!(symbol.as_str(), token.to_uppercase());
        }
    }
}

// ── 2. Attribute names ───────────────────────────────────────────────

proptest! {
    #[test]
    fn attr_names_are_identifiers_and_unique(
        tokens in prop::collection::vec(arb_token(), 0..12),
    ) {
        let symbols = parse_tickers(&tokens.join(" "));
        let names = assign_attr_names(&symbols);

        prop_assert_eq!(names.len(), symbols.len());

        let unique: HashSet<&String> = names.iter().collect();
        prop_assert_eq!(unique.len(), names.len());

        for name in &names {
            prop_assert!(!name.is_empty());
            prop_assert!(!name.starts_with(|c: char| c.is_ascii_digit()));
            prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }

        // Deterministic: same input, same names.
        prop_assert_eq!(assign_attr_names(&symbols), names);
    }
}

// ── 3/4. Reshaping ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn swap_twice_is_identity(frame in arb_frame()) {
        let back = frame.clone().swap_levels().unwrap().swap_levels().unwrap();
        prop_assert_eq!(back, frame);
    }

    #[test]
    fn column_grouping_keeps_every_cell(frame in arb_frame()) {
        let by_field = regroup(frame.clone(), GroupBy::Column).unwrap();

        prop_assert_eq!(by_field.width(), frame.width());
        prop_assert_eq!(by_field.index(), frame.index());
        for (key, values) in frame.iter() {
            let (top, sub) = (key.top(), key.sub().unwrap());
            prop_assert_eq!(by_field.get(sub, top), Some(values));
        }

        let restored = regroup(by_field, GroupBy::Column).unwrap();
        prop_assert_eq!(restored, frame.sort_columns());
    }
}
