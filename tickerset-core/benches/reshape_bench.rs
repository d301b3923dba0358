//! Criterion benchmarks for the combined-table hot paths.
//!
//! Benchmarks:
//! 1. Column regrouping (swap levels + sort) on wide tables
//! 2. Multi-symbol alignment on a shared timeline
//! 3. Cross-section slicing for every symbol

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tickerset_core::data::{align_symbols, RawBar};
use tickerset_core::{regroup, ColumnKey, Frame, GroupBy};

// ── Helpers ──────────────────────────────────────────────────────────

const FIELDS: [&str; 7] = ["Open", "High", "Low", "Close", "Volume", "Dividends", "Stock Splits"];

fn make_bars(n: usize, offset: usize) -> Vec<RawBar> {
    let base_date = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + ((i + offset) as f64 * 0.1).sin() * 10.0;
            RawBar {
                date: base_date + chrono::Duration::days((i + offset % 3) as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                adj_close: close,
                volume: 1_000_000,
                dividends: 0.0,
                stock_splits: 0.0,
            }
        })
        .collect()
}

fn make_frame(symbols: usize, rows: usize) -> Frame {
    let base_date = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let index = (0..rows)
        .map(|i| base_date + chrono::Duration::days(i as i64))
        .collect();
    let columns = (0..symbols)
        .flat_map(|s| {
            FIELDS.iter().map(move |field| {
                let values: Vec<f64> = (0..rows).map(|r| (s * rows + r) as f64).collect();
                (ColumnKey::pair(format!("SYM{s:03}"), *field), values)
            })
        })
        .collect();
    Frame::new(index, columns).unwrap()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_regroup(c: &mut Criterion) {
    let mut group = c.benchmark_group("regroup_by_column");
    for symbols in [10, 100, 500] {
        let frame = make_frame(symbols, 252);
        group.bench_with_input(BenchmarkId::from_parameter(symbols), &frame, |b, frame| {
            b.iter(|| regroup(black_box(frame.clone()), GroupBy::Column).unwrap())
        });
    }
    group.finish();
}

fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("align_symbols");
    for symbols in [10, 100] {
        let input: Vec<(String, Vec<RawBar>)> = (0..symbols)
            .map(|s| (format!("SYM{s:03}"), make_bars(252, s)))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(symbols), &input, |b, input| {
            b.iter(|| align_symbols(black_box(input.clone())))
        });
    }
    group.finish();
}

fn bench_xs(c: &mut Criterion) {
    let frame = make_frame(100, 252);
    let labels: Vec<String> = frame.top_labels().iter().map(|s| s.to_string()).collect();
    c.bench_function("xs_every_symbol_100", |b| {
        b.iter(|| {
            for label in &labels {
                black_box(frame.xs(label));
            }
        })
    });
}

criterion_group!(benches, bench_regroup, bench_align, bench_xs);
criterion_main!(benches);
