//! Writing combined tables to CSV and Parquet.
//!
//! CSV keeps one header row per label level, with `Date` heading the index
//! column on the last header row. Parquet flattens two-level labels into
//! `top|sub` column names.

use crate::data::provider::DataError;
use crate::frame::{ColumnKey, Frame};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::io;
use std::path::Path;

/// Write a frame as CSV to any writer. NaN cells are left empty.
pub fn write_csv_to<W: io::Write>(frame: &Frame, writer: W) -> Result<(), DataError> {
    let csv_err = |e: csv::Error| DataError::Csv(e.to_string());
    let mut out = csv::Writer::from_writer(writer);

    if frame.nlevels() == 2 {
        let mut top = vec![String::new()];
        top.extend(frame.columns().iter().map(|k| k.top().to_string()));
        out.write_record(&top).map_err(csv_err)?;
    }

    let mut header = vec!["Date".to_string()];
    header.extend(
        frame
            .columns()
            .iter()
            .map(|k| k.sub().unwrap_or_else(|| k.top()).to_string()),
    );
    out.write_record(&header).map_err(csv_err)?;

    for (row, date) in frame.index().iter().enumerate() {
        let mut record = Vec::with_capacity(frame.width() + 1);
        record.push(date.format("%Y-%m-%d").to_string());
        for (_, values) in frame.iter() {
            let v = values[row];
            record.push(if v.is_nan() { String::new() } else { v.to_string() });
        }
        out.write_record(&record).map_err(csv_err)?;
    }

    out.flush().map_err(|e| DataError::Io(e.to_string()))
}

/// Write a frame as CSV to a file.
pub fn write_csv(frame: &Frame, path: &Path) -> Result<(), DataError> {
    let file = fs::File::create(path)
        .map_err(|e| DataError::Io(format!("create {}: {e}", path.display())))?;
    write_csv_to(frame, io::BufWriter::new(file))
}

/// Flattened column name used for Parquet output.
pub fn flat_name(key: &ColumnKey) -> String {
    match key {
        ColumnKey::Field(name) => name.clone(),
        ColumnKey::Pair(top, sub) => format!("{top}|{sub}"),
    }
}

/// Convert a frame to a Polars DataFrame with a leading `date` column.
pub fn to_dataframe(frame: &Frame) -> Result<DataFrame, DataError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| DataError::Other("epoch date out of range".into()))?;
    let days: Vec<i32> = frame
        .index()
        .iter()
        .map(|d| (*d - epoch).num_days() as i32)
        .collect();

    let mut columns = Vec::with_capacity(frame.width() + 1);
    columns.push(
        Column::new("date".into(), days)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
    );
    for (key, values) in frame.iter() {
        columns.push(Column::new(flat_name(key).into(), values.to_vec()));
    }

    DataFrame::new(columns).map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

/// Write a frame to a Parquet file.
///
/// Writes are atomic: write to .tmp then rename.
pub fn write_parquet(frame: &Frame, path: &Path) -> Result<(), DataError> {
    let mut df = to_dataframe(frame)?;
    let tmp_path = path.with_extension("parquet.tmp");

    let file = fs::File::create(&tmp_path)
        .map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::ParquetError(format!("atomic rename failed: {e}"))
    })
}
