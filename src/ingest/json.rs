//! JSON record ingestion.
//!
//! Accepts a JSON array of objects or newline-delimited objects and builds a
//! typed frame: a column becomes Int64 when every observed value is an
//! integer, Float64 when any is fractional, Boolean when all are booleans,
//! and String otherwise. Missing keys and JSON nulls both become nulls.

use crate::error::{CleaningError, Result};
use polars::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read a JSON file holding an array of record objects.
///
/// A single top-level object is treated as a one-row table.
pub fn read_json(path: &Path) -> Result<DataFrame> {
    let content = read_file(path)?;
    let value: Value = serde_json::from_str(&content)?;

    let records = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        other => {
            return Err(CleaningError::IngestFailed {
                path: path.to_path_buf(),
                reason: format!("expected an array of objects, found {}", json_kind(&other)),
            });
        }
    };

    records_to_frame(path, records)
}

/// Read newline-delimited JSON, one record object per non-empty line.
pub fn read_ndjson(path: &Path) -> Result<DataFrame> {
    let content = read_file(path)?;

    let mut records = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| CleaningError::IngestFailed {
            path: path.to_path_buf(),
            reason: format!("line {}: {}", line_no + 1, e),
        })?;
        records.push(value);
    }

    records_to_frame(path, records)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| CleaningError::IngestFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn records_to_frame(path: &Path, records: Vec<Value>) -> Result<DataFrame> {
    if records.is_empty() {
        return Err(CleaningError::NoDataLoaded);
    }

    // Column order follows first appearance across the records.
    let mut column_names: Vec<String> = Vec::new();
    for record in &records {
        let Value::Object(map) = record else {
            return Err(CleaningError::IngestFailed {
                path: path.to_path_buf(),
                reason: format!("expected a record object, found {}", json_kind(record)),
            });
        };
        for key in map.keys() {
            if !column_names.iter().any(|name| name == key) {
                column_names.push(key.clone());
            }
        }
    }

    let mut columns = Vec::with_capacity(column_names.len());
    for name in &column_names {
        let values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| match record {
                Value::Object(map) => map.get(name).filter(|v| !v.is_null()),
                _ => None,
            })
            .collect();
        columns.push(column_series(name, &values).into_column());
    }

    Ok(DataFrame::new(columns)?)
}

/// Build the narrowest series that fits every observed value.
fn column_series(name: &str, values: &[Option<&Value>]) -> Series {
    let observed: Vec<&Value> = values.iter().flatten().copied().collect();

    let all_bool = !observed.is_empty() && observed.iter().all(|v| v.is_boolean());
    if all_bool {
        let bools: Vec<Option<bool>> = values
            .iter()
            .map(|opt| opt.and_then(|v| v.as_bool()))
            .collect();
        return Series::new(name.into(), bools);
    }

    let all_number = !observed.is_empty() && observed.iter().all(|v| v.is_number());
    if all_number {
        let all_int = observed.iter().all(|v| v.is_i64() || v.is_u64());
        if all_int {
            let ints: Vec<Option<i64>> = values
                .iter()
                .map(|opt| opt.and_then(|v| v.as_i64()))
                .collect();
            return Series::new(name.into(), ints);
        }
        let floats: Vec<Option<f64>> = values
            .iter()
            .map(|opt| opt.and_then(|v| v.as_f64()))
            .collect();
        return Series::new(name.into(), floats);
    }

    let strings: Vec<Option<String>> = values
        .iter()
        .map(|opt| opt.map(|v| render_as_string(v)))
        .collect();
    Series::new(name.into(), strings)
}

/// Scalar values render bare; nested structures keep their JSON text.
fn render_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
