//! Semantic type inference for columns.
//!
//! Physical dtypes from the parser are not enough: a String column full of
//! "$50" values is numeric for cleaning purposes, and "2024-01-15" strings
//! are dates, not categories.

use crate::utils::{
    is_boolean_string, is_datetime_dtype, is_missing_marker, is_numeric_dtype, is_numeric_string,
    numeric_ratio,
};
use anyhow::Result;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

// Date pattern regexes, compiled once.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}$").expect("Invalid regex: YYYY-MM-DD"),
        Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/]\d{4}$").expect("Invalid regex: DD-MM-YYYY"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}").expect("Invalid regex: datetime"),
    ]
});

/// Fraction of considered samples that must parse as numeric for a string
/// column to count as numeric.
const NUMERIC_SAMPLE_THRESHOLD: f64 = 0.6;

/// Infer the semantic type of a column: `numeric`, `binary`, `datetime`,
/// `text`, `string` or `unknown`.
pub(crate) fn infer_semantic_type(series: &Series, sample_values: &[String]) -> Result<String> {
    if series.null_count() == series.len() {
        return Ok("unknown".to_string());
    }

    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Ok("unknown".to_string());
    }

    if is_boolean_like(series, sample_values) {
        return Ok("binary".to_string());
    }

    if is_datetime_dtype(series.dtype()) || is_date_like(sample_values) {
        return Ok("datetime".to_string());
    }

    if is_numeric_like(series, sample_values) {
        return Ok("numeric".to_string());
    }

    if series.dtype() == &DataType::String {
        let unique_ratio = non_null.n_unique()? as f64 / non_null.len() as f64;
        let str_series = non_null.str()?;
        let avg_length: f64 = str_series
            .into_iter()
            .filter_map(|v| v.map(|s| s.len()))
            .sum::<usize>() as f64
            / non_null.len() as f64;

        // Free text reads differently from categorical labels.
        if unique_ratio > 0.7 && avg_length > 30.0 {
            return Ok("text".to_string());
        }
        return Ok("string".to_string());
    }

    Ok("string".to_string())
}

/// Numeric detection that tolerates formatting ("$50") and missing markers.
pub(crate) fn is_numeric_like(series: &Series, sample_values: &[String]) -> bool {
    if is_numeric_dtype(series.dtype()) {
        return true;
    }

    if series.dtype() != &DataType::String {
        return false;
    }

    // Prefer externally collected samples; fall back to scanning the series.
    if !sample_values.is_empty() {
        let mut numeric = 0;
        let mut considered = 0;

        for sample in sample_values.iter().take(20) {
            let trimmed = sample.trim();
            if trimmed.is_empty() || is_missing_marker(trimmed) {
                continue;
            }
            considered += 1;
            if is_numeric_string(trimmed) {
                numeric += 1;
            }
        }

        if considered > 0 {
            return numeric as f64 / considered as f64 >= NUMERIC_SAMPLE_THRESHOLD;
        }
    }

    numeric_ratio(series) >= NUMERIC_SAMPLE_THRESHOLD
}

/// Check if column is boolean (native or string representations).
pub(crate) fn is_boolean_like(series: &Series, sample_values: &[String]) -> bool {
    if series.dtype() == &DataType::Boolean {
        return true;
    }

    if series.dtype() == &DataType::String && sample_values.len() >= 3 {
        let boolean_count = sample_values
            .iter()
            .take(5)
            .filter(|s| is_boolean_string(s))
            .count();
        return boolean_count >= 3;
    }

    false
}

/// Check if samples look like formatted dates (not numeric timestamps).
pub(crate) fn is_date_like(sample_values: &[String]) -> bool {
    if sample_values.is_empty() {
        return false;
    }

    let mut date_like = 0;
    let mut considered = 0;

    for sample in sample_values.iter().take(10) {
        considered += 1;

        let trimmed = sample.trim();
        // Plain numbers could be timestamps; don't treat them as dates.
        if trimmed.is_empty() || trimmed.parse::<f64>().is_ok() {
            continue;
        }

        if DATE_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
            date_like += 1;
        }
    }

    considered > 0 && (date_like as f64 / considered as f64) > 0.7
}
