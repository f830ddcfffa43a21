//! Shared utilities for the data cleaning pipeline.
//!
//! Numeric-string parsing lives here because several modules need it:
//! the profiler (to recognize numeric columns stored as text), the cleaner
//! (to actually convert them) and the ingest layer (JSON value typing).

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Coarse category of a column's data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Date or datetime types
    Datetime,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Get the category of a DataType.
pub fn dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if is_datetime_dtype(dtype) {
        DtypeCategory::Datetime
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

// =============================================================================
// Numeric String Parsing
// =============================================================================

/// Formatting characters stripped before numeric parsing.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = ['$', ',', '%', '€', '£', ' '];

/// Sentinel strings that mean "no value" in messy exports.
pub const MISSING_MARKERS: [&str; 9] = [
    "error", "unknown", "n/a", "na", "null", "nil", "missing", "none", "#n/a",
];

/// Strip currency symbols, thousands separators and percent signs so the
/// remainder can be handed to `str::parse`.
///
/// # Example
///
/// ```rust,ignore
/// use tidyframe::utils::strip_numeric_formatting;
///
/// assert_eq!(strip_numeric_formatting("$50"), "50");
/// assert_eq!(strip_numeric_formatting("1,200.75"), "1200.75");
/// ```
pub fn strip_numeric_formatting(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !NUMERIC_FORMAT_CHARS.contains(c))
        .collect()
}

/// Check if a string is a missing-value sentinel.
pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a formatted string as f64.
///
/// `"$50"` parses to `50.0`, `"1,200"` to `1200.0`, `"75%"` to `75.0`.
/// Missing-value markers and empty strings parse to `None`.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() || is_missing_marker(trimmed) {
        return None;
    }
    let stripped = strip_numeric_formatting(trimmed);
    if stripped.is_empty() {
        return None;
    }
    stripped.parse::<f64>().ok()
}

/// Check if a string can be parsed as a numeric value.
pub fn is_numeric_string(s: &str) -> bool {
    parse_numeric_string(s).is_some()
}

/// Check if a string parses to a value with a fractional part (or is written
/// with a decimal point, e.g. "1.0").
pub fn looks_like_float(s: &str) -> bool {
    let stripped = strip_numeric_formatting(s);
    match stripped.parse::<f64>() {
        Ok(num) => stripped.contains('.') || num.fract() != 0.0,
        Err(_) => false,
    }
}

/// Last-resort extraction of the numeric part of a mixed string
/// ("abc12.5def" -> Some(12.5)).
pub fn extract_numeric_part(s: &str) -> Option<f64> {
    let digits: String = strip_numeric_formatting(s)
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    digits.parse::<f64>().ok()
}

// =============================================================================
// Series Helpers
// =============================================================================

/// Calculate the mode (most frequent value) of a string Series.
pub fn string_mode(series: &Series) -> Option<String> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return None;
    }

    let casted = non_null.cast(&DataType::String).ok()?;
    let str_chunked = casted.str().ok()?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for val in str_chunked.into_iter().flatten() {
        *counts.entry(val.to_string()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(val, _)| val)
}

/// Count (parseable, considered) values in a string Series.
///
/// Empty strings and missing markers are excluded from the denominator so a
/// column of "ERROR"s and prices still reads as numeric.
pub fn count_numeric_values(series: &Series) -> (usize, usize) {
    let mut numeric = 0;
    let mut total = 0;

    if let Ok(str_series) = series.str() {
        for val in str_series.into_iter().flatten() {
            let trimmed = val.trim();
            if trimmed.is_empty() || is_missing_marker(trimmed) {
                continue;
            }
            total += 1;
            if is_numeric_string(trimmed) {
                numeric += 1;
            }
        }
    }

    (numeric, total)
}

/// Ratio of numeric-parseable values among considered values of a string Series.
pub fn numeric_ratio(series: &Series) -> f64 {
    let (numeric, total) = count_numeric_values(series);
    if total == 0 { 0.0 } else { numeric as f64 / total as f64 }
}

/// Fill null values in a numeric Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let casted = series.cast(&DataType::Float64)?;
    let chunked = casted.f64()?;
    let filled: Vec<f64> = chunked
        .into_iter()
        .map(|opt| opt.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let casted = series.cast(&DataType::String)?;
    let chunked = casted.str()?;
    let filled: Vec<String> = chunked
        .into_iter()
        .map(|opt| opt.map_or_else(|| fill_value.to_string(), |v| v.to_string()))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Boolean Detection
// =============================================================================

/// Common boolean true representations.
pub const BOOLEAN_TRUE_VALUES: [&str; 6] = ["true", "yes", "1", "t", "y", "on"];

/// Common boolean false representations.
pub const BOOLEAN_FALSE_VALUES: [&str; 6] = ["false", "no", "0", "f", "n", "off"];

/// Check if a string represents a boolean value (true or false form).
pub fn is_boolean_string(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    BOOLEAN_TRUE_VALUES.iter().any(|&v| v == lower)
        || BOOLEAN_FALSE_VALUES.iter().any(|&v| v == lower)
}

// =============================================================================
// Tests
// =============================================================================
