//! Series type conversion for normalization.

use crate::utils::{
    BOOLEAN_FALSE_VALUES, BOOLEAN_TRUE_VALUES, extract_numeric_part, is_missing_marker,
    parse_numeric_string,
};
use anyhow::Result;
use polars::prelude::*;

/// Convert a string series to a numeric dtype (Float64 or Int64).
///
/// Values that cannot be parsed become null; the caller decides whether the
/// overall success rate is acceptable.
pub(crate) fn string_to_numeric(series: &Series, target_dtype: &DataType) -> Result<Series> {
    let str_series = series.str()?;

    match target_dtype {
        DataType::Float64 => {
            let values: Vec<Option<f64>> = str_series.into_iter().map(parse_value).collect();
            Ok(Series::new(series.name().clone(), values))
        }
        DataType::Int64 => {
            let values: Vec<Option<i64>> = str_series
                .into_iter()
                .map(|opt| parse_value(opt).map(|f| f as i64))
                .collect();
            Ok(Series::new(series.name().clone(), values))
        }
        _ => Ok(series.clone()),
    }
}

fn parse_value(opt_val: Option<&str>) -> Option<f64> {
    let val = opt_val?;
    let trimmed = val.trim();

    if trimmed.is_empty() || is_missing_marker(trimmed) {
        return None;
    }

    parse_numeric_string(trimmed).or_else(|| extract_numeric_part(trimmed))
}

/// Whether most non-null values of a string series are boolean words.
pub(crate) fn is_boolean_series(series: &Series) -> bool {
    let Ok(str_series) = series.str() else {
        return false;
    };

    let mut boolean = 0;
    let mut considered = 0;
    for val in str_series.into_iter().flatten() {
        considered += 1;
        if crate::utils::is_boolean_string(val) {
            boolean += 1;
        }
    }

    considered > 0 && boolean as f64 / considered as f64 >= 0.9
}

/// Convert a string series to Boolean; unrecognized values become null.
pub(crate) fn string_to_boolean(series: &Series) -> Result<Series> {
    let str_series = series.str()?;

    let values: Vec<Option<bool>> = str_series
        .into_iter()
        .map(|opt| {
            let lower = opt?.trim().to_ascii_lowercase();
            if BOOLEAN_TRUE_VALUES.contains(&lower.as_str()) {
                Some(true)
            } else if BOOLEAN_FALSE_VALUES.contains(&lower.as_str()) {
                Some(false)
            } else {
                None
            }
        })
        .collect();

    Ok(Series::new(series.name().clone(), values))
}
