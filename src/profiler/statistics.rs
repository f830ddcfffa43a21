//! Statistical helpers for profiling and outlier detection.

use crate::error::Result;
use polars::prelude::*;
use std::collections::HashMap;

/// Extract statistical characteristics from a column.
pub(crate) fn extract_column_characteristics(
    series: &Series,
    inferred_type: &str,
    unique_count: usize,
) -> Result<HashMap<String, serde_json::Value>> {
    let mut characteristics = HashMap::new();

    let cardinality = if unique_count < 10 {
        "low"
    } else if unique_count < 50 {
        "medium"
    } else {
        "high"
    };
    characteristics.insert("cardinality".to_string(), serde_json::json!(cardinality));

    if inferred_type == "numeric" {
        let non_null = series.drop_nulls();
        if !non_null.is_empty() {
            let float_series = non_null.cast(&DataType::Float64)?;
            let mean = float_series.mean().unwrap_or(0.0);
            let std = calculate_std(&float_series)?;
            let skewness = calculate_skewness(&float_series)?;

            characteristics.insert("mean".to_string(), serde_json::json!(mean));
            characteristics.insert("std".to_string(), serde_json::json!(std));
            characteristics.insert("skewness".to_string(), serde_json::json!(skewness));

            let chunked = float_series.f64()?;
            if let Some(min) = chunked.min() {
                characteristics.insert("min".to_string(), serde_json::json!(min));
            }
            if let Some(max) = chunked.max() {
                characteristics.insert("max".to_string(), serde_json::json!(max));
            }

            let distribution = if skewness.abs() < 1.0 {
                "normal"
            } else {
                "skewed"
            };
            characteristics.insert("distribution".to_string(), serde_json::json!(distribution));
        }
    } else if inferred_type == "string" || inferred_type == "text" {
        let non_null = series.drop_nulls();
        if !non_null.is_empty()
            && let Ok(value_counts_df) = non_null.value_counts(true, false, "count".into(), false)
            && value_counts_df.height() > 0
            && let Ok(values_col) = value_counts_df.column(non_null.name())
        {
            let most_freq = format!("{}", values_col.get(0)?);
            characteristics.insert("most_frequent".to_string(), serde_json::json!(most_freq));
        }
    }

    Ok(characteristics)
}

/// Mean and sample standard deviation (n-1 denominator) over non-null values.
///
/// Returns `None` when the series has no non-null values.
pub(crate) fn column_mean_std(series: &Series) -> Result<Option<(f64, f64)>> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Ok(None);
    }
    let float_series = non_null.cast(&DataType::Float64)?;
    let mean = float_series.mean().unwrap_or(0.0);
    let std = calculate_std(&float_series)?;
    Ok(Some((mean, std)))
}

/// Per-value z-scores: (x - mean) / std over the column's non-null values.
///
/// Nulls map to `None`. A zero or non-finite std yields all-`None` — a
/// constant column has no meaningful deviations.
pub(crate) fn zscores(series: &Series) -> Result<Vec<Option<f64>>> {
    let Some((mean, std)) = column_mean_std(series)? else {
        return Ok(vec![None; series.len()]);
    };

    if std == 0.0 || !std.is_finite() {
        return Ok(vec![None; series.len()]);
    }

    let float_series = series.cast(&DataType::Float64)?;
    let chunked = float_series.f64()?;
    Ok(chunked
        .into_iter()
        .map(|opt| opt.map(|val| (val - mean) / std))
        .collect())
}

/// Sample standard deviation (n-1 denominator).
pub(crate) fn calculate_std(series: &Series) -> Result<f64> {
    let mean = series.mean().unwrap_or(0.0);
    let n = series.len() as f64;

    if n <= 1.0 {
        return Ok(0.0);
    }

    let float_series = series.f64()?;
    let variance: f64 = float_series
        .into_iter()
        .filter_map(|v| v.map(|val| (val - mean).powi(2)))
        .sum::<f64>()
        / (n - 1.0);

    Ok(variance.sqrt())
}

/// Skewness (third standardized moment).
pub(crate) fn calculate_skewness(series: &Series) -> Result<f64> {
    let mean = series.mean().unwrap_or(0.0);
    let std = calculate_std(series)?;

    if std == 0.0 {
        return Ok(0.0);
    }

    let n = series.len() as f64;
    let float_series = series.f64()?;

    let skew_sum: f64 = float_series
        .into_iter()
        .filter_map(|v| v.map(|val| ((val - mean) / std).powi(3)))
        .sum();

    Ok(skew_sum / n)
}
