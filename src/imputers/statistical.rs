//! Single-value fills: mean, median and mode.

use crate::error::Result;
use crate::utils::{fill_numeric_nulls, fill_string_nulls, is_numeric_dtype, string_mode};
use polars::prelude::*;

/// Column-statistic imputation for numeric, string and datetime columns.
///
/// Each fill returns the number of values it replaced so the caller can
/// aggregate a summary.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill nulls in a numeric column with the column mean.
    pub fn fill_mean(df: &mut DataFrame, col_name: &str) -> Result<usize> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let nulls = series.null_count();
        if nulls == 0 {
            return Ok(0);
        }

        let Some(mean) = series.mean() else {
            return Ok(0);
        };
        df.replace(col_name, fill_numeric_nulls(&series, mean)?)?;
        Ok(nulls)
    }

    /// Fill nulls in a numeric column with the column median.
    pub fn fill_median(df: &mut DataFrame, col_name: &str) -> Result<usize> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let nulls = series.null_count();
        if nulls == 0 {
            return Ok(0);
        }

        let Some(median) = series.median() else {
            return Ok(0);
        };
        df.replace(col_name, fill_numeric_nulls(&series, median)?)?;
        Ok(nulls)
    }

    /// Fill nulls with the most frequent value.
    ///
    /// Numeric columns keep their numeric dtype; string columns are filled
    /// with the string mode. Columns where no mode exists are left untouched.
    pub fn fill_mode(df: &mut DataFrame, col_name: &str) -> Result<usize> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let nulls = series.null_count();
        if nulls == 0 {
            return Ok(0);
        }

        if is_numeric_dtype(series.dtype()) {
            let Some(mode) = Self::numeric_mode(&series)? else {
                return Ok(0);
            };
            df.replace(col_name, fill_numeric_nulls(&series, mode)?)?;
            return Ok(nulls);
        }

        if series.dtype() == &DataType::String {
            let Some(mode) = string_mode(&series) else {
                return Ok(0);
            };
            df.replace(col_name, fill_string_nulls(&series, &mode)?)?;
            return Ok(nulls);
        }

        Ok(0)
    }

    /// Fill nulls in a datetime column by carrying neighbors: forward fill
    /// first, then backward fill for leading nulls.
    pub fn fill_datetime(df: &mut DataFrame, col_name: &str) -> Result<usize> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let nulls = series.null_count();
        if nulls == 0 {
            return Ok(0);
        }

        let filled = series.fill_null(FillNullStrategy::Forward(None))?;
        let filled = filled.fill_null(FillNullStrategy::Backward(None))?;
        df.replace(col_name, filled)?;
        Ok(nulls)
    }

    /// Most frequent value of a numeric column, ties broken by frequency sort.
    fn numeric_mode(series: &Series) -> Result<Option<f64>> {
        let non_null = series.drop_nulls();
        if non_null.is_empty() {
            return Ok(None);
        }

        let counts = non_null.value_counts(true, false, "count".into(), false)?;
        if counts.height() == 0 {
            return Ok(None);
        }

        let values = counts.column(non_null.name())?;
        Ok(values.get(0)?.try_extract::<f64>().ok())
    }
}
