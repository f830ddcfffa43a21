//! Numeric-string normalization.
//!
//! Messy exports store numbers as text: "$50", "1,200", "75%", with the odd
//! "ERROR" thrown in. This module sanitizes string columns and converts the
//! ones that are numbers-in-disguise to proper numeric dtypes.

mod converters;
mod sanitizers;

use crate::utils::{looks_like_float, numeric_ratio};
use anyhow::Result;
use polars::prelude::*;
use tracing::{debug, info};

/// Minimum fraction of parseable values for a column to be converted, and for
/// a finished conversion to be accepted.
const CONVERSION_THRESHOLD: f64 = 0.7;

/// Converts string columns with numeric content to numeric dtypes.
pub struct NumericNormalizer;

impl NumericNormalizer {
    /// Sanitize string columns and convert numeric-looking ones.
    ///
    /// Returns the updated frame and a description of each conversion.
    pub fn normalize(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        let mut df = sanitizers::sanitize_string_columns(df)?;
        let mut actions = Vec::new();

        let column_names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        for col_name in &column_names {
            let series = df.column(col_name)?.as_materialized_series().clone();
            if series.dtype() != &DataType::String {
                continue;
            }

            let ratio = numeric_ratio(&series);
            if ratio < CONVERSION_THRESHOLD {
                if converters::is_boolean_series(&series) {
                    let converted = converters::string_to_boolean(&series)?;
                    df.replace(col_name, converted)?;
                    actions.push(format!("Converted '{}' from String to Boolean", col_name));
                    debug!("Converted '{}' to Boolean", col_name);
                }
                continue;
            }

            let target = Self::pick_numeric_dtype(&series)?;
            let converted = converters::string_to_numeric(&series, &target)?;

            // A conversion that nulls out too many values is worse than
            // leaving the column as text.
            let success = Self::conversion_success_ratio(&series, &converted);
            if success >= CONVERSION_THRESHOLD {
                df.replace(col_name, converted)?;
                actions.push(format!(
                    "Converted '{}' from String to {:?} ({:.0}% parsed)",
                    col_name,
                    target,
                    success * 100.0
                ));
                debug!("Converted '{}' to {:?}", col_name, target);
            } else {
                debug!(
                    "Skipped '{}': only {:.0}% of values parsed",
                    col_name,
                    success * 100.0
                );
            }
        }

        if !actions.is_empty() {
            info!("Normalized {} column(s) to numeric types", actions.len());
        }

        Ok((df, actions))
    }

    /// Choose Int64 when every parseable value is integral, Float64 otherwise.
    fn pick_numeric_dtype(series: &Series) -> Result<DataType> {
        let str_series = series.str()?;
        let any_float = str_series
            .into_iter()
            .flatten()
            .any(|val| looks_like_float(val));
        Ok(if any_float {
            DataType::Float64
        } else {
            DataType::Int64
        })
    }

    /// Fraction of originally non-null values that survived conversion.
    fn conversion_success_ratio(original: &Series, converted: &Series) -> f64 {
        let original_valid = original.len() - original.null_count();
        if original_valid == 0 {
            return 0.0;
        }
        let converted_valid = converted.len() - converted.null_count();
        converted_valid as f64 / original_valid as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_currency_column() {
        let df = df! {
            "price" => &["$50", "$1,200.50", "$7.25"],
        }
        .unwrap();

        let (cleaned, actions) = NumericNormalizer.normalize(df).unwrap();
        let price = cleaned.column("price").unwrap();

        assert_eq!(price.dtype(), &DataType::Float64);
        assert_eq!(
            price.get(0).unwrap().try_extract::<f64>().unwrap(),
            50.0
        );
        assert_eq!(
            price.get(1).unwrap().try_extract::<f64>().unwrap(),
            1200.50
        );
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_normalize_integer_column() {
        let df = df! {
            "count" => &["1,000", "2,000", "999"],
        }
        .unwrap();

        let (cleaned, _) = NumericNormalizer.normalize(df).unwrap();
        let count = cleaned.column("count").unwrap();

        assert_eq!(count.dtype(), &DataType::Int64);
        assert_eq!(count.get(0).unwrap().try_extract::<i64>().unwrap(), 1000);
    }

    #[test]
    fn test_normalize_nulls_out_markers() {
        let df = df! {
            "amount" => &["10", "ERROR", "30", "40"],
        }
        .unwrap();

        let (cleaned, _) = NumericNormalizer.normalize(df).unwrap();
        let amount = cleaned.column("amount").unwrap();

        assert_eq!(amount.dtype(), &DataType::Int64);
        assert_eq!(amount.null_count(), 1);
    }

    #[test]
    fn test_normalize_leaves_text_alone() {
        let df = df! {
            "name" => &["Alice", "Bob", "Carol"],
        }
        .unwrap();

        let (cleaned, actions) = NumericNormalizer.normalize(df).unwrap();
        assert_eq!(cleaned.column("name").unwrap().dtype(), &DataType::String);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_normalize_rejects_mostly_garbage() {
        // Only 1/4 values parse; conversion must not happen.
        let df = df! {
            "mixed" => &["10", "abc", "def", "ghi"],
        }
        .unwrap();

        let (cleaned, actions) = NumericNormalizer.normalize(df).unwrap();
        assert_eq!(cleaned.column("mixed").unwrap().dtype(), &DataType::String);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_normalize_boolean_column() {
        let df = df! {
            "active" => &["yes", "no", "yes", "no"],
        }
        .unwrap();

        let (cleaned, actions) = NumericNormalizer.normalize(df).unwrap();
        assert_eq!(
            cleaned.column("active").unwrap().dtype(),
            &DataType::Boolean
        );
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_normalize_untouched_numeric_column() {
        let df = df! {
            "already" => &[1.0, 2.0, 3.0],
        }
        .unwrap();

        let (cleaned, actions) = NumericNormalizer.normalize(df).unwrap();
        assert_eq!(
            cleaned.column("already").unwrap().dtype(),
            &DataType::Float64
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn test_normalize_percent_column() {
        let df = df! {
            "rate" => &["75%", "50.5%", "100%"],
        }
        .unwrap();

        let (cleaned, _) = NumericNormalizer.normalize(df).unwrap();
        let rate = cleaned.column("rate").unwrap();
        assert_eq!(rate.dtype(), &DataType::Float64);
        assert_eq!(rate.get(0).unwrap().try_extract::<f64>().unwrap(), 75.0);
    }
}
