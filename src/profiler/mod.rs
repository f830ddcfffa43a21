//! Dataset structure inspection.
//!
//! Profiling answers the "what did we just load?" question after ingestion:
//! shape, per-column dtypes, null counts, sample values, inferred semantic
//! types and basic numeric statistics.

mod statistics;
mod type_inference;

use crate::types::{ColumnProfile, DatasetProfile};
use anyhow::Result;
use polars::prelude::*;
use rand::prelude::*;

pub(crate) use statistics::{column_mean_std, extract_column_characteristics, zscores};
pub(crate) use type_inference::infer_semantic_type;

/// Number of sample values collected per column.
const SAMPLES_PER_COLUMN: usize = 10;

/// Profiler for dataset structure and column characteristics.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile an entire dataset.
    ///
    /// Analyzes each column and counts exact duplicate rows.
    pub fn profile_dataset(df: &DataFrame) -> Result<DatasetProfile> {
        let mut column_profiles = Vec::with_capacity(df.width());

        for col_name in df.get_column_names() {
            column_profiles.push(Self::profile_column(df, col_name)?);
        }

        let duplicate_count = df.height()
            - df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?
                .height();
        let duplicate_percentage = if df.height() > 0 {
            (duplicate_count as f64 / df.height() as f64) * 100.0
        } else {
            0.0
        };

        Ok(DatasetProfile {
            shape: (df.height(), df.width()),
            column_profiles,
            duplicate_count,
            duplicate_percentage,
        })
    }

    fn profile_column(df: &DataFrame, col_name: &str) -> Result<ColumnProfile> {
        let col = df.column(col_name)?;
        let series = col.as_materialized_series();
        let dtype = format!("{:?}", series.dtype());
        let unique_count = series.n_unique()?;
        let null_count = series.null_count();
        let null_percentage = if df.height() > 0 {
            (null_count as f64 / df.height() as f64) * 100.0
        } else {
            0.0
        };

        let sample_values = Self::sample_column_values(series);
        let inferred_type = infer_semantic_type(series, &sample_values)?;
        let characteristics = extract_column_characteristics(series, &inferred_type, unique_count)?;

        Ok(ColumnProfile {
            name: col_name.to_string(),
            dtype,
            unique_count,
            null_count,
            null_percentage,
            sample_values,
            inferred_type,
            characteristics,
        })
    }

    /// Seeded random sample of non-null values, formatted for display.
    ///
    /// The fixed seed keeps profiles stable across runs on the same data.
    fn sample_column_values(series: &Series) -> Vec<String> {
        let non_null = series.drop_nulls();
        if non_null.is_empty() {
            return Vec::new();
        }

        let sample_size = SAMPLES_PER_COLUMN.min(non_null.len());
        let mut rng = StdRng::seed_from_u64(42);
        let indices: Vec<usize> = (0..non_null.len()).collect();

        indices
            .choose_multiple(&mut rng, sample_size)
            .filter_map(|&idx| non_null.get(idx).ok().map(|v| format!("{}", v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile_dataset_shape() {
        let df = df! {
            "price" => &[10.0, 20.0, 30.0],
            "name" => &["a", "b", "c"],
        }
        .unwrap();

        let profile = DataProfiler::profile_dataset(&df).unwrap();
        assert_eq!(profile.shape, (3, 2));
        assert_eq!(profile.column_profiles.len(), 2);
    }

    #[test]
    fn test_profile_counts_nulls() {
        let df = df! {
            "price" => &[Some(10.0), None, Some(30.0), None],
        }
        .unwrap();

        let profile = DataProfiler::profile_dataset(&df).unwrap();
        let col = profile.column("price").unwrap();
        assert_eq!(col.null_count, 2);
        assert!((col.null_percentage - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_profile_counts_duplicates() {
        let df = df! {
            "a" => &[1i64, 1, 2, 3],
            "b" => &["x", "x", "y", "z"],
        }
        .unwrap();

        let profile = DataProfiler::profile_dataset(&df).unwrap();
        assert_eq!(profile.duplicate_count, 1);
        assert!((profile.duplicate_percentage - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_profile_infers_numeric_type() {
        let df = df! {
            "amount" => &[1.5, 2.5, 3.5],
        }
        .unwrap();

        let profile = DataProfiler::profile_dataset(&df).unwrap();
        assert_eq!(profile.column("amount").unwrap().inferred_type, "numeric");
        assert_eq!(profile.numeric_columns(), vec!["amount".to_string()]);
    }

    #[test]
    fn test_profile_sample_values_nonempty() {
        let df = df! {
            "name" => &["alpha", "beta", "gamma"],
        }
        .unwrap();

        let profile = DataProfiler::profile_dataset(&df).unwrap();
        let samples = &profile.column("name").unwrap().sample_values;
        assert_eq!(samples.len(), 3);
    }

    #[test]
    fn test_profile_empty_dataframe() {
        let df = DataFrame::empty();
        let profile = DataProfiler::profile_dataset(&df).unwrap();
        assert_eq!(profile.shape, (0, 0));
        assert_eq!(profile.duplicate_count, 0);
    }
}
