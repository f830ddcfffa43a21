//! Configuration types for the data cleaning pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Policy for handling values flagged by z-score outlier detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierPolicy {
    /// Remove rows containing flagged values
    Drop,
    /// Remove flagged rows from the main table and keep them as a
    /// separate table on the result
    Separate,
    /// Replace flagged values with the column mean over unflagged values
    MeanImpute,
    /// Detect and report only
    #[default]
    Keep,
}

/// Strategy for handling missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingValueStrategy {
    /// Drop columns listed in `drop_columns` and columns whose null ratio
    /// exceeds `missing_column_threshold`
    DropColumn,
    /// Chained multiple imputation over numeric columns (mode for strings)
    #[default]
    MultipleImputation,
    /// Median for numerics, mode for strings
    Median,
    /// Mean for numerics, mode for strings
    Mean,
    /// Mode for every column
    Mode,
}

/// Configuration for the cleaning pipeline.
///
/// Use [`CleaningConfig::builder()`] for a fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use tidyframe::config::{CleaningConfig, OutlierPolicy};
///
/// let config = CleaningConfig::builder()
///     .outlier_policy(OutlierPolicy::MeanImpute)
///     .zscore_threshold(2.5)
///     .dedup_keys(["order_id", "customer_id"])
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Strategy for handling missing values.
    /// Default: MultipleImputation
    pub missing_strategy: MissingValueStrategy,

    /// Columns to drop unconditionally before imputation.
    /// Default: empty
    pub drop_columns: Vec<String>,

    /// Columns whose null ratio exceeds this threshold are dropped when the
    /// missing strategy is DropColumn (0.0 - 1.0).
    /// Default: 0.7 (70%)
    pub missing_column_threshold: f64,

    /// Number of rounds for multiple imputation.
    /// Default: 5
    pub imputation_rounds: usize,

    /// Number of donor rows considered per missing cell during imputation.
    /// Default: 5
    pub imputation_donors: usize,

    /// Seed for the imputation noise; fixed seed gives deterministic output.
    /// Default: 42
    pub imputation_seed: u64,

    /// Policy for values flagged as outliers.
    /// Default: Keep
    pub outlier_policy: OutlierPolicy,

    /// Absolute z-score beyond which a value is flagged (strict inequality).
    /// Default: 3.0
    pub zscore_threshold: f64,

    /// Key columns for deduplication; first occurrence per key tuple wins.
    /// Empty means whole-row deduplication.
    /// Default: empty
    pub dedup_keys: Vec<String>,

    /// Whether to run deduplication at all.
    /// Default: true
    pub remove_duplicates: bool,

    /// Whether to convert string columns with numeric content ("$50", "1,200")
    /// to numeric types.
    /// Default: true
    pub normalize_numeric_strings: bool,

    /// Output directory for the cleaned CSV.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Custom output file name (without extension).
    /// If None, "cleaned" is used.
    /// Default: None
    pub output_name: Option<String>,

    /// Whether to write the cleaned data (and separated outliers) to disk.
    /// When false, results are kept in memory only.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            missing_strategy: MissingValueStrategy::default(),
            drop_columns: Vec::new(),
            missing_column_threshold: 0.7,
            imputation_rounds: 5,
            imputation_donors: 5,
            imputation_seed: 42,
            outlier_policy: OutlierPolicy::default(),
            zscore_threshold: 3.0,
            dedup_keys: Vec::new(),
            remove_duplicates: true,
            normalize_numeric_strings: true,
            output_dir: PathBuf::from("output"),
            output_name: None,
            save_to_disk: true,
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.missing_column_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "missing_column_threshold".to_string(),
                value: self.missing_column_threshold,
            });
        }

        if self.zscore_threshold <= 0.0 || !self.zscore_threshold.is_finite() {
            return Err(ConfigValidationError::InvalidZScoreThreshold(
                self.zscore_threshold,
            ));
        }

        if self.imputation_rounds == 0 {
            return Err(ConfigValidationError::InvalidImputationRounds(
                self.imputation_rounds,
            ));
        }

        if self.imputation_donors == 0 {
            return Err(ConfigValidationError::InvalidImputationDonors(
                self.imputation_donors,
            ));
        }

        Ok(())
    }

    /// Full path of the cleaned CSV output.
    pub fn output_path(&self) -> PathBuf {
        let name = self.output_name.as_deref().unwrap_or("cleaned");
        self.output_dir.join(format!("{}.csv", name))
    }

    /// Full path of the separated-outliers CSV output.
    pub fn separated_path(&self) -> PathBuf {
        let name = self.output_name.as_deref().unwrap_or("cleaned");
        self.output_dir.join(format!("{}_outliers.csv", name))
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid z-score threshold: {0} (must be a positive finite number)")]
    InvalidZScoreThreshold(f64),

    #[error("Invalid imputation rounds: {0} (must be at least 1)")]
    InvalidImputationRounds(usize),

    #[error("Invalid imputation donors: {0} (must be at least 1)")]
    InvalidImputationDonors(usize),
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    missing_strategy: Option<MissingValueStrategy>,
    drop_columns: Option<Vec<String>>,
    missing_column_threshold: Option<f64>,
    imputation_rounds: Option<usize>,
    imputation_donors: Option<usize>,
    imputation_seed: Option<u64>,
    outlier_policy: Option<OutlierPolicy>,
    zscore_threshold: Option<f64>,
    dedup_keys: Option<Vec<String>>,
    remove_duplicates: Option<bool>,
    normalize_numeric_strings: Option<bool>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    save_to_disk: Option<bool>,
}

impl CleaningConfigBuilder {
    /// Set the missing-value strategy.
    pub fn missing_strategy(mut self, strategy: MissingValueStrategy) -> Self {
        self.missing_strategy = Some(strategy);
        self
    }

    /// Set columns to drop unconditionally.
    pub fn drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the null-ratio threshold for dropping columns.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.7 = 70%)
    pub fn missing_column_threshold(mut self, threshold: f64) -> Self {
        self.missing_column_threshold = Some(threshold);
        self
    }

    /// Set the number of multiple-imputation rounds.
    pub fn imputation_rounds(mut self, rounds: usize) -> Self {
        self.imputation_rounds = Some(rounds);
        self
    }

    /// Set the number of donor rows per missing cell.
    pub fn imputation_donors(mut self, donors: usize) -> Self {
        self.imputation_donors = Some(donors);
        self
    }

    /// Set the imputation seed (fixed seed gives deterministic output).
    pub fn imputation_seed(mut self, seed: u64) -> Self {
        self.imputation_seed = Some(seed);
        self
    }

    /// Set the policy for flagged outlier values.
    pub fn outlier_policy(mut self, policy: OutlierPolicy) -> Self {
        self.outlier_policy = Some(policy);
        self
    }

    /// Set the absolute z-score beyond which a value is flagged.
    pub fn zscore_threshold(mut self, threshold: f64) -> Self {
        self.zscore_threshold = Some(threshold);
        self
    }

    /// Set the key columns for deduplication.
    pub fn dedup_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dedup_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Enable or disable numeric-string normalization.
    pub fn normalize_numeric_strings(mut self, normalize: bool) -> Self {
        self.normalize_numeric_strings = Some(normalize);
        self
    }

    /// Set the output directory for the cleaned CSV.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set a custom output file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable saving cleaned data to disk.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let config = CleaningConfig {
            missing_strategy: self.missing_strategy.unwrap_or_default(),
            drop_columns: self.drop_columns.unwrap_or_default(),
            missing_column_threshold: self.missing_column_threshold.unwrap_or(0.7),
            imputation_rounds: self.imputation_rounds.unwrap_or(5),
            imputation_donors: self.imputation_donors.unwrap_or(5),
            imputation_seed: self.imputation_seed.unwrap_or(42),
            outlier_policy: self.outlier_policy.unwrap_or_default(),
            zscore_threshold: self.zscore_threshold.unwrap_or(3.0),
            dedup_keys: self.dedup_keys.unwrap_or_default(),
            remove_duplicates: self.remove_duplicates.unwrap_or(true),
            normalize_numeric_strings: self.normalize_numeric_strings.unwrap_or(true),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("output")),
            output_name: self.output_name,
            save_to_disk: self.save_to_disk.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
