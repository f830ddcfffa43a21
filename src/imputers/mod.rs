//! Missing-value handling.
//!
//! Two families of treatment: dropping columns that are too sparse to save,
//! and imputing the rest. Numeric columns can go through chained multiple
//! imputation or plain mean/median fills; string columns get the mode and
//! datetime columns are carried from their neighbors.

mod multiple;
mod statistical;

pub use multiple::MultipleImputer;
pub use statistical::StatisticalImputer;

use crate::config::{CleaningConfig, MissingValueStrategy};
use crate::error::{CleaningError, Result};
use crate::utils::{DtypeCategory, dtype_category};
use polars::prelude::*;
use tracing::{info, warn};

/// What the missing-value stage did, for the run summary.
#[derive(Debug, Default)]
pub struct MissingReport {
    pub dropped_columns: Vec<String>,
    pub values_imputed: usize,
    pub actions: Vec<String>,
    pub warnings: Vec<String>,
}

/// Applies the configured missing-value strategy to a frame.
pub struct MissingValueHandler<'a> {
    config: &'a CleaningConfig,
}

impl<'a> MissingValueHandler<'a> {
    pub fn new(config: &'a CleaningConfig) -> Self {
        Self { config }
    }

    pub fn handle(&self, df: DataFrame) -> Result<(DataFrame, MissingReport)> {
        let mut df = df;
        let mut report = MissingReport::default();

        // Explicitly requested drops happen regardless of strategy.
        for col_name in &self.config.drop_columns {
            if df.column(col_name).is_err() {
                return Err(CleaningError::ColumnNotFound(col_name.clone()));
            }
            df = df.drop(col_name)?;
            report.dropped_columns.push(col_name.clone());
            report
                .actions
                .push(format!("Dropped column '{}' (requested)", col_name));
        }

        match self.config.missing_strategy {
            MissingValueStrategy::DropColumn => {
                self.drop_sparse_columns(&mut df, &mut report)?;
            }
            MissingValueStrategy::MultipleImputation => {
                let imputer = MultipleImputer::new(
                    self.config.imputation_rounds,
                    self.config.imputation_donors,
                    self.config.imputation_seed,
                );
                let (imputed_df, count) = imputer.impute(&df)?;
                df = imputed_df;
                if count > 0 {
                    report.values_imputed += count;
                    report.actions.push(format!(
                        "Imputed {} numeric value(s) via multiple imputation ({} rounds)",
                        count, self.config.imputation_rounds
                    ));
                }
                self.fill_non_numeric(&mut df, &mut report)?;
            }
            MissingValueStrategy::Mean => {
                self.fill_numeric_with(&mut df, &mut report, "mean", StatisticalImputer::fill_mean)?;
                self.fill_non_numeric(&mut df, &mut report)?;
            }
            MissingValueStrategy::Median => {
                self.fill_numeric_with(
                    &mut df,
                    &mut report,
                    "median",
                    StatisticalImputer::fill_median,
                )?;
                self.fill_non_numeric(&mut df, &mut report)?;
            }
            MissingValueStrategy::Mode => {
                self.fill_all_with_mode(&mut df, &mut report)?;
            }
        }

        if report.values_imputed > 0 || !report.dropped_columns.is_empty() {
            info!(
                "Missing values: {} imputed, {} column(s) dropped",
                report.values_imputed,
                report.dropped_columns.len()
            );
        }

        Ok((df, report))
    }

    /// Drop columns whose null ratio exceeds the configured threshold.
    fn drop_sparse_columns(&self, df: &mut DataFrame, report: &mut MissingReport) -> Result<()> {
        if df.height() == 0 {
            return Ok(());
        }

        let threshold = self.config.missing_column_threshold;
        let sparse: Vec<(String, f64)> = df
            .get_columns()
            .iter()
            .filter_map(|col| {
                let ratio = col.null_count() as f64 / df.height() as f64;
                (ratio > threshold).then(|| (col.name().to_string(), ratio))
            })
            .collect();

        for (col_name, ratio) in sparse {
            *df = df.drop(&col_name)?;
            report.actions.push(format!(
                "Dropped column '{}' ({:.0}% missing)",
                col_name,
                ratio * 100.0
            ));
            report.dropped_columns.push(col_name);
        }

        Ok(())
    }

    fn fill_numeric_with(
        &self,
        df: &mut DataFrame,
        report: &mut MissingReport,
        method: &str,
        fill: impl Fn(&mut DataFrame, &str) -> Result<usize>,
    ) -> Result<()> {
        for col_name in self.columns_with_nulls(df, DtypeCategory::Numeric) {
            let filled = fill(df, &col_name)?;
            if filled > 0 {
                report.values_imputed += filled;
                report.actions.push(format!(
                    "Filled {} value(s) in '{}' with column {}",
                    filled, col_name, method
                ));
            }
        }
        Ok(())
    }

    /// Mode for strings, neighbor fill for datetimes. Boolean and other
    /// dtypes are left as-is with a warning.
    fn fill_non_numeric(&self, df: &mut DataFrame, report: &mut MissingReport) -> Result<()> {
        let columns: Vec<(String, DtypeCategory)> = df
            .get_columns()
            .iter()
            .filter(|col| col.null_count() > 0)
            .map(|col| (col.name().to_string(), dtype_category(col.dtype())))
            .collect();

        for (col_name, category) in columns {
            match category {
                DtypeCategory::Numeric => {}
                DtypeCategory::String => {
                    let filled = StatisticalImputer::fill_mode(df, &col_name)?;
                    if filled > 0 {
                        report.values_imputed += filled;
                        report.actions.push(format!(
                            "Filled {} value(s) in '{}' with column mode",
                            filled, col_name
                        ));
                    }
                }
                DtypeCategory::Datetime => {
                    let filled = StatisticalImputer::fill_datetime(df, &col_name)?;
                    if filled > 0 {
                        report.values_imputed += filled;
                        report.actions.push(format!(
                            "Filled {} value(s) in '{}' from neighboring rows",
                            filled, col_name
                        ));
                    }
                }
                DtypeCategory::Boolean | DtypeCategory::Other => {
                    let message =
                        format!("Column '{}' still has missing values after imputation", col_name);
                    warn!("{}", message);
                    report.warnings.push(message);
                }
            }
        }

        Ok(())
    }

    fn fill_all_with_mode(&self, df: &mut DataFrame, report: &mut MissingReport) -> Result<()> {
        let columns: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| col.null_count() > 0)
            .map(|col| col.name().to_string())
            .collect();

        for col_name in columns {
            if dtype_category(df.column(&col_name)?.dtype()) == DtypeCategory::Datetime {
                let filled = StatisticalImputer::fill_datetime(df, &col_name)?;
                report.values_imputed += filled;
                continue;
            }

            let filled = StatisticalImputer::fill_mode(df, &col_name)?;
            if filled > 0 {
                report.values_imputed += filled;
                report.actions.push(format!(
                    "Filled {} value(s) in '{}' with column mode",
                    filled, col_name
                ));
            }
        }
        Ok(())
    }

    fn columns_with_nulls(&self, df: &DataFrame, category: DtypeCategory) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| col.null_count() > 0 && dtype_category(col.dtype()) == category)
            .map(|col| col.name().to_string())
            .collect()
    }
}
