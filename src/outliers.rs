//! Z-score outlier detection and treatment.
//!
//! Every numeric column is scanned for values whose |z| exceeds the
//! configured threshold (strict inequality, so a value sitting exactly on
//! the threshold is not flagged). What happens to flagged values is decided
//! by the [`OutlierPolicy`]: report only, drop the rows, split them into a
//! separate table, or replace them with the mean of the unflagged values.

use crate::config::{CleaningConfig, OutlierPolicy};
use crate::error::Result;
use crate::profiler::{column_mean_std, zscores};
use crate::types::OutlierFinding;
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use tracing::{debug, info};

/// Result of the outlier stage.
#[derive(Debug)]
pub struct OutlierOutcome {
    pub df: DataFrame,
    /// Rows removed from the main table under the Separate policy.
    pub separated: Option<DataFrame>,
    pub findings: Vec<OutlierFinding>,
    pub rows_removed: usize,
    pub values_imputed: usize,
    pub actions: Vec<String>,
}

pub struct OutlierHandler {
    threshold: f64,
    policy: OutlierPolicy,
}

impl OutlierHandler {
    pub fn new(threshold: f64, policy: OutlierPolicy) -> Self {
        Self { threshold, policy }
    }

    pub fn from_config(config: &CleaningConfig) -> Self {
        Self::new(config.zscore_threshold, config.outlier_policy)
    }

    /// Detect outliers in every numeric column and apply the policy.
    pub fn run(&self, df: DataFrame) -> Result<OutlierOutcome> {
        let (findings, column_masks) = self.detect(&df)?;

        let flagged_total: usize = findings.iter().map(|f| f.flagged_count).sum();
        if flagged_total == 0 {
            debug!("No outliers beyond |z| > {}", self.threshold);
            return Ok(OutlierOutcome {
                df,
                separated: None,
                findings,
                rows_removed: 0,
                values_imputed: 0,
                actions: Vec::new(),
            });
        }

        info!(
            "Flagged {} value(s) beyond |z| > {} across {} column(s)",
            flagged_total,
            self.threshold,
            findings.iter().filter(|f| f.flagged_count > 0).count()
        );

        match self.policy {
            OutlierPolicy::Keep => Ok(OutlierOutcome {
                df,
                separated: None,
                findings,
                rows_removed: 0,
                values_imputed: 0,
                actions: vec![format!(
                    "Detected {} outlier value(s); kept in place",
                    flagged_total
                )],
            }),
            OutlierPolicy::Drop => {
                let row_mask = combine_row_masks(&column_masks, df.height());
                let keep = BooleanChunked::from_iter_values(
                    "keep".into(),
                    row_mask.iter().map(|flagged| !flagged),
                );
                let filtered = df.filter(&keep)?;
                let rows_removed = row_mask.iter().filter(|&&f| f).count();

                Ok(OutlierOutcome {
                    df: filtered,
                    separated: None,
                    findings,
                    rows_removed,
                    values_imputed: 0,
                    actions: vec![format!("Dropped {} row(s) containing outliers", rows_removed)],
                })
            }
            OutlierPolicy::Separate => {
                let row_mask = combine_row_masks(&column_masks, df.height());
                let flagged = BooleanChunked::from_iter_values(
                    "flagged".into(),
                    row_mask.iter().copied(),
                );
                let keep = BooleanChunked::from_iter_values(
                    "keep".into(),
                    row_mask.iter().map(|f| !f),
                );

                let separated = df.filter(&flagged)?;
                let main = df.filter(&keep)?;
                let rows_removed = separated.height();

                Ok(OutlierOutcome {
                    df: main,
                    separated: Some(separated),
                    findings,
                    rows_removed,
                    values_imputed: 0,
                    actions: vec![format!(
                        "Separated {} row(s) containing outliers into their own table",
                        rows_removed
                    )],
                })
            }
            OutlierPolicy::MeanImpute => {
                let mut df = df;
                let mut imputed = 0;
                let mut actions = Vec::new();

                for (col_name, mask) in &column_masks {
                    let count = mask.iter().filter(|&&f| f).count();
                    if count == 0 {
                        continue;
                    }
                    imputed += self.impute_flagged(&mut df, col_name, mask)?;
                    actions.push(format!(
                        "Replaced {} outlier value(s) in '{}' with the unflagged mean",
                        count, col_name
                    ));
                }

                Ok(OutlierOutcome {
                    df,
                    separated: None,
                    findings,
                    rows_removed: 0,
                    values_imputed: imputed,
                    actions,
                })
            }
        }
    }

    /// Per-column findings and flag masks. Nulls are never flagged.
    fn detect(&self, df: &DataFrame) -> Result<(Vec<OutlierFinding>, Vec<(String, Vec<bool>)>)> {
        let mut findings = Vec::new();
        let mut masks = Vec::new();

        for col in df.get_columns() {
            if !is_numeric_dtype(col.dtype()) {
                continue;
            }

            let series = col.as_materialized_series().clone();
            let scores = zscores(&series)?;
            let mask: Vec<bool> = scores
                .iter()
                .map(|opt| opt.map(|z| z.abs() > self.threshold).unwrap_or(false))
                .collect();

            let flagged_count = mask.iter().filter(|&&f| f).count();
            let (mean, std) = column_mean_std(&series)?.unwrap_or((0.0, 0.0));

            let (min_flagged, max_flagged) = if flagged_count > 0 {
                flagged_extremes(&series, &mask)?
            } else {
                (None, None)
            };

            findings.push(OutlierFinding {
                column: col.name().to_string(),
                flagged_count,
                mean,
                std,
                min_flagged,
                max_flagged,
            });
            masks.push((col.name().to_string(), mask));
        }

        Ok((findings, masks))
    }

    /// Replace flagged values with the mean of the unflagged ones.
    fn impute_flagged(
        &self,
        df: &mut DataFrame,
        col_name: &str,
        mask: &[bool],
    ) -> Result<usize> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let float_series = series.cast(&DataType::Float64)?;
        let chunked = float_series.f64()?;

        let mut sum = 0.0;
        let mut count = 0usize;
        for (idx, opt) in chunked.into_iter().enumerate() {
            if let Some(val) = opt
                && !mask[idx]
            {
                sum += val;
                count += 1;
            }
        }
        // Every non-null value flagged; nothing sane to impute from.
        if count == 0 {
            return Ok(0);
        }
        let clean_mean = sum / count as f64;

        let mut imputed = 0;
        let values: Vec<Option<f64>> = chunked
            .into_iter()
            .enumerate()
            .map(|(idx, opt)| {
                if mask[idx] && opt.is_some() {
                    imputed += 1;
                    Some(clean_mean)
                } else {
                    opt
                }
            })
            .collect();

        df.replace(col_name, Series::new(col_name.into(), values))?;
        Ok(imputed)
    }
}

/// A row is flagged when any column flags it.
fn combine_row_masks(column_masks: &[(String, Vec<bool>)], n_rows: usize) -> Vec<bool> {
    let mut combined = vec![false; n_rows];
    for (_, mask) in column_masks {
        for (idx, &flag) in mask.iter().enumerate() {
            if flag {
                combined[idx] = true;
            }
        }
    }
    combined
}

/// Min and max of the flagged values in a column.
fn flagged_extremes(series: &Series, mask: &[bool]) -> Result<(Option<f64>, Option<f64>)> {
    let float_series = series.cast(&DataType::Float64)?;
    let chunked = float_series.f64()?;

    let mut min = None;
    let mut max = None;
    for (idx, opt) in chunked.into_iter().enumerate() {
        if let Some(val) = opt
            && mask[idx]
        {
            min = Some(min.map_or(val, |m: f64| m.min(val)));
            max = Some(max.map_or(val, |m: f64| m.max(val)));
        }
    }
    Ok((min, max))
}
