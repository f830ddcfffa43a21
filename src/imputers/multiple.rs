//! Chained multiple imputation for numeric columns.
//!
//! Each missing cell is estimated several times from its nearest donor rows,
//! with seeded noise added per round, and the rounds are averaged. The noise
//! keeps a single donor neighborhood from dominating; averaging keeps the
//! final value stable. A fixed seed makes the whole procedure deterministic.

use crate::error::Result;
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

pub struct MultipleImputer {
    rounds: usize,
    donors: usize,
    seed: u64,
}

impl MultipleImputer {
    pub fn new(rounds: usize, donors: usize, seed: u64) -> Self {
        Self {
            rounds: rounds.max(1),
            donors: donors.max(1),
            seed,
        }
    }

    /// Impute nulls in every numeric column.
    ///
    /// Returns the updated frame and the number of imputed cells. Columns
    /// with no observed values at all are left untouched.
    pub fn impute(&self, df: &DataFrame) -> Result<(DataFrame, usize)> {
        let mut result = df.clone();

        let numeric_cols: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect();

        let target_cols: Vec<String> = numeric_cols
            .iter()
            .filter(|name| {
                df.column(name)
                    .map(|col| {
                        let nulls = col.null_count();
                        nulls > 0 && nulls < col.len()
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        if target_cols.is_empty() {
            return Ok((result, 0));
        }

        debug!(
            "Multiple imputation over {} column(s), {} round(s), {} donor(s)",
            target_cols.len(),
            self.rounds,
            self.donors
        );

        let matrix = build_matrix(df, &numeric_cols)?;
        let n_rows = df.height();
        let mut imputed_total = 0;

        for col_name in &target_cols {
            let col_idx = numeric_cols
                .iter()
                .position(|c| c == col_name)
                .ok_or_else(|| {
                    crate::error::CleaningError::Internal(format!(
                        "numeric column '{}' missing from matrix",
                        col_name
                    ))
                })?;

            let series = df.column(col_name)?.as_materialized_series().clone();
            let null_mask = series.is_null();
            let missing_rows: Vec<usize> = (0..n_rows)
                .filter(|&row| null_mask.get(row).unwrap_or(false))
                .collect();

            // Accumulated estimates per missing row, averaged after all rounds.
            let mut sums = vec![0.0f64; missing_rows.len()];

            for round in 0..self.rounds {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(round as u64));

                for (slot, &row_idx) in missing_rows.iter().enumerate() {
                    let (estimate, spread) = self.donor_estimate(&matrix, row_idx, col_idx);
                    let noise = rng.gen_range(-1.0..1.0) * spread;
                    sums[slot] += estimate + noise;
                }
            }

            let mut values: Vec<Option<f64>> = Vec::with_capacity(n_rows);
            let float_series = series.cast(&DataType::Float64)?;
            let chunked = float_series.f64()?;
            let mut slot = 0;
            for row_idx in 0..n_rows {
                if null_mask.get(row_idx).unwrap_or(false) {
                    values.push(Some(sums[slot] / self.rounds as f64));
                    slot += 1;
                } else {
                    values.push(chunked.get(row_idx));
                }
            }

            imputed_total += missing_rows.len();
            result.replace(col_name, Series::new(col_name.as_str().into(), values))?;
        }

        Ok((result, imputed_total))
    }

    /// Weighted donor estimate plus the donor-value spread used to scale noise.
    ///
    /// Donors are the nearest rows with an observed target value; the estimate
    /// is their inverse-distance weighted average. Falls back to the column
    /// mean when no usable donor exists.
    fn donor_estimate(&self, matrix: &[Vec<Option<f64>>], target_row: usize, target_col: usize) -> (f64, f64) {
        let mut candidates: Vec<(usize, f64)> = matrix
            .iter()
            .enumerate()
            .filter(|(row, values)| *row != target_row && values[target_col].is_some())
            .map(|(row, values)| {
                (
                    row,
                    row_distance(&matrix[target_row], values, target_col),
                )
            })
            .collect();

        if candidates.is_empty() {
            return (column_mean(matrix, target_col), 0.0);
        }

        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let k = self.donors.min(candidates.len());
        let nearest = &candidates[..k];

        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        let mut donor_values = Vec::with_capacity(k);

        for &(row, distance) in nearest {
            if let Some(value) = matrix[row][target_col] {
                let weight = if distance < 1e-10 {
                    1e10
                } else if distance.is_finite() {
                    1.0 / distance
                } else {
                    // No overlapping features; barely counts.
                    1e-10
                };
                weighted_sum += value * weight;
                weight_sum += weight;
                donor_values.push(value);
            }
        }

        if weight_sum <= 0.0 {
            return (column_mean(matrix, target_col), 0.0);
        }

        let estimate = weighted_sum / weight_sum;
        (estimate, donor_spread(&donor_values))
    }
}

/// Snapshot of the numeric columns as an f64 matrix, nulls preserved.
fn build_matrix(df: &DataFrame, columns: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
    let n_rows = df.height();
    let mut matrix = vec![vec![None; columns.len()]; n_rows];

    for (col_idx, col_name) in columns.iter().enumerate() {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let float_series = series.cast(&DataType::Float64)?;
        let chunked = float_series.f64()?;

        for (row_idx, row) in matrix.iter_mut().enumerate().take(n_rows) {
            row[col_idx] = chunked.get(row_idx);
        }
    }

    Ok(matrix)
}

/// Normalized Euclidean distance between two rows, skipping the target column
/// and any feature that is null on either side.
fn row_distance(row1: &[Option<f64>], row2: &[Option<f64>], skip_col: usize) -> f64 {
    let mut sum_squared = 0.0;
    let mut count = 0;

    for (col_idx, (a, b)) in row1.iter().zip(row2.iter()).enumerate() {
        if col_idx == skip_col {
            continue;
        }
        if let (Some(val1), Some(val2)) = (a, b) {
            let diff = val1 - val2;
            sum_squared += diff * diff;
            count += 1;
        }
    }

    if count > 0 {
        (sum_squared / count as f64).sqrt()
    } else {
        f64::INFINITY
    }
}

fn column_mean(matrix: &[Vec<Option<f64>>], col: usize) -> f64 {
    let mut sum = 0.0;
    let mut count = 0;
    for row in matrix {
        if let Some(value) = row[col] {
            sum += value;
            count += 1;
        }
    }
    if count > 0 { sum / count as f64 } else { 0.0 }
}

/// Sample standard deviation of the donor values; zero for a single donor.
fn donor_spread(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
