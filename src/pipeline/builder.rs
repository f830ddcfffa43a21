//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the data cleaning workflow.

use crate::cleaner::NumericNormalizer;
use crate::config::CleaningConfig;
use crate::dedup;
use crate::error::{CleaningError, Result};
use crate::imputers::MissingValueHandler;
use crate::ingest;
use crate::outliers::{OutlierHandler, OutlierOutcome};
use crate::output;
use crate::pipeline::progress::{
    CancellationToken, CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::profiler::DataProfiler;
use crate::types::{ActionType, CleaningAction, CleaningResult, CleaningSummary};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The main cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use tidyframe::{Pipeline, CleaningConfig, CancellationToken};
/// use tidyframe::config::OutlierPolicy;
///
/// let token = CancellationToken::new();
///
/// let result = Pipeline::builder()
///     .config(
///         CleaningConfig::builder()
///             .outlier_policy(OutlierPolicy::Separate)
///             .dedup_keys(["order_id", "customer_id"])
///             .build()?,
///     )
///     .cancellation_token(token.clone())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(dataframe)?;
/// ```
pub struct Pipeline {
    config: CleaningConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
}

// Ensure Pipeline is Send (can be moved to another thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Process a DataFrame through the cleaning pipeline.
    ///
    /// Returns a `CleaningResult` containing output paths and metadata.
    ///
    /// # Errors
    ///
    /// Returns `Err(CleaningError::Cancelled)` if the pipeline was cancelled
    /// via the cancellation token. Other errors may occur during processing.
    pub fn process(&self, df: DataFrame) -> Result<CleaningResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Load a file and process it through the cleaning pipeline.
    ///
    /// The format is detected from the file extension (with content sniffing
    /// as fallback); see [`crate::ingest::load_table`].
    pub fn process_file(&self, path: &Path) -> Result<CleaningResult> {
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Initializing,
            0.0,
            format!("Loading {}", path.display()),
        ));
        self.check_cancelled()?;

        let loaded = ingest::load_table(path)?;
        let ingest_step = format!(
            "Ingested {} as {} ({} rows x {} columns)",
            path.display(),
            loaded.format.display_name(),
            loaded.df.height(),
            loaded.df.width()
        );

        let mut result = self.process(loaded.df)?;
        result.processing_steps.insert(0, ingest_step.clone());
        if let Some(summary) = result.summary.as_mut() {
            summary.actions.insert(
                0,
                CleaningAction::new(
                    ActionType::FileIngested,
                    path.display().to_string(),
                    ingest_step,
                ),
            );
        }
        Ok(result)
    }

    /// Check if cancellation has been requested.
    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(CleaningError::Cancelled);
        }
        Ok(())
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<CleaningResult> {
        let start_time = Instant::now();

        info!("Starting cleaning pipeline...");
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Initializing,
            0.0,
            "Starting cleaning pipeline...",
        ));

        if df.height() == 0 || df.width() == 0 {
            return Err(CleaningError::NoDataLoaded);
        }

        let mut summary = CleaningSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();
        summary.completeness_before = completeness(&df);

        let mut processing_steps: Vec<String> = Vec::new();

        self.check_cancelled()?;

        // Step 1: Numeric-string normalization (if enabled)
        let df = if self.config.normalize_numeric_strings {
            self.report_progress(ProgressUpdate::new(
                CleaningStage::Normalizing,
                0.0,
                "Normalizing numeric strings...",
            ));
            info!("Step 1: Normalizing numeric strings...");

            let (normalized, actions) = NumericNormalizer
                .normalize(df)
                .map_err(|e| CleaningError::Internal(format!("numeric normalization: {e}")))?;

            for action in &actions {
                summary.add_action(CleaningAction::new(
                    ActionType::NumericNormalized,
                    "dataset",
                    action.clone(),
                ));
            }
            processing_steps.extend(actions);

            self.report_progress(ProgressUpdate::new(
                CleaningStage::Normalizing,
                1.0,
                "Normalization complete",
            ));

            normalized
        } else {
            info!("Step 1: Skipping numeric-string normalization (disabled)");
            df
        };

        self.check_cancelled()?;

        // Step 2: Profile the dataset
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Profiling,
            0.0,
            "Profiling dataset...",
        ));
        info!("Step 2: Profiling dataset...");

        let profile = DataProfiler::profile_dataset(&df)
            .map_err(|e| CleaningError::ProfilingFailed(e.to_string()))?;

        debug!("Shape: {:?}", profile.shape);
        for col in &profile.column_profiles {
            debug!(
                "  {}: {} (inferred: {})",
                col.name, col.dtype, col.inferred_type
            );
        }

        self.report_progress(ProgressUpdate::new(
            CleaningStage::Profiling,
            1.0,
            format!(
                "Profiled {} columns, {:.1}% duplicate rows",
                profile.column_profiles.len(),
                profile.duplicate_percentage
            ),
        ));

        self.check_cancelled()?;

        // Step 3: Missing values
        self.report_progress(ProgressUpdate::new(
            CleaningStage::MissingValues,
            0.0,
            "Handling missing values...",
        ));
        info!("Step 3: Handling missing values...");

        let (df, missing_report) = MissingValueHandler::new(&self.config).handle(df)?;

        summary.values_imputed += missing_report.values_imputed;
        for action in &missing_report.actions {
            let action_type = if action.starts_with("Dropped") {
                ActionType::ColumnRemoved
            } else {
                ActionType::ValueImputed
            };
            summary.add_action(CleaningAction::new(action_type, "dataset", action.clone()));
        }
        for warning in missing_report.warnings {
            summary.add_warning(warning);
        }
        processing_steps.extend(missing_report.actions);

        self.report_progress(ProgressUpdate::new(
            CleaningStage::MissingValues,
            1.0,
            format!("Imputed {} value(s)", summary.values_imputed),
        ));

        self.check_cancelled()?;

        // Step 4: Outliers
        self.report_progress(ProgressUpdate::new(
            CleaningStage::OutlierHandling,
            0.0,
            "Detecting outliers...",
        ));
        info!("Step 4: Detecting outliers...");

        let OutlierOutcome {
            df,
            separated,
            findings,
            rows_removed: outlier_rows_removed,
            values_imputed: outlier_values_imputed,
            actions: outlier_actions,
        } = OutlierHandler::from_config(&self.config).run(df)?;
        let mut df = df;

        summary.outliers_handled += outlier_rows_removed + outlier_values_imputed;
        for action in &outlier_actions {
            summary.add_action(CleaningAction::new(
                ActionType::OutlierHandled,
                "dataset",
                action.clone(),
            ));
        }
        processing_steps.extend(outlier_actions);

        self.report_progress(ProgressUpdate::new(
            CleaningStage::OutlierHandling,
            1.0,
            format!(
                "Flagged {} value(s) across {} column(s)",
                findings.iter().map(|f| f.flagged_count).sum::<usize>(),
                findings.len()
            ),
        ));

        self.check_cancelled()?;

        // Step 5: Deduplication
        if self.config.remove_duplicates {
            self.report_progress(ProgressUpdate::new(
                CleaningStage::Deduplication,
                0.0,
                "Removing duplicate rows...",
            ));
            info!("Step 5: Removing duplicate rows...");

            let (deduped, removed) = dedup::drop_duplicates(df, &self.config.dedup_keys)?;
            df = deduped;
            summary.duplicates_removed = removed;

            if removed > 0 {
                let action = if self.config.dedup_keys.is_empty() {
                    format!("Removed {} fully duplicated row(s)", removed)
                } else {
                    format!(
                        "Removed {} duplicate row(s) by key {:?}",
                        removed, self.config.dedup_keys
                    )
                };
                summary.add_action(CleaningAction::new(
                    ActionType::DuplicatesRemoved,
                    "dataset",
                    action.clone(),
                ));
                processing_steps.push(action);
            }

            self.report_progress(ProgressUpdate::new(
                CleaningStage::Deduplication,
                1.0,
                format!("Removed {} duplicate row(s)", removed),
            ));
        } else {
            info!("Step 5: Skipping deduplication (disabled)");
        }

        self.check_cancelled()?;

        // Step 6: Write output
        let mut output_path = None;
        let mut separated_path = None;

        if self.config.save_to_disk {
            self.report_progress(ProgressUpdate::new(
                CleaningStage::WritingOutput,
                0.0,
                "Writing cleaned CSV...",
            ));
            info!("Step 6: Writing output files...");

            let path = self.config.output_path();
            output::write_csv(&mut df, &path)?;
            summary.add_action(CleaningAction::new(
                ActionType::OutputWritten,
                path.display().to_string(),
                format!("Wrote {} cleaned row(s)", df.height()),
            ));
            processing_steps.push(format!("Wrote cleaned data to {}", path.display()));
            output_path = Some(path.display().to_string());

            if let Some(mut separated_df) = separated {
                let path = self.config.separated_path();
                output::write_csv(&mut separated_df, &path)?;
                summary.add_action(CleaningAction::new(
                    ActionType::OutputWritten,
                    path.display().to_string(),
                    format!("Wrote {} separated outlier row(s)", separated_df.height()),
                ));
                processing_steps.push(format!("Wrote separated outliers to {}", path.display()));
                separated_path = Some(path.display().to_string());
            }

            self.report_progress(ProgressUpdate::new(
                CleaningStage::WritingOutput,
                1.0,
                "Output files written",
            ));
        }

        // Finalize summary
        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.rows_removed = summary.rows_before.saturating_sub(summary.rows_after);
        summary.columns_removed = summary.columns_before.saturating_sub(summary.columns_after);
        summary.completeness_after = completeness(&df);

        if summary.rows_removed_percentage() > 30.0 {
            summary.add_warning(format!(
                "High data loss: {:.1}% of rows were removed",
                summary.rows_removed_percentage()
            ));
        }
        if summary.columns_removed_percentage() > 30.0 {
            summary.add_warning(format!(
                "High feature loss: {:.1}% of columns were removed",
                summary.columns_removed_percentage()
            ));
        }

        Ok(CleaningResult {
            success: true,
            completed_at: chrono::Utc::now(),
            output_path,
            separated_path,
            outlier_findings: findings,
            processing_steps,
            error: None,
            summary: Some(summary),
        })
    }
}

/// Fraction of non-null cells (0.0 - 1.0).
fn completeness(df: &DataFrame) -> f32 {
    if df.height() == 0 || df.width() == 0 {
        return 0.0;
    }

    let total_cells = df.height() * df.width();
    let null_count: usize = df.get_columns().iter().map(|col| col.null_count()).sum();

    let non_null = total_cells.saturating_sub(null_count);
    non_null as f32 / total_cells as f32
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
///
/// # Example
///
/// ```rust,ignore
/// use tidyframe::{Pipeline, CleaningConfig, CancellationToken};
///
/// let token = CancellationToken::new();
///
/// let pipeline = Pipeline::builder()
///     .config(CleaningConfig::default())
///     .cancellation_token(token)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?;
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<CleaningConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
}

// Ensure PipelineBuilder is Send (can be moved to another thread during construction)
static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// Use this when you need a custom progress reporter implementation,
    /// such as forwarding updates over a channel.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use tidyframe::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct MyReporter;
    ///
    /// impl ProgressReporter for MyReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(MyReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let pipeline = Pipeline::builder()
    ///     .on_progress(|update| {
    ///         println!("[{:.0}%] {:?}: {}",
    ///             update.progress * 100.0,
    ///             update.stage,
    ///             update.message
    ///         );
    ///     })
    ///     .build()?;
    /// ```
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a cancellation token for stopping the pipeline.
    ///
    /// Clone the token and call [`CancellationToken::cancel()`] from
    /// any thread to request cancellation. The pipeline will check
    /// this token between stages and return
    /// [`CleaningError::Cancelled`] if cancellation is requested.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, crate::config::ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
        })
    }
}
