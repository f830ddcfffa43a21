//! Integration tests for the data cleaning pipeline.
//!
//! These tests verify end-to-end behavior of the pipeline using fixture files.

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tidyframe::config::{MissingValueStrategy, OutlierPolicy};
use tidyframe::{
    CancellationToken, CleaningConfig, CleaningError, CleaningStage, Pipeline, ProgressUpdate,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_csv(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn pipeline_with(config: CleaningConfig) -> Pipeline {
    Pipeline::builder().config(config).build().unwrap()
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_pipeline_messy_orders() {
    let out_dir = tempfile::tempdir().unwrap();

    let config = CleaningConfig::builder()
        .dedup_keys(["order_id", "customer_id"])
        .output_dir(out_dir.path())
        .output_name("orders")
        .build()
        .unwrap();

    let result = pipeline_with(config)
        .process_file(&fixtures_path().join("orders_messy.csv"))
        .unwrap();

    assert!(result.success);
    let output_path = result.output_path.as_ref().expect("Output path expected");
    assert!(Path::new(output_path).exists());

    let cleaned = read_csv(Path::new(output_path));

    // One duplicate (order_id=1, customer_id=100) removed, keep-first.
    assert_eq!(cleaned.shape(), (6, 5));
    let amounts = cleaned.column("amount").unwrap().f64().unwrap();
    assert_eq!(amounts.get(0), Some(50.0));

    // Currency strings became numbers, markers became nulls, nulls were imputed.
    assert_eq!(cleaned.column("amount").unwrap().dtype(), &DataType::Float64);
    assert_eq!(cleaned.column("amount").unwrap().null_count(), 0);
    assert_eq!(cleaned.column("quantity").unwrap().null_count(), 0);

    let summary = result.summary.expect("Summary should be present");
    assert_eq!(summary.duplicates_removed, 1);
    assert!(summary.values_imputed >= 2);
    assert!(summary.completeness_after >= summary.completeness_before);
}

#[test]
fn test_full_pipeline_json_records() {
    let out_dir = tempfile::tempdir().unwrap();

    let config = CleaningConfig::builder()
        .output_dir(out_dir.path())
        .build()
        .unwrap();

    let result = pipeline_with(config)
        .process_file(&fixtures_path().join("records.json"))
        .unwrap();

    assert!(result.success);

    // Whole-row dedup removes the repeated record.
    let cleaned = read_csv(Path::new(result.output_path.as_ref().unwrap()));
    assert_eq!(cleaned.shape(), (3, 3));

    // The ingest step is recorded first.
    assert!(
        result.processing_steps[0].contains("Ingested"),
        "Expected ingest step, got: {:?}",
        result.processing_steps
    );
}

// ============================================================================
// Missing-Value Strategy Tests
// ============================================================================

#[test]
fn test_pipeline_drop_column_strategy() {
    let out_dir = tempfile::tempdir().unwrap();

    let config = CleaningConfig::builder()
        .missing_strategy(MissingValueStrategy::DropColumn)
        .missing_column_threshold(0.5)
        .output_dir(out_dir.path())
        .build()
        .unwrap();

    let result = pipeline_with(config)
        .process_file(&fixtures_path().join("sparse.csv"))
        .unwrap();

    // "notes" is 80% null and should be gone.
    let cleaned = read_csv(Path::new(result.output_path.as_ref().unwrap()));
    assert!(cleaned.column("notes").is_err());
    assert!(cleaned.column("id").is_ok());

    let summary = result.summary.unwrap();
    assert_eq!(summary.columns_removed, 1);
}

#[test]
fn test_pipeline_explicit_drop_columns() {
    let out_dir = tempfile::tempdir().unwrap();

    let config = CleaningConfig::builder()
        .drop_columns(["status"])
        .output_dir(out_dir.path())
        .build()
        .unwrap();

    let result = pipeline_with(config)
        .process_file(&fixtures_path().join("orders_messy.csv"))
        .unwrap();

    let cleaned = read_csv(Path::new(result.output_path.as_ref().unwrap()));
    assert!(cleaned.column("status").is_err());
}

#[test]
fn test_pipeline_unknown_drop_column_errors() {
    let config = CleaningConfig::builder()
        .drop_columns(["no_such_column"])
        .save_to_disk(false)
        .build()
        .unwrap();

    let err = pipeline_with(config)
        .process_file(&fixtures_path().join("orders_messy.csv"))
        .unwrap_err();

    assert!(matches!(err, CleaningError::ColumnNotFound(_)));
}

// ============================================================================
// Outlier Policy Tests
// ============================================================================

#[test]
fn test_pipeline_outlier_drop_policy() {
    let out_dir = tempfile::tempdir().unwrap();

    let config = CleaningConfig::builder()
        .outlier_policy(OutlierPolicy::Drop)
        .output_dir(out_dir.path())
        .build()
        .unwrap();

    let result = pipeline_with(config)
        .process_file(&fixtures_path().join("spiky.csv"))
        .unwrap();

    let cleaned = read_csv(Path::new(result.output_path.as_ref().unwrap()));
    assert_eq!(cleaned.height(), 11);

    let summary = result.summary.unwrap();
    assert_eq!(summary.outliers_handled, 1);
    assert_eq!(summary.rows_removed, 1);

    let value_finding = result
        .outlier_findings
        .iter()
        .find(|f| f.column == "value")
        .expect("Finding for 'value' expected");
    assert_eq!(value_finding.flagged_count, 1);
    assert_eq!(value_finding.max_flagged, Some(500.0));
}

#[test]
fn test_pipeline_outlier_separate_policy() {
    let out_dir = tempfile::tempdir().unwrap();

    let config = CleaningConfig::builder()
        .outlier_policy(OutlierPolicy::Separate)
        .output_dir(out_dir.path())
        .output_name("spiky")
        .build()
        .unwrap();

    let result = pipeline_with(config)
        .process_file(&fixtures_path().join("spiky.csv"))
        .unwrap();

    let cleaned = read_csv(Path::new(result.output_path.as_ref().unwrap()));
    assert_eq!(cleaned.height(), 11);

    let separated_path = result
        .separated_path
        .as_ref()
        .expect("Separated path expected");
    assert!(separated_path.ends_with("spiky_outliers.csv"));

    let separated = read_csv(Path::new(separated_path));
    assert_eq!(separated.height(), 1);
    assert_eq!(
        separated.column("value").unwrap().f64().unwrap().get(0),
        Some(500.0)
    );
}

#[test]
fn test_pipeline_outlier_mean_impute_policy() {
    let out_dir = tempfile::tempdir().unwrap();

    let config = CleaningConfig::builder()
        .outlier_policy(OutlierPolicy::MeanImpute)
        .output_dir(out_dir.path())
        .build()
        .unwrap();

    let result = pipeline_with(config)
        .process_file(&fixtures_path().join("spiky.csv"))
        .unwrap();

    // All 12 rows survive; the spike is replaced with the unflagged mean (~10).
    let cleaned = read_csv(Path::new(result.output_path.as_ref().unwrap()));
    assert_eq!(cleaned.height(), 12);

    let values = cleaned.column("value").unwrap().f64().unwrap();
    let max = values.into_iter().flatten().fold(f64::MIN, f64::max);
    assert!(max < 20.0, "Spike should have been imputed, max was {}", max);

    let summary = result.summary.unwrap();
    assert_eq!(summary.outliers_handled, 1);
    assert_eq!(summary.rows_removed, 0);
}

// ============================================================================
// Cancellation Tests
// ============================================================================

#[test]
fn test_pipeline_cancellation_before_start() {
    let df = read_csv(&fixtures_path().join("orders_messy.csv"));
    let token = CancellationToken::new();

    token.cancel();

    let result = Pipeline::builder()
        .config(
            CleaningConfig::builder()
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .cancellation_token(token)
        .build()
        .unwrap()
        .process(df);

    assert!(result.is_err());
    assert!(matches!(result.unwrap_err(), CleaningError::Cancelled));
}

#[test]
fn test_pipeline_cancellation_token_reset() {
    let token = CancellationToken::new();

    token.cancel();
    assert!(token.is_cancelled());

    token.reset();
    assert!(!token.is_cancelled());
}

#[test]
fn test_pipeline_progress_cancelled_stage() {
    let df = read_csv(&fixtures_path().join("orders_messy.csv"));
    let token = CancellationToken::new();
    let stages_seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let stages_clone = stages_seen.clone();

    token.cancel();

    let _ = Pipeline::builder()
        .config(
            CleaningConfig::builder()
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .cancellation_token(token)
        .on_progress(move |update: ProgressUpdate| {
            stages_clone.lock().unwrap().push(update.stage);
        })
        .build()
        .unwrap()
        .process(df);

    let stages = stages_seen.lock().unwrap();
    assert!(
        stages.contains(&CleaningStage::Cancelled),
        "Should report Cancelled stage when cancelled"
    );
}

// ============================================================================
// Progress Reporting Tests
// ============================================================================

#[test]
fn test_pipeline_progress_reporting_invoked() {
    let df = read_csv(&fixtures_path().join("orders_messy.csv"));
    let call_count = Arc::new(AtomicUsize::new(0));
    let call_count_clone = call_count.clone();

    let result = Pipeline::builder()
        .config(
            CleaningConfig::builder()
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .on_progress(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap()
        .process(df);

    assert!(result.is_ok());
    assert!(
        call_count.load(Ordering::SeqCst) > 0,
        "Progress callback should have been invoked at least once"
    );
}

#[test]
fn test_pipeline_progress_stages_reported() {
    let df = read_csv(&fixtures_path().join("orders_messy.csv"));
    let stages_seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let stages_clone = stages_seen.clone();

    let result = Pipeline::builder()
        .config(
            CleaningConfig::builder()
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .on_progress(move |update: ProgressUpdate| {
            stages_clone.lock().unwrap().push(update.stage);
        })
        .build()
        .unwrap()
        .process(df);

    assert!(result.is_ok());

    let stages = stages_seen.lock().unwrap();
    assert_eq!(stages.first(), Some(&CleaningStage::Initializing));
    assert_eq!(stages.last(), Some(&CleaningStage::Complete));
    assert!(stages.contains(&CleaningStage::Normalizing));
    assert!(stages.contains(&CleaningStage::Profiling));
    assert!(stages.contains(&CleaningStage::MissingValues));
    assert!(stages.contains(&CleaningStage::OutlierHandling));
    assert!(stages.contains(&CleaningStage::Deduplication));
}

// ============================================================================
// Summary Accuracy Tests
// ============================================================================

#[test]
fn test_pipeline_summary_row_counts() {
    let df = read_csv(&fixtures_path().join("orders_messy.csv"));
    let initial_rows = df.height();

    let result = Pipeline::builder()
        .config(
            CleaningConfig::builder()
                .dedup_keys(["order_id", "customer_id"])
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .process(df)
        .unwrap();

    let summary = result.summary.expect("Summary should be present");

    assert_eq!(summary.rows_before, initial_rows);
    assert!(summary.rows_after <= summary.rows_before);
    assert_eq!(
        summary.rows_removed,
        summary.rows_before - summary.rows_after
    );
}

#[test]
fn test_pipeline_summary_completeness_bounds() {
    let df = read_csv(&fixtures_path().join("orders_messy.csv"));

    let result = Pipeline::builder()
        .config(
            CleaningConfig::builder()
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .process(df)
        .unwrap();

    let summary = result.summary.expect("Summary should be present");

    assert!(summary.completeness_before >= 0.0);
    assert!(summary.completeness_before <= 1.0);
    assert!(summary.completeness_after >= 0.0);
    assert!(summary.completeness_after <= 1.0);

    // Imputation should not make the data less complete.
    assert!(summary.completeness_after >= summary.completeness_before);
}

#[test]
fn test_pipeline_summary_actions_tracked() {
    let out_dir = tempfile::tempdir().unwrap();

    let config = CleaningConfig::builder()
        .dedup_keys(["order_id", "customer_id"])
        .output_dir(out_dir.path())
        .build()
        .unwrap();

    let result = pipeline_with(config)
        .process_file(&fixtures_path().join("orders_messy.csv"))
        .unwrap();

    let summary = result.summary.expect("Summary should be present");
    assert!(
        !summary.actions.is_empty(),
        "Should track at least some cleaning actions"
    );

    // Ingestion, normalization, imputation, dedup and output all leave a trace.
    let action_types: Vec<_> = summary.actions.iter().map(|a| a.action_type).collect();
    assert!(action_types.contains(&tidyframe::ActionType::FileIngested));
    assert!(action_types.contains(&tidyframe::ActionType::NumericNormalized));
    assert!(action_types.contains(&tidyframe::ActionType::DuplicatesRemoved));
    assert!(action_types.contains(&tidyframe::ActionType::OutputWritten));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_pipeline_save_to_disk_disabled() {
    let df = read_csv(&fixtures_path().join("orders_messy.csv"));

    let result = Pipeline::builder()
        .config(
            CleaningConfig::builder()
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .process(df)
        .unwrap();

    assert!(result.success);
    assert!(result.output_path.is_none());
    assert!(result.separated_path.is_none());
}

#[test]
fn test_pipeline_normalization_disabled_keeps_strings() {
    let out_dir = tempfile::tempdir().unwrap();

    let config = CleaningConfig::builder()
        .normalize_numeric_strings(false)
        .missing_strategy(MissingValueStrategy::Mode)
        .output_dir(out_dir.path())
        .build()
        .unwrap();

    let result = pipeline_with(config)
        .process_file(&fixtures_path().join("orders_messy.csv"))
        .unwrap();

    let cleaned = read_csv(Path::new(result.output_path.as_ref().unwrap()));
    // "$50" is still text when normalization is off.
    assert_eq!(cleaned.column("amount").unwrap().dtype(), &DataType::String);
}

#[test]
fn test_pipeline_dedup_disabled_keeps_duplicates() {
    let out_dir = tempfile::tempdir().unwrap();

    let config = CleaningConfig::builder()
        .remove_duplicates(false)
        .output_dir(out_dir.path())
        .build()
        .unwrap();

    let result = pipeline_with(config)
        .process_file(&fixtures_path().join("records.json"))
        .unwrap();

    let cleaned = read_csv(Path::new(result.output_path.as_ref().unwrap()));
    assert_eq!(cleaned.height(), 4);

    let summary = result.summary.unwrap();
    assert_eq!(summary.duplicates_removed, 0);
}
