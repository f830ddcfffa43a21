//! Tabular Data Cleaning Library
//!
//! A data cleaning library and CLI built with Rust and Polars.
//!
//! # Overview
//!
//! This library provides automated data cleaning capabilities including:
//!
//! - **File Ingestion**: CSV, TSV, JSON and NDJSON parsing with delimiter and
//!   format sniffing
//! - **Data Profiling**: Automatic type inference, null counts and statistics
//! - **Missing Values**: Column dropping, mean/median/mode fills and seeded
//!   multiple imputation
//! - **Outliers**: Per-column z-score flagging with drop, separate or
//!   mean-impute policies
//! - **Deduplication**: Stable keep-first removal by configurable key columns
//! - **Numeric Normalization**: "$50" and "1,200" become proper numbers
//! - **Progress Reporting**: Real-time progress updates with cancellation support
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tidyframe::{Pipeline, CleaningConfig, CancellationToken};
//! use tidyframe::config::{MissingValueStrategy, OutlierPolicy};
//! use std::path::Path;
//!
//! let config = CleaningConfig::builder()
//!     .missing_strategy(MissingValueStrategy::MultipleImputation)
//!     .outlier_policy(OutlierPolicy::Separate)
//!     .dedup_keys(["order_id", "customer_id"])
//!     .output_dir("output")
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process_file(Path::new("orders.csv"))?;
//!
//! println!("Cleaned data written to {:?}", result.output_path);
//! ```
//!
//! # Progress Reporting
//!
//! The pipeline supports real-time progress reporting and cancellation:
//!
//! ```rust,ignore
//! use tidyframe::{Pipeline, CancellationToken, CleaningError};
//!
//! let token = CancellationToken::new();
//! let token_for_cancel = token.clone();
//!
//! // Cancel from another thread after 10 seconds
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(10));
//!     token_for_cancel.cancel();
//! });
//!
//! let result = Pipeline::builder()
//!     .cancellation_token(token)
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .process(df);
//!
//! match result {
//!     Ok(result) => println!("Success!"),
//!     Err(CleaningError::Cancelled) => println!("Cancelled by user"),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```

pub mod cleaner;
pub mod config;
pub mod dedup;
pub mod error;
pub mod imputers;
pub mod ingest;
pub mod outliers;
pub mod output;
pub mod pipeline;
pub mod profiler;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::NumericNormalizer;
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, MissingValueStrategy,
    OutlierPolicy,
};
pub use dedup::drop_duplicates;
pub use error::{CleaningError, ResultExt};
pub use imputers::{MissingValueHandler, MultipleImputer, StatisticalImputer};
pub use ingest::{FileFormat, load_table, load_table_as};
pub use outliers::{OutlierHandler, OutlierOutcome};
pub use pipeline::{
    CancellationToken, CleaningStage, ClosureProgressReporter, Pipeline, PipelineBuilder,
    ProgressReporter, ProgressUpdate,
};
pub use profiler::DataProfiler;
pub use types::{
    ActionType, CleaningAction, CleaningResult, CleaningSummary, ColumnProfile, DatasetProfile,
    OutlierFinding,
};
pub use utils::{
    DtypeCategory, dtype_category, fill_numeric_nulls, fill_string_nulls, is_boolean_string,
    is_missing_marker, is_numeric_dtype, parse_numeric_string, strip_numeric_formatting,
};
