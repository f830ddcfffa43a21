//! Progress reporting and cancellation support for the cleaning pipeline.
//!
//! This module provides types for tracking pipeline progress and supporting
//! cancellation from external threads (e.g., a UI cancel button).
//!
//! # Example
//!
//! ```rust,ignore
//! use tidyframe::{Pipeline, CancellationToken};
//!
//! let token = CancellationToken::new();
//! let token_clone = token.clone();
//!
//! // In another thread
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(5));
//!     token_clone.cancel();
//! });
//!
//! let result = Pipeline::builder()
//!     .cancellation_token(token)
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .process(df);
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stages of the cleaning pipeline.
///
/// Each stage represents a major phase of the cleaning workflow.
/// Progress updates include both the current stage and optional sub-stage
/// information for more granular tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Pipeline is initializing and loading data
    Initializing,
    /// Converting numeric-looking string columns to numeric types
    Normalizing,
    /// Profiling the dataset (type inference, statistics)
    Profiling,
    /// Dropping or imputing missing values
    MissingValues,
    /// Detecting and handling outliers
    OutlierHandling,
    /// Removing duplicate rows
    Deduplication,
    /// Writing the cleaned CSV output
    WritingOutput,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline was cancelled by user
    Cancelled,
    /// Pipeline failed with an error
    Failed,
}

impl CleaningStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Normalizing => "Normalizing Numeric Strings",
            Self::Profiling => "Profiling Dataset",
            Self::MissingValues => "Handling Missing Values",
            Self::OutlierHandling => "Handling Outliers",
            Self::Deduplication => "Removing Duplicates",
            Self::WritingOutput => "Writing Output",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    ///
    /// These weights are used to estimate overall progress. They sum to ~1.0
    /// for the main processing stages (excluding terminal states).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.05,
            Self::Normalizing => 0.15,
            Self::Profiling => 0.10,
            Self::MissingValues => 0.35,
            Self::OutlierHandling => 0.15,
            Self::Deduplication => 0.10,
            Self::WritingOutput => 0.10,
            Self::Complete => 0.0,
            Self::Cancelled => 0.0,
            Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::Normalizing => 0.05,
            Self::Profiling => 0.20,
            Self::MissingValues => 0.30,
            Self::OutlierHandling => 0.65,
            Self::Deduplication => 0.80,
            Self::WritingOutput => 0.90,
            Self::Complete => 1.0,
            Self::Cancelled => 0.0,
            Self::Failed => 0.0,
        }
    }
}

/// Detailed progress update with sub-stage information.
///
/// This struct provides comprehensive progress information including:
/// - Current pipeline stage
/// - Optional sub-stage for granular tracking (e.g., "Column: price")
/// - Overall and stage-specific progress percentages
/// - Human-readable message
/// - Item counts for iterative operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: CleaningStage,

    /// Optional sub-stage description (e.g., "Column: price")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,

    /// Number of items processed in current stage (for iterative operations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    /// Total items in current stage (for iterative operations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage without sub-stage info.
    pub fn new(stage: CleaningStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a new progress update with sub-stage information.
    pub fn with_sub_stage(
        stage: CleaningStage,
        sub_stage: impl Into<String>,
        stage_progress: f32,
        message: impl Into<String>,
    ) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: Some(sub_stage.into()),
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a new progress update with item counts.
    pub fn with_items(
        stage: CleaningStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: Some(sub_stage.into()),
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: Some(current),
            items_total: Some(total),
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: CleaningStage::Complete,
            sub_stage: None,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a cancelled progress update.
    pub fn cancelled() -> Self {
        Self {
            stage: CleaningStage::Cancelled,
            sub_stage: None,
            progress: 0.0,
            stage_progress: 0.0,
            message: "Pipeline cancelled by user".to_string(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: CleaningStage::Failed,
            sub_stage: None,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }
}

/// Trait for receiving progress updates during cleaning.
///
/// Implement this trait to receive progress updates from the pipeline.
/// Implementations must be `Send + Sync` to allow cross-thread usage,
/// which matters when the pipeline runs on a background thread but
/// reports to a UI or logging layer on another.
///
/// # Example
///
/// ```rust,ignore
/// use tidyframe::{ProgressReporter, ProgressUpdate};
///
/// struct ChannelReporter {
///     tx: std::sync::mpsc::Sender<ProgressUpdate>,
/// }
///
/// impl ProgressReporter for ChannelReporter {
///     fn report(&self, update: ProgressUpdate) {
///         self.tx.send(update).ok();
///     }
/// }
/// ```
pub trait ProgressReporter: Send + Sync {
    /// Called when progress is made during cleaning.
    ///
    /// This method may be called frequently during processing (e.g., once per
    /// column during imputation). Implementations should be efficient and
    /// non-blocking.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
///
/// This provides a convenient way to handle progress updates without
/// implementing the trait manually.
///
/// # Example
///
/// ```rust,ignore
/// use tidyframe::Pipeline;
///
/// Pipeline::builder()
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(df);
/// ```
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Token for cancelling a running pipeline.
///
/// This token uses an atomic boolean internally, making it safe to clone
/// and share across threads. Call [`cancel()`](Self::cancel) from any thread
/// to request cancellation of the pipeline.
///
/// The pipeline checks this token between stages and will return
/// [`CleaningError::Cancelled`](crate::error::CleaningError::Cancelled)
/// if cancellation is requested.
///
/// # Example
///
/// ```rust,ignore
/// use tidyframe::{Pipeline, CancellationToken};
/// use std::thread;
/// use std::time::Duration;
///
/// let token = CancellationToken::new();
/// let token_for_cancel = token.clone();
///
/// // Spawn a thread that will cancel after 10 seconds
/// thread::spawn(move || {
///     thread::sleep(Duration::from_secs(10));
///     token_for_cancel.cancel();
/// });
///
/// // Run the pipeline with the cancellation token
/// let result = Pipeline::builder()
///     .cancellation_token(token)
///     .build()?
///     .process(df);
///
/// match result {
///     Err(CleaningError::Cancelled) => println!("Pipeline was cancelled"),
///     Ok(result) => println!("Pipeline completed"),
///     Err(e) => println!("Pipeline failed: {}", e),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

// Static assertions for thread safety - pipelines run on background threads
// while tokens and reporters are shared with the caller
static_assertions::assert_impl_all!(CancellationToken: Send, Sync);
static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

impl CancellationToken {
    /// Creates a new cancellation token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation of the pipeline.
    ///
    /// This method is thread-safe and can be called from any thread.
    /// The pipeline will check this token periodically and stop processing
    /// if cancellation has been requested.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    ///
    /// Returns `true` if [`cancel()`](Self::cancel) has been called on this
    /// token or any of its clones.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Reset the token for reuse.
    ///
    /// This clears the cancellation flag, allowing the token to be reused
    /// for another pipeline run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
