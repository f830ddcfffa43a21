use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Structure description of a single column, produced during inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub unique_count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub sample_values: Vec<String>,
    /// Semantic type inferred from values: numeric, binary, datetime,
    /// string, text or unknown.
    pub inferred_type: String,
    /// Numeric characteristics (mean, std, min, max, skewness) when they apply.
    pub characteristics: HashMap<String, serde_json::Value>,
}

/// Structure description of a whole dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    /// (rows, columns)
    pub shape: (usize, usize),
    pub column_profiles: Vec<ColumnProfile>,
    pub duplicate_count: usize,
    pub duplicate_percentage: f64,
}

impl DatasetProfile {
    /// Look up a column profile by name.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.column_profiles.iter().find(|c| c.name == name)
    }

    /// Names of columns whose inferred type is numeric.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.column_profiles
            .iter()
            .filter(|c| c.inferred_type == "numeric")
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Per-column outlier detection findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierFinding {
    pub column: String,
    /// Number of values with |z| beyond the threshold.
    pub flagged_count: usize,
    pub mean: f64,
    pub std: f64,
    /// Smallest flagged value, if any were flagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_flagged: Option<f64>,
    /// Largest flagged value, if any were flagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_flagged: Option<f64>,
}

/// Final output of a pipeline run, serializable for the `--json` CLI mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningResult {
    pub success: bool,
    /// When the pipeline run finished.
    pub completed_at: DateTime<Utc>,
    /// Path the cleaned CSV was written to, when saving was enabled.
    pub output_path: Option<String>,
    /// Path the separated outlier rows were written to, if any.
    pub separated_path: Option<String>,
    pub outlier_findings: Vec<OutlierFinding>,
    pub processing_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CleaningSummary>,
}

// ============================================================================
// Cleaning Summary Types
// ============================================================================

/// Human-readable summary of what the pipeline did.
///
/// # Example
///
/// ```rust,ignore
/// use tidyframe::CleaningSummary;
///
/// let summary: CleaningSummary = result.summary.unwrap();
/// println!("Processed {} rows in {}ms", summary.rows_after, summary.duration_ms);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows before cleaning.
    pub rows_before: usize,
    /// Number of rows after cleaning.
    pub rows_after: usize,
    /// Number of rows removed during cleaning.
    pub rows_removed: usize,

    /// Number of columns before cleaning.
    pub columns_before: usize,
    /// Number of columns after cleaning.
    pub columns_after: usize,
    /// Number of columns removed during cleaning.
    pub columns_removed: usize,

    /// Number of duplicate rows dropped.
    pub duplicates_removed: usize,
    /// Number of cells imputed.
    pub values_imputed: usize,
    /// Number of outlier values handled (dropped, separated or imputed).
    pub outliers_handled: usize,

    /// Fraction of non-null cells before cleaning (0.0 - 1.0).
    pub completeness_before: f32,
    /// Fraction of non-null cells after cleaning.
    pub completeness_after: f32,

    /// List of actions taken during cleaning.
    pub actions: Vec<CleaningAction>,

    /// Warnings and notes generated during cleaning.
    pub warnings: Vec<String>,
}

impl Default for CleaningSummary {
    fn default() -> Self {
        Self {
            duration_ms: 0,
            rows_before: 0,
            rows_after: 0,
            rows_removed: 0,
            columns_before: 0,
            columns_after: 0,
            columns_removed: 0,
            duplicates_removed: 0,
            values_imputed: 0,
            outliers_handled: 0,
            completeness_before: 0.0,
            completeness_after: 0.0,
            actions: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl CleaningSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action to the summary.
    pub fn add_action(&mut self, action: CleaningAction) {
        self.actions.push(action);
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Calculate the percentage of rows removed.
    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed as f32 / self.rows_before as f32) * 100.0
        }
    }

    /// Calculate the percentage of columns removed.
    pub fn columns_removed_percentage(&self) -> f32 {
        if self.columns_before == 0 {
            0.0
        } else {
            (self.columns_removed as f32 / self.columns_before as f32) * 100.0
        }
    }

    /// Calculate completeness improvement as a percentage.
    pub fn completeness_improvement(&self) -> f32 {
        (self.completeness_after - self.completeness_before) * 100.0
    }
}

/// A single action taken during cleaning.
///
/// Actions are logged throughout the pipeline execution to provide
/// an audit trail of what was done to the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningAction {
    /// Type of action performed.
    pub action_type: ActionType,
    /// Target of the action (column name or "dataset").
    pub target: String,
    /// Human-readable description of the action.
    pub description: String,
    /// Additional details (e.g., values replaced, strategy used).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CleaningAction {
    /// Create a new cleaning action.
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    /// Add details to the action.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Types of actions that can be taken during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A file was parsed into a table.
    FileIngested,
    /// A column was removed from the dataset.
    ColumnRemoved,
    /// One or more rows were removed from the dataset.
    RowsRemoved,
    /// A string column was converted to a numeric type.
    NumericNormalized,
    /// Missing values were imputed.
    ValueImputed,
    /// Outliers were handled (dropped, separated or imputed).
    OutlierHandled,
    /// Duplicate rows were removed.
    DuplicatesRemoved,
    /// Invalid values were cleaned/replaced.
    ValueCleaned,
    /// A CSV output file was written.
    OutputWritten,
}

impl ActionType {
    /// Get a human-readable display name for the action type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FileIngested => "File Ingested",
            Self::ColumnRemoved => "Column Removed",
            Self::RowsRemoved => "Rows Removed",
            Self::NumericNormalized => "Numeric Normalized",
            Self::ValueImputed => "Value Imputed",
            Self::OutlierHandled => "Outlier Handled",
            Self::DuplicatesRemoved => "Duplicates Removed",
            Self::ValueCleaned => "Value Cleaned",
            Self::OutputWritten => "Output Written",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_profile() -> DatasetProfile {
        DatasetProfile {
            shape: (100, 3),
            column_profiles: vec![
                ColumnProfile {
                    name: "price".to_string(),
                    dtype: "Float64".to_string(),
                    unique_count: 90,
                    null_count: 10,
                    null_percentage: 10.0,
                    sample_values: vec!["9.5".to_string()],
                    inferred_type: "numeric".to_string(),
                    characteristics: HashMap::new(),
                },
                ColumnProfile {
                    name: "category".to_string(),
                    dtype: "String".to_string(),
                    unique_count: 4,
                    null_count: 0,
                    null_percentage: 0.0,
                    sample_values: vec!["a".to_string()],
                    inferred_type: "string".to_string(),
                    characteristics: HashMap::new(),
                },
            ],
            duplicate_count: 2,
            duplicate_percentage: 2.0,
        }
    }

    #[test]
    fn test_profile_column_lookup() {
        let profile = sample_profile();
        assert!(profile.column("price").is_some());
        assert!(profile.column("missing").is_none());
    }

    #[test]
    fn test_profile_numeric_columns() {
        let profile = sample_profile();
        assert_eq!(profile.numeric_columns(), vec!["price".to_string()]);
    }

    #[test]
    fn test_cleaning_summary_default() {
        let summary = CleaningSummary::default();
        assert_eq!(summary.duration_ms, 0);
        assert_eq!(summary.rows_before, 0);
        assert!(summary.actions.is_empty());
    }

    #[test]
    fn test_cleaning_summary_add_action() {
        let mut summary = CleaningSummary::new();
        summary.add_action(CleaningAction::new(
            ActionType::ColumnRemoved,
            "column_a",
            "Removed due to high null percentage",
        ));
        assert_eq!(summary.actions.len(), 1);
        assert_eq!(summary.actions[0].target, "column_a");
    }

    #[test]
    fn test_cleaning_summary_percentages() {
        let mut summary = CleaningSummary::new();
        summary.rows_before = 100;
        summary.rows_after = 90;
        summary.rows_removed = 10;
        summary.columns_before = 10;
        summary.columns_after = 8;
        summary.columns_removed = 2;

        assert!((summary.rows_removed_percentage() - 10.0).abs() < 0.01);
        assert!((summary.columns_removed_percentage() - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_cleaning_summary_completeness_improvement() {
        let mut summary = CleaningSummary::new();
        summary.completeness_before = 0.75;
        summary.completeness_after = 0.95;

        assert!((summary.completeness_improvement() - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_cleaning_action_with_details() {
        let action = CleaningAction::new(ActionType::ValueImputed, "age", "Imputed 15 values")
            .with_details("multiple imputation, 5 rounds");

        assert_eq!(action.action_type, ActionType::ValueImputed);
        assert_eq!(action.target, "age");
        assert!(action.details.unwrap().contains("5 rounds"));
    }

    #[test]
    fn test_action_type_display_name() {
        assert_eq!(ActionType::FileIngested.display_name(), "File Ingested");
        assert_eq!(
            ActionType::DuplicatesRemoved.display_name(),
            "Duplicates Removed"
        );
    }

    #[test]
    fn test_cleaning_summary_serialization() {
        let mut summary = CleaningSummary::new();
        summary.duration_ms = 1500;
        summary.rows_before = 1000;
        summary.rows_after = 950;
        summary.add_action(CleaningAction::new(
            ActionType::DuplicatesRemoved,
            "dataset",
            "Removed 50 duplicate rows",
        ));

        let json = serde_json::to_string(&summary).expect("Should serialize");
        assert!(json.contains("1500"));
        assert!(json.contains("duplicates_removed"));
    }

    #[test]
    fn test_cleaning_result_json_roundtrip() {
        let result = CleaningResult {
            success: true,
            completed_at: Utc::now(),
            output_path: Some("out/cleaned.csv".to_string()),
            separated_path: None,
            outlier_findings: vec![OutlierFinding {
                column: "price".to_string(),
                flagged_count: 3,
                mean: 10.0,
                std: 2.0,
                min_flagged: Some(30.0),
                max_flagged: Some(55.0),
            }],
            processing_steps: vec!["profiling".to_string(), "dedup".to_string()],
            error: None,
            summary: Some(CleaningSummary::default()),
        };

        let json = serde_json::to_string(&result).expect("Should serialize");
        let deserialized: CleaningResult = serde_json::from_str(&json).expect("Should deserialize");

        assert_eq!(result.success, deserialized.success);
        assert_eq!(result.output_path, deserialized.output_path);
        assert_eq!(
            result.outlier_findings[0].flagged_count,
            deserialized.outlier_findings[0].flagged_count
        );
    }

    #[test]
    fn test_all_action_types_serialize() {
        let all_types = [
            ActionType::FileIngested,
            ActionType::ColumnRemoved,
            ActionType::RowsRemoved,
            ActionType::NumericNormalized,
            ActionType::ValueImputed,
            ActionType::OutlierHandled,
            ActionType::DuplicatesRemoved,
            ActionType::ValueCleaned,
            ActionType::OutputWritten,
        ];

        let expected_json_values = [
            "\"file_ingested\"",
            "\"column_removed\"",
            "\"rows_removed\"",
            "\"numeric_normalized\"",
            "\"value_imputed\"",
            "\"outlier_handled\"",
            "\"duplicates_removed\"",
            "\"value_cleaned\"",
            "\"output_written\"",
        ];

        for (action_type, expected) in all_types.iter().zip(expected_json_values.iter()) {
            let json = serde_json::to_string(action_type).expect("Should serialize");
            assert_eq!(&json, *expected);
        }
    }
}
