//! CLI entry point for the data cleaning pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use polars::prelude::*;
use std::path::Path;
use tidyframe::config::{MissingValueStrategy, OutlierPolicy};
use tidyframe::{CleaningConfig, CleaningResult, DataProfiler, FileFormat, Pipeline, load_table_as};
use tracing::{error, info};

/// CLI-compatible missing-value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingStrategy {
    /// Drop columns above the missing threshold
    DropColumn,
    /// Chained multiple imputation (numeric), mode (string)
    Multiple,
    /// Median for numerics, mode for strings
    Median,
    /// Mean for numerics, mode for strings
    Mean,
    /// Mode for every column
    Mode,
}

impl From<CliMissingStrategy> for MissingValueStrategy {
    fn from(cli: CliMissingStrategy) -> Self {
        match cli {
            CliMissingStrategy::DropColumn => MissingValueStrategy::DropColumn,
            CliMissingStrategy::Multiple => MissingValueStrategy::MultipleImputation,
            CliMissingStrategy::Median => MissingValueStrategy::Median,
            CliMissingStrategy::Mean => MissingValueStrategy::Mean,
            CliMissingStrategy::Mode => MissingValueStrategy::Mode,
        }
    }
}

/// CLI-compatible outlier policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierPolicy {
    /// Remove rows containing outliers
    Drop,
    /// Move outlier rows to a separate CSV
    Separate,
    /// Replace outliers with the unflagged column mean
    MeanImpute,
    /// Detect and report only
    Keep,
}

impl From<CliOutlierPolicy> for OutlierPolicy {
    fn from(cli: CliOutlierPolicy) -> Self {
        match cli {
            CliOutlierPolicy::Drop => OutlierPolicy::Drop,
            CliOutlierPolicy::Separate => OutlierPolicy::Separate,
            CliOutlierPolicy::MeanImpute => OutlierPolicy::MeanImpute,
            CliOutlierPolicy::Keep => OutlierPolicy::Keep,
        }
    }
}

/// CLI-compatible input format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    /// Comma- or semicolon-delimited text
    Csv,
    /// Tab-delimited text
    Tsv,
    /// JSON array of record objects
    Json,
    /// Newline-delimited JSON
    Ndjson,
}

impl From<CliFormat> for FileFormat {
    fn from(cli: CliFormat) -> Self {
        match cli {
            CliFormat::Csv => FileFormat::Csv,
            CliFormat::Tsv => FileFormat::Tsv,
            CliFormat::Json => FileFormat::Json,
            CliFormat::Ndjson => FileFormat::NdJson,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Tabular data cleaning pipeline",
    long_about = "Cleans tabular data files: ingestion, numeric normalization, missing-value\n\
                  imputation, z-score outlier handling and duplicate removal.\n\n\
                  EXAMPLES:\n  \
                  # Basic usage with format auto-detection\n  \
                  tidyframe -i data.csv\n\n  \
                  # Dedup by key columns, separate outliers\n  \
                  tidyframe -i orders.csv --dedup-keys order_id,customer_id --outliers separate\n\n  \
                  # Inspect structure without cleaning\n  \
                  tidyframe -i data.json --inspect\n\n  \
                  # Drop a column and use median fills\n  \
                  tidyframe -i data.csv --drop-columns notes --missing median"
)]
struct Args {
    /// Path to the file to clean (CSV, TSV, JSON or NDJSON)
    #[arg(short, long)]
    input: String,

    /// Output directory for results
    #[arg(short, long, default_value = "./output")]
    output: String,

    /// Custom output file name (without extension)
    ///
    /// If not specified, uses "cleaned"
    #[arg(long)]
    output_name: Option<String>,

    /// Force the input format instead of detecting it
    #[arg(long, value_enum)]
    format: Option<CliFormat>,

    /// Print the dataset structure and exit without cleaning
    #[arg(long)]
    inspect: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Strategy for handling missing values
    #[arg(long, value_enum, default_value = "multiple")]
    missing: CliMissingStrategy,

    /// Columns to drop unconditionally (comma-separated)
    #[arg(long, value_delimiter = ',')]
    drop_columns: Vec<String>,

    /// Missing column threshold (0.0 - 1.0)
    ///
    /// With --missing drop-column, columns whose null ratio exceeds this are dropped
    #[arg(long, default_value = "0.7")]
    missing_col_threshold: f64,

    /// Number of rounds for multiple imputation
    #[arg(long, default_value = "5")]
    imputation_rounds: usize,

    /// Seed for the imputation noise (fixed seed gives deterministic output)
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Policy for values flagged as outliers
    #[arg(long = "outliers", value_enum, default_value = "keep")]
    outlier_policy: CliOutlierPolicy,

    /// Absolute z-score beyond which a value is flagged
    #[arg(long, default_value = "3.0")]
    z_threshold: f64,

    /// Key columns for deduplication (comma-separated; empty = whole row)
    #[arg(long, value_delimiter = ',')]
    dedup_keys: Vec<String>,

    /// Disable duplicate row removal
    #[arg(long, default_value = "false")]
    no_dedup: bool,

    /// Disable numeric-string normalization ("$50" -> 50)
    #[arg(long, default_value = "false")]
    no_normalize: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON result.
    /// Useful for piping to other tools: `... --json | jq .output_path`
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    // If JSON output is requested, don't initialize any logging
    // This ensures stdout only contains the JSON result
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let loaded = load_table_as(Path::new(&args.input), args.format.map(Into::into))?;
    info!(
        "Dataset loaded as {}: {:?}",
        loaded.format.display_name(),
        loaded.df.shape()
    );

    if args.inspect {
        return run_inspect(&args, &loaded.df);
    }

    let config = build_config(&args)?;
    let pipeline = build_pipeline(&args, config)?;

    run_pipeline(pipeline, &args, loaded.df)
}

/// Translate CLI flags into a validated cleaning configuration.
fn build_config(args: &Args) -> Result<CleaningConfig> {
    let mut builder = CleaningConfig::builder()
        .missing_strategy(args.missing.into())
        .drop_columns(args.drop_columns.clone())
        .missing_column_threshold(args.missing_col_threshold)
        .imputation_rounds(args.imputation_rounds)
        .imputation_seed(args.seed)
        .outlier_policy(args.outlier_policy.into())
        .zscore_threshold(args.z_threshold)
        .dedup_keys(args.dedup_keys.clone())
        .remove_duplicates(!args.no_dedup)
        .normalize_numeric_strings(!args.no_normalize)
        .output_dir(&args.output);

    if let Some(ref name) = args.output_name {
        builder = builder.output_name(name);
    }

    Ok(builder.build()?)
}

/// Build the pipeline, attaching a progress reporter unless silenced.
fn build_pipeline(args: &Args, config: CleaningConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Inspect mode - print the dataset structure without cleaning.
///
/// Note: This function uses `println!` intentionally for user-facing CLI
/// output. Unlike logging (`info!`, `debug!`), this output should always be
/// visible regardless of log level settings since it's the primary purpose
/// of --inspect.
fn run_inspect(args: &Args, data: &DataFrame) -> Result<()> {
    let profile = DataProfiler::profile_dataset(data)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("DATASET STRUCTURE");
    println!("{}\n", "=".repeat(80));

    println!("OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input);
    println!("  Rows: {}", data.height());
    println!("  Columns: {}", data.width());
    println!(
        "  Duplicate rows: {} ({:.1}%)",
        profile.duplicate_count, profile.duplicate_percentage
    );
    println!();

    println!("COLUMN PROFILES");
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {:<12} {:<12} {:<10} {:<10}",
        "Column", "Dtype", "Inferred", "Missing %", "Unique"
    );
    println!("{}", "-".repeat(70));

    for col in &profile.column_profiles {
        println!(
            "{:<20} {:<12} {:<12} {:<10.1} {:<10}",
            truncate_str(&col.name, 19),
            col.dtype,
            col.inferred_type,
            col.null_percentage,
            col.unique_count
        );
    }
    println!();

    println!("SAMPLE VALUES");
    println!("{}", "-".repeat(40));
    for col in &profile.column_profiles {
        let samples = col.sample_values.join(", ");
        println!("  {}: [{}]", col.name, truncate_str(&samples, 70));
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To clean this dataset, run without --inspect");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Truncate a string to max length (in chars) with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Run pipeline and print results
fn run_pipeline(pipeline: Pipeline, args: &Args, data: DataFrame) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let original_shape = data.shape();

    match pipeline.process(data) {
        Ok(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_human_readable_summary(&result, original_shape, args);
            }
            Ok(())
        }
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            } else {
                error!("Pipeline failed: {}", e);
            }
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Print a human-readable summary of the cleaning results.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(result: &CleaningResult, original_shape: (usize, usize), args: &Args) {
    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        args.input, original_shape.0, original_shape.1
    );

    if let Some(ref output_path) = result.output_path {
        println!("Output: {}", output_path);
    } else {
        println!("Output: (in memory only)");
    }
    if let Some(ref separated_path) = result.separated_path {
        println!("Separated outliers: {}", separated_path);
    }
    println!();

    if let Some(ref summary) = result.summary {
        println!("Processing Summary:");
        println!("  Duration: {}ms", summary.duration_ms);
        println!(
            "  Rows: {} -> {} ({} removed)",
            summary.rows_before, summary.rows_after, summary.rows_removed
        );
        println!(
            "  Columns: {} -> {} ({} removed)",
            summary.columns_before, summary.columns_after, summary.columns_removed
        );
        println!(
            "  Completeness: {:.1}% -> {:.1}%",
            summary.completeness_before * 100.0,
            summary.completeness_after * 100.0
        );
        println!(
            "  Duplicates removed: {}, values imputed: {}, outliers handled: {}",
            summary.duplicates_removed, summary.values_imputed, summary.outliers_handled
        );
        println!();

        if !summary.warnings.is_empty() {
            println!("Warnings:");
            for warning in &summary.warnings {
                println!("  ! {}", warning);
            }
            println!();
        }
    }

    let flagged_columns: Vec<_> = result
        .outlier_findings
        .iter()
        .filter(|f| f.flagged_count > 0)
        .collect();
    if !flagged_columns.is_empty() {
        println!("Outlier Findings:");
        for finding in flagged_columns {
            println!(
                "  - {}: {} value(s) beyond the threshold (mean {:.2}, std {:.2})",
                finding.column, finding.flagged_count, finding.mean, finding.std
            );
        }
        println!();
    }

    if !result.processing_steps.is_empty() {
        println!("Actions Taken:");
        for step in result.processing_steps.iter().take(10) {
            println!("  - {}", step);
        }
        if result.processing_steps.len() > 10 {
            println!(
                "  ... and {} more actions",
                result.processing_steps.len() - 10
            );
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncate_str_short_input_unchanged() {
        assert_eq!(truncate_str("amount", 19), "amount");
    }

    #[test]
    fn test_truncate_str_long_input_ellipsis() {
        assert_eq!(truncate_str("a_very_long_column_name", 10), "a_very_...");
    }

    #[test]
    fn test_truncate_str_multibyte_column_name() {
        // Accented names must truncate on char boundaries, not bytes.
        let truncated = truncate_str("prix_unitaire_en_€_par_catégorie", 19);
        assert_eq!(truncated.chars().count(), 19);
        assert!(truncated.ends_with("..."));
    }
}
