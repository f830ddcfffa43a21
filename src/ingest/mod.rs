//! File ingestion: parsing delimited and JSON files into data frames.
//!
//! Format is decided by extension first, then by content sniffing for files
//! with unhelpful names. "Spreadsheet" exports are handled as delimited text;
//! the delimiter (comma, semicolon or tab) is inferred from the header line.

mod csv;
mod json;

pub use csv::{read_auto_delimited, read_delimited};
pub use json::{read_json, read_ndjson};

use crate::error::{CleaningError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// Comma- or semicolon-delimited text
    Csv,
    /// Tab-delimited text
    Tsv,
    /// A JSON array of record objects
    Json,
    /// Newline-delimited JSON, one record object per line
    NdJson,
}

impl FileFormat {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Tsv => "TSV",
            Self::Json => "JSON",
            Self::NdJson => "NDJSON",
        }
    }
}

/// Load a file into a DataFrame, detecting the format from its path.
pub fn load_table(path: &Path) -> Result<DataFrameLoad> {
    load_table_as(path, None)
}

/// A loaded table plus the format it was parsed as.
#[derive(Debug)]
pub struct DataFrameLoad {
    pub df: polars::prelude::DataFrame,
    pub format: FileFormat,
}

/// Load a file into a DataFrame with an optional format override.
pub fn load_table_as(path: &Path, format: Option<FileFormat>) -> Result<DataFrameLoad> {
    if !path.exists() {
        return Err(CleaningError::IngestFailed {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }

    let format = match format {
        Some(f) => f,
        None => detect_format(path)?,
    };
    debug!("Reading {} as {}", path.display(), format.display_name());

    let df = match format {
        FileFormat::Csv => read_auto_delimited(path)?,
        FileFormat::Tsv => read_delimited(path, b'\t')?,
        FileFormat::Json => read_json(path)?,
        FileFormat::NdJson => read_ndjson(path)?,
    };

    if df.height() == 0 || df.width() == 0 {
        return Err(CleaningError::NoDataLoaded);
    }

    info!(
        "Loaded {}: {} rows x {} columns",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(DataFrameLoad { df, format })
}

/// Decide the format from the file extension, falling back to content
/// sniffing for unknown extensions.
pub fn detect_format(path: &Path) -> Result<FileFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => Ok(FileFormat::Csv),
        Some("tsv") | Some("tab") => Ok(FileFormat::Tsv),
        Some("json") => Ok(FileFormat::Json),
        Some("jsonl") | Some("ndjson") => Ok(FileFormat::NdJson),
        Some("txt") | None => sniff_format(path),
        Some(_) => Err(CleaningError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Guess the format from the first lines of the file.
fn sniff_format(path: &Path) -> Result<FileFormat> {
    let file = File::open(path).map_err(|e| CleaningError::IngestFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut lines = BufReader::new(file).lines();
    let first = loop {
        match lines.next() {
            Some(Ok(line)) if line.trim().is_empty() => continue,
            Some(Ok(line)) => break line,
            Some(Err(e)) => {
                return Err(CleaningError::IngestFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            None => return Err(CleaningError::NoDataLoaded),
        }
    };

    let trimmed = first.trim_start();
    if trimmed.starts_with('[') {
        return Ok(FileFormat::Json);
    }
    if trimmed.starts_with('{') {
        // One object per line reads as NDJSON; a pretty-printed object does not.
        let next_is_record = lines
            .next()
            .and_then(|l| l.ok())
            .map(|l| l.trim_start().starts_with('{'))
            .unwrap_or(false);
        return Ok(if next_is_record {
            FileFormat::NdJson
        } else {
            FileFormat::Json
        });
    }

    if first.matches('\t').count() > first.matches(',').count() {
        Ok(FileFormat::Tsv)
    } else {
        Ok(FileFormat::Csv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(
            detect_format(Path::new("data.csv")).unwrap(),
            FileFormat::Csv
        );
        assert_eq!(
            detect_format(Path::new("data.TSV")).unwrap(),
            FileFormat::Tsv
        );
        assert_eq!(
            detect_format(Path::new("data.json")).unwrap(),
            FileFormat::Json
        );
        assert_eq!(
            detect_format(Path::new("data.jsonl")).unwrap(),
            FileFormat::NdJson
        );
    }

    #[test]
    fn test_detect_rejects_unknown_extension() {
        let err = detect_format(Path::new("data.parquet")).unwrap_err();
        assert!(matches!(err, CleaningError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_sniff_json_array() {
        let file = temp_file(".txt", "[{\"a\": 1}, {\"a\": 2}]\n");
        assert_eq!(detect_format(file.path()).unwrap(), FileFormat::Json);
    }

    #[test]
    fn test_sniff_ndjson() {
        let file = temp_file(".txt", "{\"a\": 1}\n{\"a\": 2}\n");
        assert_eq!(detect_format(file.path()).unwrap(), FileFormat::NdJson);
    }

    #[test]
    fn test_sniff_tab_delimited() {
        let file = temp_file(".txt", "a\tb\tc\n1\t2\t3\n");
        assert_eq!(detect_format(file.path()).unwrap(), FileFormat::Tsv);
    }

    #[test]
    fn test_sniff_comma_delimited() {
        let file = temp_file(".txt", "a,b,c\n1,2,3\n");
        assert_eq!(detect_format(file.path()).unwrap(), FileFormat::Csv);
    }

    #[test]
    fn test_load_table_missing_file() {
        let err = load_table(Path::new("/nonexistent/data.csv")).unwrap_err();
        assert!(matches!(err, CleaningError::IngestFailed { .. }));
    }

    #[test]
    fn test_load_table_csv_end_to_end() {
        let file = temp_file(".csv", "id,name\n1,alpha\n2,beta\n");
        let loaded = load_table(file.path()).unwrap();

        assert_eq!(loaded.format, FileFormat::Csv);
        assert_eq!(loaded.df.shape(), (2, 2));
    }

    #[test]
    fn test_load_table_header_only_csv_errors() {
        let file = temp_file(".csv", "id,name,amount\n");
        let err = load_table(file.path()).unwrap_err();
        assert!(matches!(err, CleaningError::NoDataLoaded));
    }

    #[test]
    fn test_load_table_format_override() {
        // A .txt file forced to be read as NDJSON.
        let file = temp_file(".txt", "{\"x\": 1}\n{\"x\": 2}\n");
        let loaded = load_table_as(file.path(), Some(FileFormat::NdJson)).unwrap();
        assert_eq!(loaded.df.height(), 2);
    }
}
