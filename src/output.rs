//! CSV output writing.

use crate::error::{CleaningError, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Write a frame to a CSV file, creating parent directories as needed.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| CleaningError::OutputFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    let mut file = File::create(path).map_err(|e| CleaningError::OutputFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .map_err(|e| CleaningError::OutputFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    info!("Wrote {} row(s) to {}", df.height(), path.display());
    Ok(())
}
