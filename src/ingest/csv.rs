//! Delimited-text reading with layered fallbacks.
//!
//! Real-world exports are frequently damaged: stray quotes, blank lines,
//! semicolon "CSV" from European locales. Reading tries the strict path
//! first and degrades gracefully instead of giving up.

use crate::error::{CleaningError, Result};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const INFER_SCHEMA_ROWS: usize = 1000;

/// Read a delimited file, inferring the delimiter from the header line.
pub fn read_auto_delimited(path: &Path) -> Result<DataFrame> {
    let separator = sniff_separator(path)?;
    if separator != b',' {
        debug!(
            "Inferred separator {:?} for {}",
            separator as char,
            path.display()
        );
    }
    read_delimited(path, separator)
}

/// Read a delimited file with a known separator, trying progressively more
/// forgiving strategies.
pub fn read_delimited(path: &Path, separator: u8) -> Result<DataFrame> {
    // Strict: quoted fields honored.
    match read_with_options(path, separator, Some(b'"')) {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Quoted read of {} failed: {}", path.display(), e),
    }

    // Quotes treated as plain characters.
    match read_with_options(path, separator, None) {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Unquoted read of {} failed: {}", path.display(), e),
    }

    // Last resort: scrub the raw content and parse from memory.
    let content = fs::read_to_string(path).map_err(|e| CleaningError::IngestFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let cleaned = scrub_content(&content);

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_parse_options(CsvParseOptions::default().with_separator(separator))
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()
        .map_err(|e| CleaningError::IngestFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn read_with_options(
    path: &Path,
    separator: u8,
    quote_char: Option<u8>,
) -> PolarsResult<DataFrame> {
    let parse_options = CsvParseOptions::default()
        .with_separator(separator)
        .with_quote_char(quote_char);

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Pick the separator that occurs most often in the header line.
fn sniff_separator(path: &Path) -> Result<u8> {
    let content = fs::read_to_string(path).map_err(|e| CleaningError::IngestFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let header = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    let candidates = [b',', b';', b'\t'];
    let best = candidates
        .into_iter()
        .map(|sep| (sep, header.matches(sep as char).count()))
        .max_by_key(|(_, count)| *count)
        .map(|(sep, count)| if count > 0 { sep } else { b',' })
        .unwrap_or(b',');

    Ok(best)
}

/// Collapse doubled quote artifacts and drop blank lines.
fn scrub_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
