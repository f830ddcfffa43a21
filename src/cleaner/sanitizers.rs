//! String sanitization ahead of type conversion.

use crate::utils::is_missing_marker;
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Sanitize every string column: strip quote artifacts and turn
/// missing-value markers into real nulls.
pub(crate) fn sanitize_string_columns(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;
    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for col_name in &column_names {
        let series = df.column(col_name)?.as_materialized_series().clone();
        if series.dtype() != &DataType::String {
            continue;
        }

        let (sanitized, replacements) = null_out_missing_markers(&series)?;
        if replacements > 0 {
            debug!(
                "Nulled {} missing-marker value(s) in '{}'",
                replacements, col_name
            );
        }
        df.replace(col_name, sanitized)?;
    }

    Ok(df)
}

/// Remove layered quote artifacts left by sloppy CSV exports
/// (`"""value"""` -> `value`).
pub(crate) fn strip_quote_artifacts(value: &str) -> String {
    let mut cleaned = value.trim();

    // Bounded: each pass strips one quote layer.
    for _ in 0..10 {
        let stripped = cleaned
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| {
                cleaned
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
            });

        match stripped {
            Some(inner) if !inner.is_empty() => cleaned = inner.trim(),
            _ => break,
        }
    }

    cleaned.to_string()
}

/// Trim values, strip quotes and replace missing markers/empties with null.
///
/// Returns the sanitized series and the number of replaced values.
pub(crate) fn null_out_missing_markers(series: &Series) -> Result<(Series, usize)> {
    let str_series = series.str()?;
    let mut sanitized = Vec::with_capacity(str_series.len());
    let mut replacements = 0;

    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) => {
                let cleaned = strip_quote_artifacts(val);
                if cleaned.is_empty() || is_missing_marker(&cleaned) {
                    sanitized.push(None);
                    replacements += 1;
                } else {
                    sanitized.push(Some(cleaned));
                }
            }
            None => sanitized.push(None),
        }
    }

    Ok((Series::new(series.name().clone(), sanitized), replacements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_quote_artifacts() {
        assert_eq!(strip_quote_artifacts("\"value\""), "value");
        assert_eq!(strip_quote_artifacts("\"\"\"value\"\"\""), "value");
        assert_eq!(strip_quote_artifacts("'quoted'"), "quoted");
        assert_eq!(strip_quote_artifacts("  plain  "), "plain");
    }

    #[test]
    fn test_strip_quote_artifacts_keeps_inner_quotes() {
        assert_eq!(strip_quote_artifacts("say \"hi\" now"), "say \"hi\" now");
    }

    #[test]
    fn test_null_out_missing_markers() {
        let series = Series::new("col".into(), &["ok", "ERROR", "", "N/A", "fine"]);
        let (sanitized, replacements) = null_out_missing_markers(&series).unwrap();

        assert_eq!(replacements, 3);
        assert_eq!(sanitized.null_count(), 3);
        assert_eq!(sanitized.str().unwrap().get(0), Some("ok"));
        assert_eq!(sanitized.str().unwrap().get(4), Some("fine"));
    }

    #[test]
    fn test_sanitize_string_columns_skips_numeric() {
        let df = df! {
            "num" => &[1i64, 2, 3],
            "txt" => &["a", "null", "c"],
        }
        .unwrap();

        let sanitized = sanitize_string_columns(df).unwrap();
        assert_eq!(sanitized.column("num").unwrap().null_count(), 0);
        assert_eq!(sanitized.column("txt").unwrap().null_count(), 1);
    }
}
