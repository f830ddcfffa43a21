//! Duplicate-row removal.
//!
//! Deduplication is stable and keep-first: the earliest occurrence of each
//! key tuple survives in its original position. An empty key list means the
//! whole row is the key.

use crate::error::{CleaningError, Result};
use polars::prelude::*;
use tracing::{debug, info};

/// Drop duplicate rows, keeping the first occurrence per key tuple.
///
/// Returns the deduplicated frame and the number of rows removed. Unknown
/// key columns are an error rather than a silent no-op.
pub fn drop_duplicates(df: DataFrame, keys: &[String]) -> Result<(DataFrame, usize)> {
    for key in keys {
        if df.column(key).is_err() {
            return Err(CleaningError::ColumnNotFound(key.clone()));
        }
    }

    let before = df.height();
    let deduped = if keys.is_empty() {
        df.unique_stable(None, UniqueKeepStrategy::First, None)?
    } else {
        df.unique_stable(Some(keys), UniqueKeepStrategy::First, None)?
    };
    let removed = before - deduped.height();

    if removed > 0 {
        if keys.is_empty() {
            info!("Removed {} fully duplicated row(s)", removed);
        } else {
            info!("Removed {} duplicate row(s) by key {:?}", removed, keys);
        }
    } else {
        debug!("No duplicate rows found");
    }

    Ok((deduped, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn orders() -> DataFrame {
        df! {
            "order_id" => &[1i64, 1, 2, 2, 3],
            "customer_id" => &[10i64, 10, 20, 21, 30],
            "amount" => &[100.0, 999.0, 200.0, 250.0, 300.0],
        }
        .unwrap()
    }

    #[test]
    fn test_dedup_by_key_pair_keeps_first() {
        let (result, removed) =
            drop_duplicates(orders(), &["order_id".into(), "customer_id".into()]).unwrap();

        // Rows 0/1 share (1, 10); the first one wins.
        assert_eq!(removed, 1);
        assert_eq!(result.height(), 4);
        assert_eq!(
            result
                .column("amount")
                .unwrap()
                .get(0)
                .unwrap()
                .try_extract::<f64>()
                .unwrap(),
            100.0
        );
        // (2, 20) and (2, 21) differ in the second key and both survive.
        assert_eq!(
            result
                .column("order_id")
                .unwrap()
                .get(2)
                .unwrap()
                .try_extract::<i64>()
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_dedup_preserves_row_order() {
        let df = df! {
            "k" => &["b", "a", "b", "c", "a"],
            "v" => &[1i64, 2, 3, 4, 5],
        }
        .unwrap();

        let (result, removed) = drop_duplicates(df, &["k".into()]).unwrap();
        assert_eq!(removed, 2);

        let values: Vec<i64> = result
            .column("v")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(values, vec![1, 2, 4]);
    }

    #[test]
    fn test_dedup_whole_row_with_empty_keys() {
        let df = df! {
            "a" => &[1i64, 1, 1],
            "b" => &["x", "x", "y"],
        }
        .unwrap();

        let (result, removed) = drop_duplicates(df, &[]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(result.height(), 2);
    }

    #[test]
    fn test_dedup_no_duplicates() {
        let df = df! {
            "id" => &[1i64, 2, 3],
        }
        .unwrap();

        let (result, removed) = drop_duplicates(df, &["id".into()]).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(result.height(), 3);
    }

    #[test]
    fn test_dedup_unknown_key_errors() {
        let df = df! { "id" => &[1i64, 2] }.unwrap();

        let err = drop_duplicates(df, &["missing".into()]).unwrap_err();
        assert!(matches!(err, CleaningError::ColumnNotFound(name) if name == "missing"));
    }

    #[test]
    fn test_dedup_null_keys_are_equal() {
        let df = df! {
            "k" => &[Some("a"), None, None, Some("a")],
            "v" => &[1i64, 2, 3, 4],
        }
        .unwrap();

        let (result, removed) = drop_duplicates(df, &["k".into()]).unwrap();
        // Two null keys collapse to the first.
        assert_eq!(removed, 2);
        assert_eq!(result.height(), 2);
    }
}
