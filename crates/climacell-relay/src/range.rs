//! Range selection over an ordered list of blob names.
//!
//! Stored blob names are zero-padded timestamps, so the store's ascending
//! listing order is chronological. A requested window ("last N" or
//! "between two named blobs") is resolved into negative offsets from the
//! most recent record: -1 is the newest, -2 the one before it, and so on.

use crate::error::{RelayError, Result};

/// Offsets for the `n` most recent records, newest first.
///
/// The offsets are not clamped against any list length; callers index
/// through [`resolve`], which drops offsets past the oldest record.
pub fn last_n(n: usize) -> Vec<i64> {
    (1..=n as i64).map(|i| -i).collect()
}

/// Offsets for the records between `start` and `end`, scanning from the
/// most recent record towards the oldest.
///
/// The first occurrence of each name (in scan direction) fixes its offset;
/// scanning stops once both are found. The result is a half-open
/// descending range: `start`'s offset inclusive, `end`'s exclusive. When
/// both names resolve to the same record the range is forced non-empty by
/// stepping the end one record older.
///
/// A name absent from the list is an error rather than a silent empty
/// range.
pub fn between(names: &[String], start: &str, end: &str) -> Result<Vec<i64>> {
    let mut start_offset: Option<i64> = None;
    let mut end_offset: Option<i64> = None;

    for (scanned, name) in names.iter().rev().enumerate() {
        let offset = -(scanned as i64) - 1;
        if start_offset.is_none() && name == start {
            start_offset = Some(offset);
        }
        if end_offset.is_none() && name == end {
            end_offset = Some(offset);
        }
        if start_offset.is_some() && end_offset.is_some() {
            break;
        }
    }

    let from = start_offset.ok_or_else(|| RelayError::NameNotFound(start.to_string()))?;
    let mut to = end_offset.ok_or_else(|| RelayError::NameNotFound(end.to_string()))?;
    if from == to {
        to -= 1;
    }

    Ok(((to + 1)..=from).rev().collect())
}

/// Map offsets onto indices of a list of `len` records, dropping offsets
/// that reach past the oldest record. Order is preserved.
pub fn resolve(offsets: &[i64], len: usize) -> Vec<usize> {
    offsets
        .iter()
        .filter_map(|offset| {
            let index = len as i64 + offset;
            if (0..len as i64).contains(&index) {
                Some(index as usize)
            } else {
                None
            }
        })
        .collect()
}
