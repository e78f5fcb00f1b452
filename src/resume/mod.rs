//! Prior-output inspection for resumable runs
//!
//! The ledger is rebuilt from existing output files on every run; nothing is
//! cached across runs. A missing file yields an empty set, and malformed rows
//! are skipped silently so a damaged file degrades to partial resumption
//! rather than an error.

use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use crate::buckets::TimeBucket;

/// Whether any prior output exists for this repository/platform/mode.
///
/// Only a regular file counts; a stray directory at the output path is not
/// prior output and must not trigger a resume skip.
pub fn output_exists(path: &Path) -> bool {
    path.is_file()
}

/// Time buckets already recorded in a prior output table.
///
/// Reads the `year` (and optional `month`) columns of an existing commit CSV.
/// Rows with a year but no month become yearly buckets; rows with both become
/// monthly buckets; rows with neither are ignored.
pub fn processed_buckets(path: &Path) -> BTreeSet<TimeBucket> {
    let mut buckets = BTreeSet::new();

    let mut reader = match csv::Reader::from_path(path) {
        Ok(reader) => reader,
        Err(_) => return buckets,
    };

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(_) => return buckets,
    };
    let year_col = headers.iter().position(|h| h.trim() == "year");
    let month_col = headers.iter().position(|h| h.trim() == "month");

    let Some(year_col) = year_col else {
        debug!(path = %path.display(), "Existing output has no year column");
        return buckets;
    };

    for row in reader.records() {
        let Ok(row) = row else { continue };
        let Some(year) = row.get(year_col).and_then(|v| v.trim().parse::<i32>().ok()) else {
            continue;
        };
        let month = month_col
            .and_then(|c| row.get(c))
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|m| (1..=12).contains(m));

        buckets.insert(match month {
            Some(month) => TimeBucket::monthly(year, month),
            None => TimeBucket::yearly(year),
        });
    }

    info!(
        path = %path.display(),
        buckets = buckets.len(),
        "Read processed buckets from existing output"
    );
    buckets
}
