//! CSV writer implementations

use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{ErrorRecord, OutputError, OutputResult};
use crate::CommitRecord;

/// Columns always present, in forced order
const BASE_COLUMNS: [&str; 5] = ["item_name", "date", "message", "sha", "author"];

/// Write a commit table: header plus one row per record.
///
/// The column set is the union of fields populated across the given records
/// with `item_name` and `date` first; fields absent on a record serialize as
/// empty. Returns the number of rows written; an empty batch writes nothing.
pub fn write_commits(path: &Path, records: &[CommitRecord]) -> OutputResult<usize> {
    if records.is_empty() {
        warn!(path = %path.display(), "No commits to write");
        return Ok(0);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| OutputError::Io(format!("failed to create directory: {e}")))?;
    }

    let has_year = records.iter().any(|r| r.year.is_some());
    let has_month = records.iter().any(|r| r.month.is_some());

    let mut columns: Vec<&str> = BASE_COLUMNS.to_vec();
    if has_year {
        columns.push("year");
    }
    if has_month {
        columns.push("month");
    }

    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|e| OutputError::Io(format!("failed to create {}: {e}", path.display())))?;

    writer
        .write_record(&columns)
        .map_err(|e| OutputError::Csv(e.to_string()))?;

    for record in records {
        let mut row: Vec<&str> = vec![
            &record.item_name,
            &record.date,
            &record.message,
            &record.sha,
            &record.author,
        ];
        if has_year {
            row.push(record.year.as_deref().unwrap_or(""));
        }
        if has_month {
            row.push(record.month.as_deref().unwrap_or(""));
        }
        writer
            .write_record(&row)
            .map_err(|e| OutputError::Csv(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| OutputError::Io(e.to_string()))?;

    info!(
        rows = records.len(),
        path = %path.display(),
        "Wrote commit table"
    );
    Ok(records.len())
}

/// Append rows to an existing commit table, or create it if absent.
///
/// Used when a resumed bucketed run fills in buckets missing from a prior
/// file. The column set must match the existing header, which holds for
/// bucketed tables since their rows always carry `year` (and `month` in
/// monthly mode).
pub fn append_commits(path: &Path, records: &[CommitRecord]) -> OutputResult<usize> {
    if records.is_empty() {
        return Ok(0);
    }
    if !path.exists() {
        return write_commits(path, records);
    }

    let has_year = records.iter().any(|r| r.year.is_some());
    let has_month = records.iter().any(|r| r.month.is_some());

    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| OutputError::Io(format!("failed to open {}: {e}", path.display())))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    for record in records {
        let mut row: Vec<&str> = vec![
            &record.item_name,
            &record.date,
            &record.message,
            &record.sha,
            &record.author,
        ];
        if has_year {
            row.push(record.year.as_deref().unwrap_or(""));
        }
        if has_month {
            row.push(record.month.as_deref().unwrap_or(""));
        }
        writer
            .write_record(&row)
            .map_err(|e| OutputError::Csv(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| OutputError::Io(e.to_string()))?;

    info!(
        rows = records.len(),
        path = %path.display(),
        "Appended to commit table"
    );
    Ok(records.len())
}

const ERROR_COLUMNS: [&str; 8] = [
    "item_name",
    "platform",
    "repository",
    "error",
    "timestamp",
    "kind",
    "status",
    "redirected",
];

/// Append-only error table for one platform.
///
/// The destination is created with a header on first write and never
/// truncated; each append opens, writes one row, and closes, so rows from
/// successive runs accumulate.
pub struct ErrorSink {
    path: PathBuf,
}

impl ErrorSink {
    /// Sink writing to the given destination
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one failure row, creating the file with a header if needed
    pub fn append(&self, record: &ErrorRecord) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::Io(format!("failed to create directory: {e}")))?;
        }

        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| OutputError::Io(format!("failed to open {}: {e}", self.path.display())))?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if is_new {
            writer
                .write_record(&ERROR_COLUMNS)
                .map_err(|e| OutputError::Csv(e.to_string()))?;
        }

        let status = record.status.map(|s| s.to_string()).unwrap_or_default();
        let redirected = if record.redirected { "Yes" } else { "No" };
        writer
            .write_record([
                record.item_name.as_str(),
                record.platform.as_str(),
                record.repository.as_str(),
                record.error.as_str(),
                record.timestamp.as_str(),
                record.kind.as_str(),
                status.as_str(),
                redirected,
            ])
            .map_err(|e| OutputError::Csv(e.to_string()))?;

        writer
            .flush()
            .map_err(|e| OutputError::Io(e.to_string()))?;

        info!(path = %self.path.display(), "Error logged");
        Ok(())
    }
}
